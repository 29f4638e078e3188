//! Agent 组件装配
//!
//! AgentFactory 负责创建 LLM 与工具集（测试里换成 Scripted LLM 与内存工具），
//! create_agent_components 用配置把它们装成 AgentController + TokenCounter，每个会话一份。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::AgentError;
use crate::llm::{LlmClient, OpenAiClient, TokenCounter};
use crate::react::{AgentController, AgentOptions, Planner};
use crate::tools::{build_support_tools, ToolExecutor, ToolRegistry};

/// 组件工厂：外部协作者（模型、检索、搜索）的创建入口
pub trait AgentFactory: Send + Sync {
    fn create_llm(&self, cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, AgentError>;

    fn create_tools(
        &self,
        cfg: &AppConfig,
        llm: Arc<dyn LlmClient>,
    ) -> Result<ToolRegistry, AgentError>;
}

/// 默认工厂：OpenAI 兼容模型 + 五个客服工具
#[derive(Debug, Default)]
pub struct DefaultAgentFactory;

impl AgentFactory for DefaultAgentFactory {
    fn create_llm(&self, cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, AgentError> {
        tracing::info!(model = %cfg.llm.model, temperature = cfg.llm.temperature, "create llm");
        Ok(Arc::new(OpenAiClient::from_config(&cfg.llm)))
    }

    fn create_tools(
        &self,
        cfg: &AppConfig,
        llm: Arc<dyn LlmClient>,
    ) -> Result<ToolRegistry, AgentError> {
        build_support_tools(cfg, llm)
    }
}

/// 初始化所需的一切：配置 + 组件工厂
#[derive(Clone)]
pub struct Bootstrap {
    pub config: AppConfig,
    pub factory: Arc<dyn AgentFactory>,
}

impl Bootstrap {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            factory: Arc::new(DefaultAgentFactory),
        }
    }

    pub fn with_factory(mut self, factory: Arc<dyn AgentFactory>) -> Self {
        self.factory = factory;
        self
    }
}

/// 每个会话持有一份：控制器 + token 计数器
pub struct AgentComponents {
    pub controller: AgentController,
    pub tokens: TokenCounter,
}

impl AgentOptions {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            max_iterations: cfg.agent.max_iterations,
            early_stopping: cfg.agent.early_stopping,
            parsing_errors: cfg.agent.parsing_errors(),
            tool_errors: cfg.agent.tool_errors,
        }
    }
}

#[tracing::instrument(name = "create_agent_components", skip_all)]
pub fn create_agent_components(boot: &Bootstrap) -> Result<AgentComponents, AgentError> {
    let cfg = &boot.config;
    let tokens = TokenCounter::new(&cfg.llm.encoding)?;
    let llm = boot.factory.create_llm(cfg)?;
    let tools = boot.factory.create_tools(cfg, llm.clone())?;

    let planner = Planner::new(llm, &tools.descriptions());
    let executor = ToolExecutor::new(tools, cfg.tools.tool_timeout_secs);
    let controller = AgentController::new(planner, executor, AgentOptions::from_config(cfg))?;
    tracing::info!(
        tools = ?controller.tool_names(),
        max_iterations = cfg.agent.max_iterations,
        "agent controller ready"
    );

    Ok(AgentComponents { controller, tokens })
}
