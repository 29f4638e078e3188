//! 应用配置：从 .env、config/default.toml 与环境变量加载
//!
//! 加载顺序：先用 dotenvy 读入 `.env`（若存在），再读 TOML 文件，最后用环境变量 `CONCIERGE__*` 覆盖
//! （双下划线表示嵌套，如 `CONCIERGE__AGENT__MAX_ITERATIONS=8`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::react::{EarlyStopping, ParsingErrorPolicy, ToolErrorPolicy};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub log: LogSection,
    pub knowledge: KnowledgeSection,
    pub tools: ToolsSection,
}

/// [app] 段：应用名、注入上下文的历史轮数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// chat_history 保留轮数（每轮 user + assistant 两条）
    pub max_context_turns: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "concierge".to_string(),
            max_context_turns: 10,
        }
    }
}

/// [llm] 段：模型、温度、token 编码方式
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub temperature: f32,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// tiktoken 编码名，用于统计会话 token 数
    pub encoding: String,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.5,
            base_url: None,
            api_key: None,
            encoding: "cl100k_base".to_string(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [agent] 段：ReAct 循环上限与容错策略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub max_iterations: usize,
    pub early_stopping: EarlyStopping,
    /// true：解析失败回灌为 Observation；false：直接报错
    pub handle_parsing_errors: bool,
    pub tool_errors: ToolErrorPolicy,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            early_stopping: EarlyStopping::Generate,
            handle_parsing_errors: true,
            tool_errors: ToolErrorPolicy::Propagate,
        }
    }
}

impl AgentSection {
    pub fn parsing_errors(&self) -> ParsingErrorPolicy {
        if self.handle_parsing_errors {
            ParsingErrorPolicy::Observe
        } else {
            ParsingErrorPolicy::Raise
        }
    }
}

/// [log] 段：日志目录、文件名前缀（按天滚动）、默认级别
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub dir: PathBuf,
    pub file: String,
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file: "application.log".to_string(),
            level: "info".to_string(),
        }
    }
}

/// [knowledge] 段：各知识分区的文档目录与检索参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeSection {
    pub company_dir: PathBuf,
    pub service_dir: PathBuf,
    pub customer_dir: PathBuf,
    /// 全数据分区；为空时取上面三个目录的并集
    pub all_dirs: Vec<PathBuf>,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for KnowledgeSection {
    fn default() -> Self {
        Self {
            company_dir: PathBuf::from("data/rag/company"),
            service_dir: PathBuf::from("data/rag/service"),
            customer_dir: PathBuf::from("data/rag/customer"),
            all_dirs: Vec::new(),
            top_k: 5,
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl KnowledgeSection {
    pub fn all_data_dirs(&self) -> Vec<PathBuf> {
        if self.all_dirs.is_empty() {
            vec![
                self.company_dir.clone(),
                self.service_dir.clone(),
                self.customer_dir.clone(),
            ]
        } else {
            self.all_dirs.clone()
        }
    }
}

/// [tools] 段：工具超时与 Web 搜索
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）；知识库工具内部还要调用一次 LLM，应不短于 llm.timeouts.request
    pub tool_timeout_secs: u64,
    pub search: SearchSection,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 90,
            search: SearchSection::default(),
        }
    }
}

/// [tools.search] 段：SerpAPI 兼容端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub endpoint: String,
    pub engine: String,
    /// 界面语言，如 ja / en
    pub hl: String,
    /// 地区，如 jp / us
    pub gl: String,
    /// 未设置时读取环境变量 SERPAPI_API_KEY
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_result_chars: usize,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search".to_string(),
            engine: "google".to_string(),
            hl: "ja".to_string(),
            gl: "jp".to_string(),
            api_key: None,
            timeout_secs: 15,
            max_result_chars: 4000,
        }
    }
}

/// 从 config 目录加载配置，环境变量 CONCIERGE__* 可覆盖
///
/// 1. 读入 .env（不存在则忽略）
/// 2. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 3. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 4. 最后叠加环境变量 CONCIERGE__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let _ = dotenvy::dotenv();

    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CONCIERGE")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
