//! Agent 错误类型
//!
//! 控制器自身只在两处容错：模型输出解析失败（回灌为 Observation）与最大迭代数（提前停止）。
//! 其余错误（工具失败、LLM 调用失败、配置错误）以 AgentError 向调用方传播。

use thiserror::Error;

/// 会话初始化、Agent 循环与工具调用中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Config error: {0}")]
    Config(String),

    /// Agent 配置非法：空工具集、max_iterations 为 0 等
    #[error("Invalid agent configuration: {0}")]
    InvalidConfig(String),

    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Empty input for tool: {0}")]
    EmptyToolInput(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    /// 仅在关闭解析错误恢复时出现
    #[error("Could not parse LLM output: {0}")]
    OutputParse(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Empty user input")]
    EmptyInput,

    #[error("Session not initialized: missing {0}")]
    NotInitialized(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AgentError {
    fn from(e: config::ConfigError) -> Self {
        AgentError::Config(e.to_string())
    }
}
