//! ReAct 事件：供前端（CLI / Web）实时展示 Agent 的思考与工具调用过程

use serde::Serialize;

use crate::core::AgentPhase;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReactEvent {
    Phase { phase: AgentPhase, iteration: usize },
    ToolCall { tool: String, input: String },
    Observation { tool: String, preview: String },
    /// 模型选了不存在的工具，未调用，已回灌为 Observation
    InvalidTool { tool: String, observation: String },
    /// 模型输出无法解析，已回灌为 Observation
    ParseError { detail: String },
    /// 迭代耗尽，进入提前停止
    IterationLimit { max_iterations: usize },
    FinalAnswer { text: String },
}
