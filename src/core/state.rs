//! Agent 阶段：THINKING → ACTING → OBSERVING → THINKING …，终态 ANSWERING

use serde::Serialize;

/// 单轮对话内 Agent 所处阶段（事件推送与结果追踪用）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    /// 等待模型决定下一步（初始状态）
    Thinking,
    /// 工具调用进行中
    Acting,
    /// 已拿到工具结果，写回上下文
    Observing,
    /// 终态：主动给出答案，或迭代耗尽后被迫生成答案
    Answering,
}

impl AgentPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentPhase::Thinking => "thinking",
            AgentPhase::Acting => "acting",
            AgentPhase::Observing => "observing",
            AgentPhase::Answering => "answering",
        }
    }
}

impl std::fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
