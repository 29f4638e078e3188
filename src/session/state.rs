//! 会话数据：消息、注入上下文的历史、token 累计、反馈状态

use serde::Serialize;

use crate::memory::{ConversationMemory, Message};
use crate::session::Feedback;

/// 会话 id：uuid v4 的 32 位十六进制串，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    /// 展示用的完整记录，只追加
    messages: Vec<Message>,
    /// 注入 Agent 的最近若干轮
    chat_history: ConversationMemory,
    /// 单调不减
    total_tokens: u64,
    pub feedback: Feedback,
}

impl SessionState {
    pub fn new(max_context_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            chat_history: ConversationMemory::new(max_context_turns),
            total_tokens: 0,
            feedback: Feedback::default(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn chat_history(&self) -> &[Message] {
        self.chat_history.messages()
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub(crate) fn push_message(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub(crate) fn record_turn(&mut self, question: &str, answer: &str, tokens: u64) {
        self.chat_history.push_turn(question, answer);
        self.total_tokens = self.total_tokens.saturating_add(tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_hex() {
        let id = SessionId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, SessionId::generate());
    }

    #[test]
    fn test_record_turn_accumulates() {
        let mut state = SessionState::new(1);
        state.record_turn("q1", "a1", 10);
        state.record_turn("q2", "a2", 5);
        assert_eq!(state.total_tokens(), 15);
        assert_eq!(state.chat_history().len(), 2);
        assert_eq!(state.chat_history()[0].content, "q2");
    }
}
