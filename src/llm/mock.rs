//! Scripted LLM 客户端（用于测试与离线演示，无需 API）
//!
//! 按顺序回放预置的输出，并记录每次请求的消息，便于断言 prompt 内容与调用次数。
//! 脚本耗尽后返回 fallback（默认是一个直接作答的 Final Answer）。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::Message;

pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<Message>>>,
    fallback: String,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(outputs.into_iter().map(|s| Ok(s.into())).collect()),
            requests: Mutex::new(Vec::new()),
            fallback: "Thought: I now know the final answer\nFinal Answer: (scripted)".to_string(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// 在脚本末尾追加一次失败
    pub fn push_error(&self, err: impl Into<String>) {
        if let Ok(mut s) = self.script.lock() {
            s.push_back(Err(err.into()));
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Ok(mut r) = self.requests.lock() {
            r.push(messages.to_vec());
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(out) => out,
            None => Ok(self.fallback.clone()),
        }
    }
}
