//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Scripted）实现 LlmClient。

use async_trait::async_trait;

use crate::memory::Message;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 后端上报的累计用量：(prompt_tokens, completion_tokens, total_tokens)；不上报的后端为 0
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
