//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Scripted）与 token 计数

pub mod mock;
pub mod openai;
pub mod tokens;
pub mod traits;

pub use mock::ScriptedLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use tokens::TokenCounter;
pub use traits::LlmClient;
