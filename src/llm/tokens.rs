//! 会话 token 计数：按名称选择 tiktoken 编码

use tiktoken_rs::CoreBPE;

use crate::core::AgentError;

/// 包装 tiktoken 编码器，统计文本 token 数
pub struct TokenCounter {
    encoding: String,
    bpe: CoreBPE,
}

impl TokenCounter {
    /// 支持 cl100k_base / o200k_base / p50k_base / r50k_base
    pub fn new(encoding: &str) -> Result<Self, AgentError> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(AgentError::Config(format!(
                    "unknown token encoding: {other}"
                )))
            }
        }
        .map_err(|e| AgentError::Config(format!("load encoding {encoding}: {e}")))?;
        Ok(Self {
            encoding: encoding.to_string(),
            bpe,
        })
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &self.encoding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_cl100k() {
        let counter = TokenCounter::new("cl100k_base").unwrap();
        assert_eq!(counter.count(""), 0);
        assert!(counter.count("hello world") >= 2);
    }

    #[test]
    fn test_unknown_encoding() {
        let err = TokenCounter::new("nope").unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
