//! 检索链：检索分区 → 拼上下文 → LLM 作答

use std::sync::Arc;

use async_trait::async_trait;

use crate::knowledge::store::{KnowledgeStore, RetrievalResult};
use crate::llm::LlmClient;
use crate::memory::Message;

/// 无命中时直接返回的文本（不调用模型）
pub const NO_CONTEXT_ANSWER: &str = "関連する情報は見つかりませんでした。";

const RAG_SYSTEM_PROMPT: &str = "あなたは社内ドキュメントに基づいて回答するアシスタントです。\
以下の参照情報だけを使って質問に簡潔に回答してください。\
参照情報から回答できない場合は「分かりません」と回答してください。";

/// 检索链接口：一个问题进，一段文本出
#[async_trait]
pub trait RetrievalChain: Send + Sync {
    async fn run(&self, query: &str) -> Result<String, String>;
}

pub struct RagChain {
    store: KnowledgeStore,
    llm: Arc<dyn LlmClient>,
    top_k: usize,
}

impl RagChain {
    pub fn new(store: KnowledgeStore, llm: Arc<dyn LlmClient>, top_k: usize) -> Self {
        Self { store, llm, top_k }
    }

    fn build_messages(&self, query: &str, results: &[RetrievalResult]) -> Vec<Message> {
        let mut context = String::new();
        for (i, r) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] ({})\n{}\n\n",
                i + 1,
                r.chunk.citation(),
                r.chunk.text
            ));
        }
        vec![
            Message::system(format!("{}\n\n# 参照情報\n{}", RAG_SYSTEM_PROMPT, context.trim_end())),
            Message::user(query.to_string()),
        ]
    }
}

#[async_trait]
impl RetrievalChain for RagChain {
    async fn run(&self, query: &str) -> Result<String, String> {
        let results = self.store.search(query, self.top_k);
        tracing::info!(partition = %self.store.name(), hits = results.len(), "retrieval");
        if results.is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }
        let messages = self.build_messages(query, &results);
        self.llm.complete(&messages).await
    }
}
