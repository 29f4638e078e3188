//! 知识库工具：把某个分区的检索链暴露为 Tool

use std::sync::Arc;

use async_trait::async_trait;

use crate::knowledge::RetrievalChain;
use crate::tools::Tool;

pub struct KnowledgeBaseTool {
    name: String,
    description: String,
    chain: Arc<dyn RetrievalChain>,
}

impl KnowledgeBaseTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        chain: Arc<dyn RetrievalChain>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            chain,
        }
    }
}

#[async_trait]
impl Tool for KnowledgeBaseTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, query: &str) -> Result<String, String> {
        self.chain.run(query).await
    }
}
