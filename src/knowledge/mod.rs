//! 知识库：文档分块、关键词检索与检索链（RAG）

pub mod chain;
pub mod chunker;
pub mod store;
pub mod tokenizer;

pub use chain::{RagChain, RetrievalChain, NO_CONTEXT_ANSWER};
pub use chunker::{Chunk, Chunker, ChunkingConfig};
pub use store::{KnowledgeStore, RetrievalResult};
