//! 知识分区存储：从目录加载文档、分块、关键词检索
//!
//! 支持 .txt / .md / .csv / .html(.htm)；HTML 先用 html2text 提取可读文本。
//! 目录不存在时视为空分区（记录 warn），不阻断初始化。

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use html2text::from_read;
use walkdir::WalkDir;

use crate::knowledge::chunker::{Chunk, Chunker, ChunkingConfig};
use crate::knowledge::tokenizer;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "csv"];
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// 检索结果
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub chunk: Chunk,
    pub score: f32,
}

struct Entry {
    chunk: Chunk,
    tokens: HashSet<String>,
}

/// 单个知识分区（如 company / service / customer / all）
pub struct KnowledgeStore {
    name: String,
    chunker: Chunker,
    entries: Vec<Entry>,
    documents: usize,
}

impl KnowledgeStore {
    pub fn new(name: impl Into<String>, config: ChunkingConfig) -> Self {
        Self {
            name: name.into(),
            chunker: Chunker::new(config),
            entries: Vec::new(),
            documents: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 从若干目录加载（递归），返回新增的块数
    ///
    /// 读不了的文件和目录项只记 warn 并跳过，不影响同一分区的其他文档。
    pub fn load_dirs(&mut self, dirs: &[PathBuf]) -> usize {
        let mut added = 0;
        for dir in dirs {
            if !dir.exists() {
                tracing::warn!(
                    partition = %self.name,
                    dir = %dir.display(),
                    "knowledge directory missing, partition left empty"
                );
                continue;
            }
            for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!(partition = %self.name, error = %e, "skip unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let text = match read_document(path) {
                    Ok(Some(text)) => text,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "skip unreadable document"
                        );
                        continue;
                    }
                };
                let doc_id = path
                    .strip_prefix(dir)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .replace('\\', "/");
                added += self.add_document(&doc_id, &text);
            }
        }
        tracing::info!(
            partition = %self.name,
            documents = self.documents,
            chunks = self.entries.len(),
            "knowledge partition loaded"
        );
        added
    }

    /// 索引一篇文档；同名文档先删除旧块
    pub fn add_document(&mut self, doc_id: &str, text: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.chunk.source_id != doc_id);
        if self.entries.len() == before {
            self.documents += 1;
        }
        let chunks = self.chunker.chunk(doc_id, text);
        let n = chunks.len();
        for chunk in chunks {
            let tokens = tokenizer::tokenize_to_set(&chunk.text);
            self.entries.push(Entry { chunk, tokens });
        }
        n
    }

    /// 关键词检索：查询覆盖率为主、Jaccard 为辅，取前 k 个正分块
    pub fn search(&self, query: &str, k: usize) -> Vec<RetrievalResult> {
        let query_tokens = tokenizer::tokenize_to_set(query);
        if query_tokens.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<RetrievalResult> = self
            .entries
            .iter()
            .filter_map(|e| {
                let coverage = tokenizer::query_coverage(&query_tokens, &e.tokens);
                if coverage <= 0.0 {
                    return None;
                }
                let jaccard = tokenizer::jaccard_similarity(&query_tokens, &e.tokens);
                let score = coverage + 0.5 * jaccard;
                Some(RetrievalResult {
                    chunk: e.chunk.clone(),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }
}

fn read_document(path: &Path) -> std::io::Result<Option<String>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        let bytes = std::fs::read(path)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "document is not valid UTF-8, decoding lossily"
                );
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        Ok(Some(text.trim_start_matches('\u{FEFF}').to_string()))
    } else if HTML_EXTENSIONS.contains(&ext.as_str()) {
        let bytes = std::fs::read(path)?;
        let text = from_read(bytes.as_slice(), 120)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        Ok(Some(text))
    } else {
        tracing::debug!(path = %path.display(), "skip unsupported document");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_docs() -> KnowledgeStore {
        let mut store = KnowledgeStore::new("service", ChunkingConfig::with_sizes(200, 0));
        store.add_document("pricing.md", "Premium plan pricing is 1000 yen per month.");
        store.add_document("refund.md", "Refund requests are accepted within 30 days.");
        store
    }

    #[test]
    fn test_search_ranks_relevant_chunk_first() {
        let store = store_with_docs();
        let results = store.search("premium pricing", 3);
        assert!(!results.is_empty());
        assert_eq!(results[0].chunk.source_id, "pricing.md");
        assert_eq!(results[0].chunk.citation(), "pricing.md#0");
    }

    #[test]
    fn test_search_without_overlap_is_empty() {
        let store = store_with_docs();
        assert!(store.search("weather tomorrow", 3).is_empty());
        assert!(store.search("", 3).is_empty());
    }

    #[test]
    fn test_reindex_replaces_document() {
        let mut store = store_with_docs();
        store.add_document("refund.md", "Refunds are no longer offered.");
        assert_eq!(store.document_count(), 2);
        let results = store.search("refunds offered", 5);
        assert!(results.iter().all(|r| !r.chunk.text.contains("30 days")));
    }

    #[test]
    fn test_load_dirs_reads_supported_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("company.md"), "Head office is in Osaka.").unwrap();
        std::fs::write(
            dir.path().join("about.html"),
            "<html><body><p>Founded in 2010 by two engineers.</p></body></html>",
        )
        .unwrap();
        std::fs::write(dir.path().join("logo.png"), [0u8, 1, 2]).unwrap();

        let mut store = KnowledgeStore::new("company", ChunkingConfig::default());
        let missing = dir.path().join("missing");
        let added = store.load_dirs(&[dir.path().to_path_buf(), missing]);
        assert_eq!(added, 2);
        assert_eq!(store.document_count(), 2);
        assert!(!store.search("founded engineers", 1).is_empty());
    }

    #[test]
    fn test_non_utf8_document_does_not_abort_loading() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.md"), "Head office is in Osaka.").unwrap();
        std::fs::write(dir.path().join("legacy.txt"), [0x82u8, 0xa0, 0xff, 0xfe]).unwrap();

        let mut store = KnowledgeStore::new("company", ChunkingConfig::default());
        store.load_dirs(&[dir.path().to_path_buf()]);
        assert_eq!(store.document_count(), 2);
        assert_eq!(store.search("head office osaka", 1)[0].chunk.source_id, "good.md");
    }
}
