//! 文档分块
//!
//! 先按句读切成句子，再把相邻句子装进不超过 chunk_size 个字符的块；
//! 下一块从上一块末尾、总长不超过 chunk_overlap 的那几句开始。超长的句子按字符硬切。

use std::ops::Range;

/// 句子结束符（日文句读、全角 / 半角问叹号、换行）
const SENTENCE_ENDS: &[char] = &['。', '．', '！', '？', '!', '?', '\n'];

/// 文档块；offset 为块首在原文中的字符偏移，检索上下文以 `source_id#offset` 引用
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub source_id: String,
    pub offset: usize,
    pub text: String,
}

impl Chunk {
    pub fn citation(&self) -> String {
        format!("{}#{}", self.source_id, self.offset)
    }
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// 块的最大字符数
    pub chunk_size: usize,
    /// 相邻块重复的最大字符数（按整句计）
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl ChunkingConfig {
    pub fn with_sizes(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
        }
    }
}

#[derive(Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

/// 句子边界：结束符之后；或 '.' 后接空白 / 文末
fn sentences(chars: &[char], max_len: usize) -> Vec<Range<usize>> {
    let mut raw = Vec::new();
    let mut start = 0;
    for (i, &c) in chars.iter().enumerate() {
        let ends = SENTENCE_ENDS.contains(&c)
            || (c == '.' && chars.get(i + 1).map_or(true, |n| n.is_whitespace()));
        if ends {
            raw.push(start..i + 1);
            start = i + 1;
        }
    }
    if start < chars.len() {
        raw.push(start..chars.len());
    }

    let mut out = Vec::with_capacity(raw.len());
    for r in raw {
        let mut s = r.start;
        while r.end - s > max_len {
            out.push(s..s + max_len);
            s += max_len;
        }
        out.push(s..r.end);
    }
    out
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn chunk(&self, source_id: &str, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let size = self.config.chunk_size.max(1);
        let segs = sentences(&chars, size);

        let mut chunks = Vec::new();
        let mut i = 0;
        while i < segs.len() {
            let begin = segs[i].start;
            let mut j = i;
            while j + 1 < segs.len() && segs[j + 1].end - begin <= size {
                j += 1;
            }
            let end = segs[j].end;

            let body = &chars[begin..end];
            let lead = body.iter().take_while(|c| c.is_whitespace()).count();
            let text: String = body.iter().collect();
            let text = text.trim();
            if !text.is_empty() {
                chunks.push(Chunk {
                    source_id: source_id.to_string(),
                    offset: begin + lead,
                    text: text.to_string(),
                });
            }

            if j + 1 >= segs.len() {
                break;
            }
            // 至少前进一句
            let mut next = j + 1;
            while next > i + 1 && end - segs[next - 1].start <= self.config.chunk_overlap {
                next -= 1;
            }
            i = next;
        }
        chunks
    }
}
