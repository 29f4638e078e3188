//! 分词模块
//!
//! 知识库检索用的中日英混合分词：含 CJK 字符时走 jieba（搜索引擎模式），否则按空白与标点切分。

use std::collections::HashSet;
use std::sync::OnceLock;

use jieba_rs::Jieba;

static JIEBA: OnceLock<Jieba> = OnceLock::new();

fn get_jieba() -> &'static Jieba {
    JIEBA.get_or_init(Jieba::new)
}

/// CJK 表意文字、假名、全角符号
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' |
        '\u{3400}'..='\u{4DBF}' |
        '\u{F900}'..='\u{FAFF}' |
        '\u{3040}'..='\u{309F}' |
        '\u{30A0}'..='\u{30FF}' |
        '\u{FF66}'..='\u{FF9F}'
    )
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

fn is_noise(token: &str) -> bool {
    token.chars().all(|c| !c.is_alphanumeric() && !is_cjk(c))
}

/// 智能分词：CJK 用 jieba，纯拉丁文本按非字母数字切分；全部转小写，去掉单字母与纯标点
pub fn tokenize(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if contains_cjk(text) {
        get_jieba()
            .cut_for_search(text, true)
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty() && !is_noise(s))
            .filter(|s| s.chars().count() > 1 || s.chars().next().map(is_cjk).unwrap_or(false))
            .collect()
    } else {
        text.split(|c: char| !c.is_alphanumeric())
            .map(|s| s.to_lowercase())
            .filter(|s| s.chars().count() > 1)
            .collect()
    }
}

pub fn tokenize_to_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

pub fn jaccard_similarity(set1: &HashSet<String>, set2: &HashSet<String>) -> f32 {
    if set1.is_empty() || set2.is_empty() {
        return 0.0;
    }
    let intersection = set1.intersection(set2).count() as f32;
    let union = set1.union(set2).count() as f32;
    intersection / union
}

/// 查询词在文档中的覆盖率：|q ∩ d| / |q|
pub fn query_coverage(query: &HashSet<String>, doc: &HashSet<String>) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    query.intersection(doc).count() as f32 / query.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_english() {
        let tokens = tokenize("Refund policy, for premium plans!");
        assert!(tokens.contains(&"refund".to_string()));
        assert!(tokens.contains(&"premium".to_string()));
        assert!(!tokens.iter().any(|t| t.contains(',')));
    }

    #[test]
    fn test_tokenize_cjk() {
        let tokens = tokenize("人工智能改变世界");
        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|t| !t.trim().is_empty()));
    }

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("EcoTeeの料金"));
        assert!(!contains_cjk("EcoTee pricing"));
    }

    #[test]
    fn test_query_coverage() {
        let q = tokenize_to_set("refund policy");
        let d = tokenize_to_set("our refund policy lasts thirty days");
        assert!((query_coverage(&q, &d) - 1.0).abs() < f32::EPSILON);
        assert!(jaccard_similarity(&q, &d) > 0.0);
    }
}
