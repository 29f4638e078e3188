//! Web 搜索工具：SerpAPI 兼容端点
//!
//! GET {endpoint}?engine=..&q=..&hl=..&gl=..&api_key=..，把 JSON 响应压缩成一段文本：
//! answer_box → knowledge_graph → organic_results 摘要；都没有时返回固定提示。
//! 结果超过 max_result_chars 时截断并追加 ...[truncated]。

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::SearchSection;
use crate::tools::Tool;

pub const NO_RESULT: &str = "No good search result found";

pub struct WebSearchTool {
    name: String,
    description: String,
    client: Client,
    endpoint: String,
    engine: String,
    hl: String,
    gl: String,
    api_key: Option<String>,
    max_result_chars: usize,
}

impl WebSearchTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        section: &SearchSection,
    ) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(section.timeout_secs))
            .build()
            .unwrap_or_default();
        let api_key = section
            .api_key
            .clone()
            .or_else(|| std::env::var("SERPAPI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty());
        Self {
            name: name.into(),
            description: description.into(),
            client,
            endpoint: section.endpoint.clone(),
            engine: section.engine.clone(),
            hl: section.hl.clone(),
            gl: section.gl.clone(),
            api_key,
            max_result_chars: section.max_result_chars,
        }
    }

    /// 覆盖 API Key（None 表示未配置）
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    async fn search(&self, query: &str) -> Result<Value, String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| "SERPAPI_API_KEY is not set".to_string())?;
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", self.engine.as_str()),
                ("q", query),
                ("hl", self.hl.as_str()),
                ("gl", self.gl.as_str()),
                ("api_key", api_key),
            ])
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| format!("Invalid response body: {}", e))
    }
}

/// 从搜索响应中抽取最有用的文本
pub fn condense_response(res: &Value) -> Result<String, String> {
    if let Some(err) = res.get("error").and_then(Value::as_str) {
        return Err(format!("Got error from search API: {err}"));
    }

    if let Some(answer_box) = res.get("answer_box") {
        for key in ["answer", "snippet"] {
            if let Some(s) = answer_box.get(key).and_then(Value::as_str) {
                return Ok(s.to_string());
            }
        }
        if let Some(words) = answer_box.get("snippet_highlighted_words").and_then(Value::as_array) {
            if let Some(first) = words.first().and_then(Value::as_str) {
                return Ok(first.to_string());
            }
        }
    }

    if let Some(desc) = res
        .get("knowledge_graph")
        .and_then(|kg| kg.get("description"))
        .and_then(Value::as_str)
    {
        return Ok(desc.to_string());
    }

    let snippets: Vec<&str> = res
        .get("organic_results")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|r| r.get("snippet").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    if !snippets.is_empty() {
        return Ok(snippets.join("\n"));
    }

    Ok(NO_RESULT.to_string())
}

fn truncate(body: String, max_chars: usize) -> String {
    if body.chars().count() > max_chars {
        body.chars().take(max_chars).collect::<String>() + "\n...[truncated]"
    } else {
        body
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, query: &str) -> Result<String, String> {
        tracing::info!(query = %query, "web search");
        let res = self.search(query).await?;
        condense_response(&res).map(|s| truncate(s, self.max_result_chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_box_wins() {
        let res = json!({
            "answer_box": {"answer": "42"},
            "organic_results": [{"snippet": "other"}]
        });
        assert_eq!(condense_response(&res).unwrap(), "42");
    }

    #[test]
    fn test_knowledge_graph_then_organic() {
        let kg = json!({"knowledge_graph": {"description": "A city in Japan."}});
        assert_eq!(condense_response(&kg).unwrap(), "A city in Japan.");

        let organic = json!({"organic_results": [
            {"snippet": "first"},
            {"title": "no snippet"},
            {"snippet": "second"},
        ]});
        assert_eq!(condense_response(&organic).unwrap(), "first\nsecond");
    }

    #[test]
    fn test_error_and_empty() {
        assert!(condense_response(&json!({"error": "Invalid API key"})).is_err());
        assert_eq!(condense_response(&json!({})).unwrap(), NO_RESULT);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef".to_string(), 3), "abc\n...[truncated]");
        assert_eq!(truncate("abc".to_string(), 3), "abc");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_on_invoke() {
        let tool = WebSearchTool::new("search_web_info", "web", &SearchSection::default())
            .with_api_key(None);
        let err = tool.invoke("weather in Osaka").await.unwrap_err();
        assert!(err.contains("SERPAPI_API_KEY"));
    }
}
