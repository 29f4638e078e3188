//! 工具执行器
//!
//! 持有 ToolRegistry 与单次调用超时；invoke(tool_name, query) 在超时内调用工具，
//! 失败或超时转为 AgentError（ToolExecutionFailed / ToolTimeout）；每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::ToolRegistry;

const QUERY_PREVIEW_CHARS: usize = 200;

pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 同步（逐个）执行指定工具
    pub async fn invoke(&self, tool_name: &str, query: &str) -> Result<String, AgentError> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| AgentError::UnknownTool(tool_name.to_string()))?;
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::EmptyToolInput(tool_name.to_string()));
        }

        let start = Instant::now();
        let result = timeout(self.timeout, tool.invoke(query)).await;

        let (ok, outcome) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "query_preview": preview(query),
        });
        tracing::info!(audit = %audit, "tool");

        match result {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) => Err(AgentError::ToolExecutionFailed(format!("{tool_name}: {e}"))),
            Err(_) => Err(AgentError::ToolTimeout(tool_name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.registry.descriptions()
    }

    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }
}

fn preview(s: &str) -> String {
    if s.chars().count() > QUERY_PREVIEW_CHARS {
        format!("{}...", s.chars().take(QUERY_PREVIEW_CHARS).collect::<String>())
    } else {
        s.to_string()
    }
}
