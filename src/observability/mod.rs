//! 可观测性：进程级唯一的滚动日志文件
//!
//! 多个会话都会调用 init_logger，但整个进程最多挂一个文件 sink（互斥锁保护，并发安全）。
//! 日志行格式：
//! `[LEVEL] 2026-01-01 12:00:00,123 line 42, in agent_turn, session_id=<id>: message key=value`
//! 函数名取最内层 span 名（各入口函数用 `#[tracing::instrument]` 标注），没有 span 时取 target；
//! session_id 取最近一个带 `session_id` 字段的 span，没有时取安装 sink 的会话 id。

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt as tfmt, prelude::*, EnvFilter};

use crate::config::LogSection;
use crate::core::AgentError;
use crate::session::SessionId;

const SESSION_FIELD: &str = "session_id=";

struct LogSink {
    path: PathBuf,
    _guard: WorkerGuard,
}

static SINK: Mutex<Option<LogSink>> = Mutex::new(None);

/// 日志行格式化器
pub struct SessionLineFormat {
    default_session: String,
}

impl SessionLineFormat {
    pub fn new(default_session: impl Into<String>) -> Self {
        Self {
            default_session: default_session.into(),
        }
    }
}

/// 从 span 的已格式化字段中取出 session_id 的值
fn session_from_fields(fields: &str) -> Option<&str> {
    let start = fields.find(SESSION_FIELD)? + SESSION_FIELD.len();
    let rest = &fields[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    Some(rest[..end].trim_matches('"'))
}

impl<S, N> FormatEvent<S, N> for SessionLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        let mut function: Option<String> = None;
        let mut session: Option<String> = None;
        if let Some(scope) = ctx.event_scope() {
            for span in scope {
                if function.is_none() {
                    function = Some(span.name().to_string());
                }
                if session.is_none() {
                    let ext = span.extensions();
                    if let Some(fields) = ext.get::<FormattedFields<N>>() {
                        session = session_from_fields(fields.fields.as_str()).map(String::from);
                    }
                }
                if function.is_some() && session.is_some() {
                    break;
                }
            }
        }

        write!(
            writer,
            "[{}] {} line {}, in {}, session_id={}: ",
            meta.level(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            meta.line().unwrap_or(0),
            function.as_deref().unwrap_or_else(|| meta.target()),
            session.as_deref().unwrap_or(&self.default_session),
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// 安装进程级日志 sink；已安装时什么也不做。返回本次调用是否真正安装了 sink。
pub fn init_logger(section: &LogSection, session_id: &SessionId) -> Result<bool, AgentError> {
    let mut sink = SINK
        .lock()
        .map_err(|_| AgentError::Logging("logger lock poisoned".to_string()))?;
    if sink.is_some() {
        return Ok(false);
    }

    std::fs::create_dir_all(&section.dir)?;
    let appender = RollingBuilder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(section.file.clone())
        .build(&section.dir)
        .map_err(|e| AgentError::Logging(e.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&section.level))
        .map_err(|e| AgentError::Logging(e.to_string()))?;

    let file_layer = tfmt::layer()
        .event_format(SessionLineFormat::new(session_id.as_str()))
        .with_writer(writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| AgentError::Logging(e.to_string()))?;

    *sink = Some(LogSink {
        path: section.dir.join(&section.file),
        _guard: guard,
    });
    tracing::info!(session_id = %session_id, "logger initialized");
    Ok(true)
}

/// 已挂载的文件 sink 数（0 或 1）
pub fn handler_count() -> usize {
    SINK.lock().map(|s| usize::from(s.is_some())).unwrap_or(0)
}

/// 当前 sink 的文件前缀路径（滚动文件名为 `<prefix>.<YYYY-MM-DD>`）
pub fn log_path_prefix() -> Option<PathBuf> {
    SINK.lock().ok().and_then(|s| s.as_ref().map(|s| s.path.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_fields() {
        assert_eq!(session_from_fields("session_id=abc123 turn=2"), Some("abc123"));
        assert_eq!(session_from_fields("turn=2 session_id=\"xyz\""), Some("xyz"));
        assert_eq!(session_from_fields("turn=2"), None);
    }
}
