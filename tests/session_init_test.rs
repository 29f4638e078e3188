//! 会话初始化集成测试：幂等、进程级唯一日志 sink、一轮对话后的会话数据

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use concierge::config::AppConfig;
use concierge::core::AgentError;
use concierge::llm::{LlmClient, ScriptedLlmClient};
use concierge::memory::Role;
use concierge::observability;
use concierge::tools::{Tool, ToolRegistry};
use concierge::{AgentFactory, Bootstrap, Session};
use regex::Regex;

struct StaticTool;

#[async_trait]
impl Tool for StaticTool {
    fn name(&self) -> &str {
        "search_company_info"
    }

    fn description(&self) -> &str {
        "会社に関する情報を検索します。"
    }

    async fn invoke(&self, _query: &str) -> Result<String, String> {
        Ok("株式会社EcoTeeは2010年設立です。".to_string())
    }
}

#[derive(Default)]
struct CountingFactory {
    builds: AtomicUsize,
}

impl AgentFactory for CountingFactory {
    fn create_llm(&self, _cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, AgentError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(
            ScriptedLlmClient::new([
                "Thought: I should check the company docs\nAction: search_company_info\nAction Input: 設立",
            ])
            .with_fallback("Thought: I now know the final answer\nFinal Answer: 2010年に設立されました。"),
        ))
    }

    fn create_tools(
        &self,
        _cfg: &AppConfig,
        _llm: Arc<dyn LlmClient>,
    ) -> Result<ToolRegistry, AgentError> {
        let mut reg = ToolRegistry::new();
        reg.register(StaticTool)?;
        Ok(reg)
    }
}

/// 整个测试进程共用一个日志目录（sink 只会装一次）
fn log_dir() -> &'static PathBuf {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        std::env::temp_dir().join(format!("concierge-test-logs-{}", std::process::id()))
    })
}

fn bootstrap() -> (Bootstrap, Arc<CountingFactory>) {
    let mut cfg = AppConfig::default();
    cfg.log.dir = log_dir().clone();
    cfg.log.level = "info".to_string();
    let factory = Arc::new(CountingFactory::default());
    (Bootstrap::new(cfg).with_factory(factory.clone()), factory)
}

#[test]
fn test_initialize_is_idempotent() {
    let (boot, factory) = bootstrap();
    let mut session = Session::new();
    assert!(!session.is_initialized());

    session.initialize(&boot).unwrap();
    assert!(session.is_initialized());
    let id = session.id().cloned().unwrap();

    session.initialize(&boot).unwrap();
    session.initialize(&boot).unwrap();
    assert_eq!(session.id(), Some(&id));
    assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    assert!(session.state().unwrap().messages().is_empty());
    assert_eq!(observability::handler_count(), 1);
}

#[test]
fn test_single_log_sink_across_sessions() {
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                let (boot, _) = bootstrap();
                let mut session = Session::new();
                session.initialize(&boot).unwrap();
                session.initialize(&boot).unwrap();
            });
        }
    });
    assert_eq!(observability::handler_count(), 1);
    assert!(observability::log_path_prefix().is_some());
}

#[test]
fn test_sessions_get_distinct_ids() {
    let (boot, _) = bootstrap();
    let mut a = Session::new();
    let mut b = Session::new();
    a.initialize(&boot).unwrap();
    b.initialize(&boot).unwrap();
    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn test_input_before_initialize_is_rejected() {
    let mut session = Session::new();
    let err = session.handle_input("こんにちは", None).await.unwrap_err();
    assert!(matches!(err, AgentError::NotInitialized(_)));
}

#[tokio::test]
async fn test_empty_input_is_rejected() {
    let (boot, _) = bootstrap();
    let mut session = Session::new();
    session.initialize(&boot).unwrap();
    let err = session.handle_input("   ", None).await.unwrap_err();
    assert!(matches!(err, AgentError::EmptyInput));
    assert!(session.state().unwrap().messages().is_empty());
}

#[tokio::test]
async fn test_turn_updates_session_state() {
    let (boot, _) = bootstrap();
    let mut session = Session::new();
    session.initialize(&boot).unwrap();

    let outcome = session.handle_input("EcoTeeの設立年は？", None).await.unwrap();
    assert_eq!(outcome.answer, "2010年に設立されました。");
    assert_eq!(outcome.tool_invocations, 1);

    let state = session.state().unwrap();
    let roles: Vec<Role> = state.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(state.chat_history().len(), 2);
    let after_first = state.total_tokens();
    assert!(after_first > 0);
    assert!(state.feedback.answer_flg);

    session.handle_input("ありがとう", None).await.unwrap();
    let state = session.state().unwrap();
    assert!(state.total_tokens() > after_first);
    assert_eq!(state.messages().len(), 4);
}

#[tokio::test]
async fn test_feedback_flow_after_answer() {
    let (boot, _) = bootstrap();
    let mut session = Session::new();
    session.initialize(&boot).unwrap();
    session.handle_input("設立年は？", None).await.unwrap();

    let fb = session.feedback_mut().unwrap();
    assert!(fb.buttons_visible());
    assert!(fb.press_no());
    assert!(fb.submit_reason("情報が古い"));
    assert!(fb.thanks_visible());
}

#[tokio::test]
async fn test_log_lines_carry_session_id() {
    let (boot, _) = bootstrap();
    let mut session = Session::new();
    session.initialize(&boot).unwrap();
    session.handle_input("設立年は？", None).await.unwrap();
    let id = session.id().unwrap().to_string();

    let prefix = observability::log_path_prefix().unwrap();
    let dir = prefix.parent().unwrap().to_path_buf();
    let stem = prefix.file_name().unwrap().to_string_lossy().to_string();

    let line_re = Regex::new(&format!(
        r"^\[INFO\] \d{{4}}-\d{{2}}-\d{{2}} \d{{2}}:\d{{2}}:\d{{2}},\d{{3}} line \d+, in (\w+), session_id={id}: "
    ))
    .unwrap();

    // 写入由后台线程完成，轮询等待
    let mut functions: Vec<(String, String)> = Vec::new();
    for _ in 0..50 {
        let contents: String = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(&stem))
            .filter_map(|e| std::fs::read_to_string(e.path()).ok())
            .collect();
        functions = contents
            .lines()
            .filter_map(|l| line_re.captures(l).map(|c| (c[1].to_string(), l.to_string())))
            .collect();
        let answered = functions
            .iter()
            .any(|(f, l)| f == "agent_turn" && l.contains("agent answered"));
        if answered {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(
        functions
            .iter()
            .any(|(f, l)| f == "agent_turn" && l.contains("agent answered")),
        "no agent_turn line for session {id}: {functions:?}"
    );
    assert!(functions
        .iter()
        .any(|(f, l)| f == "session" && l.contains("user input")));
}
