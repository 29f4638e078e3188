//! 会话：调用方持有的显式上下文对象
//!
//! initialize 按固定顺序执行四步：会话数据 → 会话 id → 日志 → Agent Controller
//! （日志行里要带会话 id，所以 id 必须先于日志存在）。每一步在已完成时都是空操作，
//! 因此对同一会话重复初始化不会改变任何可观察状态。

pub mod feedback;
pub mod state;

pub use feedback::Feedback;
pub use state::{SessionId, SessionState};

use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

use crate::agent::{create_agent_components, AgentComponents, Bootstrap};
use crate::config::LogSection;
use crate::core::AgentError;
use crate::memory::Message;
use crate::observability;
use crate::react::{ReactEvent, TurnOutcome};

#[derive(Default)]
pub struct Session {
    state: Option<SessionState>,
    id: Option<SessionId>,
    logger_ready: bool,
    agent: Option<AgentComponents>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, boot: &Bootstrap) -> Result<(), AgentError> {
        self.initialize_state(boot.config.app.max_context_turns);
        self.initialize_session_id();
        self.initialize_logger(&boot.config.log)?;
        self.initialize_agent(boot)
    }

    fn initialize_state(&mut self, max_context_turns: usize) {
        if self.state.is_none() {
            self.state = Some(SessionState::new(max_context_turns));
        }
    }

    fn initialize_session_id(&mut self) {
        if self.id.is_none() {
            self.id = Some(SessionId::generate());
        }
    }

    fn initialize_logger(&mut self, section: &LogSection) -> Result<(), AgentError> {
        if self.logger_ready {
            return Ok(());
        }
        let id = self
            .id
            .as_ref()
            .ok_or(AgentError::NotInitialized("session id"))?;
        observability::init_logger(section, id)?;
        self.logger_ready = true;
        Ok(())
    }

    fn initialize_agent(&mut self, boot: &Bootstrap) -> Result<(), AgentError> {
        if self.agent.is_some() {
            return Ok(());
        }
        let id = self
            .id
            .as_ref()
            .ok_or(AgentError::NotInitialized("session id"))?;
        let components = tracing::info_span!("session", session_id = %id)
            .in_scope(|| create_agent_components(boot))?;
        self.agent = Some(components);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some() && self.id.is_some() && self.logger_ready && self.agent.is_some()
    }

    pub fn id(&self) -> Option<&SessionId> {
        self.id.as_ref()
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn feedback_mut(&mut self) -> Option<&mut Feedback> {
        self.state.as_mut().map(|s| &mut s.feedback)
    }

    pub fn agent(&self) -> Option<&AgentComponents> {
        self.agent.as_ref()
    }

    /// 处理一轮用户输入：记录消息、跑 Agent、累计 token、打开反馈按钮
    pub async fn handle_input(
        &mut self,
        input: &str,
        events: Option<&UnboundedSender<ReactEvent>>,
    ) -> Result<TurnOutcome, AgentError> {
        let agent = self
            .agent
            .as_ref()
            .ok_or(AgentError::NotInitialized("agent controller"))?;
        let state = self
            .state
            .as_mut()
            .ok_or(AgentError::NotInitialized("session state"))?;
        let id = self
            .id
            .as_ref()
            .ok_or(AgentError::NotInitialized("session id"))?;

        let input = input.trim();
        if input.is_empty() {
            return Err(AgentError::EmptyInput);
        }

        let span = tracing::info_span!("session", session_id = %id);
        span.in_scope(|| tracing::info!(input = %input, "user input"));

        state.feedback.reset();
        state.push_message(Message::user(input));
        let history = state.chat_history().to_vec();

        let outcome = agent
            .controller
            .run_turn(input, &history, events)
            .instrument(span.clone())
            .await;

        match outcome {
            Ok(outcome) => {
                let tokens = agent.tokens.count(input) + agent.tokens.count(&outcome.answer);
                state.push_message(Message::assistant(outcome.answer.clone()));
                state.record_turn(input, &outcome.answer, tokens as u64);
                state.feedback.on_answer();
                let (prompt, completion, _) = agent.controller.planner().token_usage();
                span.in_scope(|| {
                    tracing::info!(
                        iterations = outcome.iterations,
                        tool_invocations = outcome.tool_invocations,
                        total_tokens = state.total_tokens(),
                        llm_prompt_tokens = prompt,
                        llm_completion_tokens = completion,
                        "answer generated"
                    )
                });
                Ok(outcome)
            }
            Err(e) => {
                span.in_scope(|| tracing::error!(error = %e, "agent could not complete the turn"));
                Err(e)
            }
        }
    }

    /// 会话结束：记录日志后释放全部状态
    pub fn teardown(self) {
        if let Some(id) = &self.id {
            tracing::info_span!("session", session_id = %id).in_scope(|| {
                tracing::info!(
                    messages = self.state.as_ref().map(|s| s.messages().len()).unwrap_or(0),
                    "session closed"
                )
            });
        }
    }
}
