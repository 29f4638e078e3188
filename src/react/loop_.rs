//! ReAct 主循环（Agent Controller）
//!
//! THINKING -> ACTING (Tool) -> OBSERVING -> THINKING …；模型给出 Final Answer 或迭代数达到
//! max_iterations 时进入 ANSWERING。计数器每轮对话从 0 开始，轮内不重置；每个循环（含解析失败、
//! 非法工具名）消耗一次迭代，所以循环一定在 max_iterations 次模型决策内结束。
//! 工具调用严格串行：上一个完成后才做下一次决策。

use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::{AgentError, AgentPhase};
use crate::memory::Message;
use crate::react::planner::{AgentStep, Decision, Planner, StepAction};
use crate::react::ReactEvent;
use crate::tools::ToolExecutor;

/// Force 模式下返回的固定文本
pub const FORCE_STOP_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// 迭代耗尽时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarlyStopping {
    /// 直接返回固定文本
    Force,
    /// 再调用一次模型，基于已有步骤生成答案
    Generate,
}

/// 模型输出无法解析时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsingErrorPolicy {
    /// 作为 Observation 回灌，消耗一次迭代
    Observe,
    /// 以 OutputParse 错误结束本轮
    Raise,
}

/// 工具执行失败时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolErrorPolicy {
    /// 中止本轮，把错误交给调用方
    Propagate,
    /// 把 "Error: ..." 作为 Observation 回灌
    Observe,
}

#[derive(Debug, Clone, Copy)]
pub struct AgentOptions {
    pub max_iterations: usize,
    pub early_stopping: EarlyStopping,
    pub parsing_errors: ParsingErrorPolicy,
    pub tool_errors: ToolErrorPolicy,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            early_stopping: EarlyStopping::Generate,
            parsing_errors: ParsingErrorPolicy::Observe,
            tool_errors: ToolErrorPolicy::Propagate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 模型主动给出 Final Answer
    Answered,
    /// 迭代耗尽后按 EarlyStopping 生成答案
    IterationLimit,
}

/// 单轮对话结果
#[derive(Debug)]
pub struct TurnOutcome {
    pub answer: String,
    pub steps: Vec<AgentStep>,
    pub iterations: usize,
    /// 实际执行的工具调用数（不含解析失败与非法工具名）
    pub tool_invocations: usize,
    pub stop_reason: StopReason,
    /// 依次经过的阶段，最后一个总是 Answering
    pub phases: Vec<AgentPhase>,
}

struct Turn<'a> {
    events: Option<&'a UnboundedSender<ReactEvent>>,
    phases: Vec<AgentPhase>,
    steps: Vec<AgentStep>,
    iterations: usize,
    tool_invocations: usize,
}

impl Turn<'_> {
    fn enter(&mut self, phase: AgentPhase) {
        self.phases.push(phase);
        self.emit(ReactEvent::Phase {
            phase,
            iteration: self.iterations,
        });
    }

    fn emit(&self, ev: ReactEvent) {
        if let Some(tx) = self.events {
            let _ = tx.send(ev);
        }
    }

    fn finish(mut self, answer: String, stop_reason: StopReason) -> TurnOutcome {
        self.enter(AgentPhase::Answering);
        self.emit(ReactEvent::FinalAnswer {
            text: answer.clone(),
        });
        TurnOutcome {
            answer,
            steps: self.steps,
            iterations: self.iterations,
            tool_invocations: self.tool_invocations,
            stop_reason,
            phases: self.phases,
        }
    }
}

/// Agent Controller：每个会话一个，跨轮复用
pub struct AgentController {
    planner: Planner,
    executor: ToolExecutor,
    options: AgentOptions,
}

impl std::fmt::Debug for AgentController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentController")
            .field("tools", &self.executor.tool_names())
            .field("options", &self.options)
            .finish()
    }
}

impl AgentController {
    /// 校验：工具集非空、max_iterations > 0（名称唯一由 ToolRegistry 保证）
    pub fn new(
        planner: Planner,
        executor: ToolExecutor,
        options: AgentOptions,
    ) -> Result<Self, AgentError> {
        if executor.tool_count() == 0 {
            return Err(AgentError::InvalidConfig("tool set is empty".to_string()));
        }
        if options.max_iterations == 0 {
            return Err(AgentError::InvalidConfig(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            planner,
            executor,
            options,
        })
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.executor.tool_names()
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// 处理一轮用户输入；history 为此前的对话（不含本轮）
    #[tracing::instrument(
        name = "agent_turn",
        skip_all,
        fields(max_iterations = self.options.max_iterations)
    )]
    pub async fn run_turn(
        &self,
        input: &str,
        history: &[Message],
        events: Option<&UnboundedSender<ReactEvent>>,
    ) -> Result<TurnOutcome, AgentError> {
        let mut turn = Turn {
            events,
            phases: Vec::new(),
            steps: Vec::new(),
            iterations: 0,
            tool_invocations: 0,
        };

        while turn.iterations < self.options.max_iterations {
            turn.enter(AgentPhase::Thinking);
            let decision = self.planner.decide(input, history, &turn.steps).await?;

            match decision {
                Decision::FinalAnswer { answer, .. } => {
                    tracing::info!(
                        iterations = turn.iterations,
                        tools = turn.tool_invocations,
                        "agent answered"
                    );
                    return Ok(turn.finish(answer, StopReason::Answered));
                }
                Decision::Tool { tool, input: tool_input, log } => {
                    if !self.executor.contains(&tool) {
                        let observation = format!(
                            "{} is not a valid tool, try one of [{}].",
                            tool,
                            self.executor.tool_names().join(", ")
                        );
                        tracing::warn!(tool = %tool, "model selected unknown tool");
                        turn.emit(ReactEvent::InvalidTool {
                            tool: tool.clone(),
                            observation: observation.clone(),
                        });
                        turn.steps.push(AgentStep {
                            action: StepAction::InvalidTool {
                                tool,
                                input: tool_input,
                                log,
                            },
                            observation,
                        });
                    } else {
                        turn.enter(AgentPhase::Acting);
                        turn.emit(ReactEvent::ToolCall {
                            tool: tool.clone(),
                            input: tool_input.clone(),
                        });
                        turn.tool_invocations += 1;
                        let observation = match self.executor.invoke(&tool, &tool_input).await {
                            Ok(out) => out,
                            Err(e) => match self.options.tool_errors {
                                ToolErrorPolicy::Propagate => {
                                    tracing::error!(
                                        tool = %tool,
                                        error = %e,
                                        "tool failed, aborting turn"
                                    );
                                    return Err(e);
                                }
                                ToolErrorPolicy::Observe => {
                                    tracing::warn!(
                                        tool = %tool,
                                        error = %e,
                                        "tool failed, fed back as observation"
                                    );
                                    format!("Error: {e}")
                                }
                            },
                        };
                        turn.enter(AgentPhase::Observing);
                        turn.emit(ReactEvent::Observation {
                            tool: tool.clone(),
                            preview: preview(&observation),
                        });
                        turn.steps.push(AgentStep {
                            action: StepAction::Tool {
                                tool,
                                input: tool_input,
                                log,
                            },
                            observation,
                        });
                    }
                }
                Decision::ParseError { raw, observation } => {
                    if self.options.parsing_errors == ParsingErrorPolicy::Raise {
                        return Err(AgentError::OutputParse(raw));
                    }
                    tracing::warn!(detail = %observation, "unparseable model output");
                    turn.emit(ReactEvent::ParseError {
                        detail: observation.clone(),
                    });
                    turn.steps.push(AgentStep {
                        action: StepAction::ParseError { raw },
                        observation,
                    });
                }
            }

            turn.iterations += 1;
        }

        turn.emit(ReactEvent::IterationLimit {
            max_iterations: self.options.max_iterations,
        });
        tracing::warn!(
            max_iterations = self.options.max_iterations,
            "iteration limit reached, early stopping"
        );
        let answer = match self.options.early_stopping {
            EarlyStopping::Force => FORCE_STOP_ANSWER.to_string(),
            EarlyStopping::Generate => self.planner.conclude(input, history, &turn.steps).await?,
        };
        Ok(turn.finish(answer, StopReason::IterationLimit))
    }
}

fn preview(s: &str) -> String {
    if s.chars().count() > OBSERVATION_PREVIEW_CHARS {
        format!("{}...", s.chars().take(OBSERVATION_PREVIEW_CHARS).collect::<String>())
    } else {
        s.to_string()
    }
}
