//! 认知层：Planner（prompt 与输出解析）、Agent Controller（ReAct 主循环）、事件

pub mod events;
pub mod loop_;
pub mod planner;

pub use events::ReactEvent;
pub use loop_::{
    AgentController, AgentOptions, EarlyStopping, ParsingErrorPolicy, StopReason,
    ToolErrorPolicy, TurnOutcome, FORCE_STOP_ANSWER,
};
pub use planner::{parse_llm_output, AgentStep, Decision, Planner, StepAction};
