//! 核心层：错误类型与 Agent 阶段

pub mod error;
pub mod state;

pub use error::AgentError;
pub use state::AgentPhase;
