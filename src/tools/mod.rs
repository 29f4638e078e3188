//! 工具箱：Tool trait、注册表、执行器，以及知识库 / Web 搜索适配器

pub mod catalog;
pub mod executor;
pub mod knowledge;
pub mod registry;
pub mod search;

pub use catalog::build_support_tools;
pub use executor::ToolExecutor;
pub use knowledge::KnowledgeBaseTool;
pub use registry::{Tool, ToolRegistry};
pub use search::WebSearchTool;
