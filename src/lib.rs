//! Concierge - 会话级客服智能体
//!
//! 模块划分：
//! - **agent**: 组件工厂与 Agent Controller 装配
//! - **config**: 应用配置加载（.env + TOML + 环境变量）
//! - **core**: 错误类型与 Agent 阶段
//! - **knowledge**: 文档分块、关键词检索、检索链（RAG）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Scripted）、token 计数
//! - **memory**: 会话消息与有界对话历史
//! - **observability**: 进程级滚动日志
//! - **react**: Planner 与 ReAct 主循环
//! - **session**: 会话上下文与幂等初始化
//! - **tools**: 工具箱（知识库、Web 搜索）与执行器

pub mod agent;
pub mod config;
pub mod core;
pub mod knowledge;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod session;
pub mod tools;

pub use agent::{AgentFactory, Bootstrap, DefaultAgentFactory};
pub use session::Session;
