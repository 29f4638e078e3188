//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / invoke），ToolRegistry 按注册顺序保存并按名查找；
//! 名称必须唯一，重复注册直接报错（两个同名工具会让模型的选择失去意义）。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AgentError;

/// 工具 trait：名称、描述（模型据此选择工具）、文本进文本出的调用
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（对应模型输出中的 "Action:"）
    fn name(&self) -> &str;

    /// 工具描述（供模型理解功能）
    fn description(&self) -> &str;

    /// 执行工具；返回的文本可以为空，不得修改会话状态
    async fn invoke(&self, query: &str) -> Result<String, String>;
}

/// 注册表：保持注册顺序（决定 prompt 中的工具列表顺序）
#[derive(Default)]
pub struct ToolRegistry {
    /// (去除首尾空白后的名称, 工具)
    tools: Vec<(String, Arc<dyn Tool>)>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), AgentError> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<(), AgentError> {
        let name = tool.name().trim().to_string();
        if name.is_empty() {
            return Err(AgentError::InvalidConfig("tool name must not be empty".to_string()));
        }
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.index.insert(name.clone(), self.tools.len());
        self.tools.push((name, tool));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].1.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|(name, _)| name.clone()).collect()
    }

    /// (name, description) 列表，按注册顺序
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|(name, t)| (name.clone(), t.description().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
