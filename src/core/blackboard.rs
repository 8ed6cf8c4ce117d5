//! 黑板：单次任务运行内共享的键值存储
//!
//! 不做内部加锁：同一时刻只归一个决策流程所有，并发共享需外部协调。

use std::collections::HashMap;

use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct Blackboard {
    board: HashMap<String, Value>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 空字符串键被忽略（仅记录日志），其余插入或覆盖
    pub fn set_board_variable(&mut self, key: &str, value: impl Into<Value>) {
        if key.is_empty() {
            tracing::warn!("Blackboard: ignoring key as empty string");
            return;
        }
        self.board.insert(key.to_string(), value.into());
    }

    pub fn get_board_variable(&self, key: &str) -> Option<&Value> {
        let value = self.board.get(key);
        if value.is_none() {
            tracing::warn!("Blackboard: get on unknown variable {}", key);
        }
        value
    }

    pub fn clear_board(&mut self) {
        self.board.clear();
    }

    pub fn len(&self) -> usize {
        self.board.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty()
    }
}
