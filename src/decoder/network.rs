//! 节点执行反馈钩子；协议由外部实现决定

use async_trait::async_trait;
use serde::Serialize;

use crate::core::Status;

/// 每个叶子节点执行完后发送
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeFeedback {
    pub run_id: String,
    pub node_name: String,
    pub node_id: Vec<usize>,
    pub status: Status,
    pub timestamp_ms: i64,
}

#[async_trait]
pub trait NetworkClient: Send + Sync {
    async fn send_feedback(&self, feedback: &NodeFeedback) -> Status;
}
