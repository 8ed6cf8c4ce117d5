//! 行为树决策器：遍历任务树并通过 SkillInterface 执行叶子技能

pub mod network;
pub mod sequence;
pub mod tree;

pub use network::{NetworkClient, NodeFeedback};
pub use sequence::{RunContext, TaskSequenceDecoder};
pub use tree::{outline_tree, NodeOutline};
