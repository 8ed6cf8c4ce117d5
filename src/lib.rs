//! tasq - 机器人任务编排
//!
//! 解释行为树任务描述，通过技能生命周期驱动各类引擎（运动学、控制器、数据、世界构造、仿真），
//! 并在黑板上共享状态、在多机器人/多传感器间裁决资源。
//!
//! 模块划分：
//! - **config**: 应用配置（TOML + 环境变量）与任务配置加载
//! - **core**: 结果状态、错误、基础结构、动作格式、黑板
//! - **decoder**: 行为树解释器（断点续跑、反馈钩子、大纲）
//! - **engine**: 引擎契约、注册表与 EngineInterface 门面
//! - **observability**: 日志订阅者
//! - **robot**: 机器人/传感器能力契约与 RobotCombiner
//! - **skills**: 技能抽象、解码器、技能库与 SkillInterface

pub mod config;
pub mod core;
pub mod decoder;
pub mod engine;
pub mod observability;
pub mod robot;
pub mod skills;

pub use crate::core::{Blackboard, Status, StatusFlag, StatusReason, TasqError};
pub use decoder::TaskSequenceDecoder;
pub use engine::EngineInterface;
pub use skills::SkillInterface;
