//! 引擎公共契约
//!
//! 生命周期：UNINITIALIZED → READY（init 返回 SUCCESS）→ CLOSED（close / cleanup）。

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{CombinedRobotState, Data, Status};

/// 引擎角色，对应任务配置 `engines` 下的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineRole {
    Data,
    WorldConstructor,
    Simulation,
    Kinematics,
    Controller,
}

impl EngineRole {
    /// 初始化顺序
    pub const INIT_ORDER: [EngineRole; 5] = [
        EngineRole::Data,
        EngineRole::WorldConstructor,
        EngineRole::Simulation,
        EngineRole::Kinematics,
        EngineRole::Controller,
    ];

    pub fn config_key(self) -> &'static str {
        match self {
            EngineRole::Data => "data",
            EngineRole::WorldConstructor => "world_constructor",
            EngineRole::Simulation => "simulation",
            EngineRole::Kinematics => "kinematics",
            EngineRole::Controller => "controller",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::INIT_ORDER.into_iter().find(|r| r.config_key() == key)
    }
}

impl std::fmt::Display for EngineRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.config_key())
    }
}

#[async_trait]
pub trait Engine: Send + Sync {
    fn class_id(&self) -> &str;

    fn role(&self) -> EngineRole;

    /// robot_structure 为原样的结构配置（数组或对象），configs 为该引擎在 `engines` 下的条目
    async fn init(&mut self, general: &Data, robot_structure: &Value, configs: &Data) -> Status;

    async fn close(&mut self) -> Status;

    /// 周期性驱动；需要 tick 的引擎必须覆盖
    async fn update(&mut self, _states: &CombinedRobotState) -> Status {
        Status::not_implemented("Engine::update")
    }
}
