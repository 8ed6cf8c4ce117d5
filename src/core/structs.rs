//! 基础数据结构：位姿、机器人状态、组合状态/动作、角色枚举

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::actions::RobotAction;
use super::status::{Status, StatusFlag};

/// 开放的键值参数包（configs、传感器返回数据、技能参数等）
pub type Data = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// 单位四元数（x, y, z, w），默认单位旋转
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Point, orientation: Quaternion) -> Self {
        Self { position, orientation }
    }
}

/// 关节状态：位置 / 速度 / 力矩（后两者可为空）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointStates {
    pub positions: Vec<f64>,
    #[serde(default)]
    pub velocities: Vec<f64>,
    #[serde(default)]
    pub efforts: Vec<f64>,
}

/// 机械臂扩展：有序关节名 + 关节状态
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManipulatorState {
    pub joint_names: Vec<String>,
    pub joint_states: JointStates,
}

/// 单个机器人的状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotState {
    pub base_state: Pose,
    pub status: Status,
    #[serde(default)]
    pub timesec: Option<f64>,
    #[serde(default)]
    pub manipulator: Option<ManipulatorState>,
}

impl RobotState {
    pub fn new(base_state: Pose) -> Self {
        Self {
            base_state,
            status: Status::success(),
            timesec: None,
            manipulator: None,
        }
    }

    pub fn with_status(base_state: Pose, status: Status) -> Self {
        Self {
            status,
            ..Self::new(base_state)
        }
    }

    pub fn with_timesec(mut self, timesec: f64) -> Self {
        self.timesec = Some(timesec);
        self
    }

    /// 带关节信息的机械臂状态
    pub fn manipulator(joint_names: Vec<String>, joint_states: JointStates, base_state: Pose) -> Self {
        Self {
            manipulator: Some(ManipulatorState {
                joint_names,
                joint_states,
            }),
            ..Self::new(base_state)
        }
    }

    /// 未上报状态的占位（状态为 UNKNOWN）
    pub fn unknown() -> Self {
        Self::with_status(Pose::default(), Status::new(StatusFlag::Unknown))
    }
}

/// 多机器人组合状态：robot_id -> RobotState
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedRobotState {
    pub robot_states: HashMap<String, RobotState>,
}

impl CombinedRobotState {
    pub fn new(robot_states: HashMap<String, RobotState>) -> Self {
        Self { robot_states }
    }
}

/// 多机器人组合动作：任务标签 + robot_id -> 有序动作列表
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedRobotAction {
    pub task: String,
    pub actions: HashMap<String, Vec<RobotAction>>,
}

impl CombinedRobotAction {
    pub fn new(task: impl Into<String>, actions: HashMap<String, Vec<RobotAction>>) -> Self {
        Self {
            task: task.into(),
            actions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.values().all(|a| a.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RobotRole {
    Base,
    Manipulator,
    EndEffector,
    Sensor,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorRole {
    Camera2d,
    Camera3d,
    Force6d,
    Torque,
    Other,
}

impl SensorRole {
    /// 力/力矩类传感器，可通过 getPhysicsState 查询
    pub fn is_physics(self) -> bool {
        matches!(self, SensorRole::Force6d | SensorRole::Torque)
    }

    /// 视觉类传感器，可通过 getSceneryState 查询
    pub fn is_vision(self) -> bool {
        matches!(self, SensorRole::Camera2d | SensorRole::Camera3d)
    }
}
