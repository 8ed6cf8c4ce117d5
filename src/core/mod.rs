//! 核心数据模型：结果状态、错误、基础结构、动作格式、世界记录、黑板

pub mod actions;
pub mod blackboard;
pub mod error;
pub mod status;
pub mod structs;
pub mod world;

pub use actions::{CommandAction, FkAction, IkAction, Nav3dAction, PointToAction, RobotAction, SolveByType};
pub use blackboard::Blackboard;
pub use error::TasqError;
pub use status::{Status, StatusFlag, StatusReason};
pub use structs::{
    CombinedRobotAction, CombinedRobotState, Data, JointStates, ManipulatorState, Point, Pose, Quaternion,
    RobotRole, RobotState, SensorRole,
};
pub use world::{CombinedRobotStruct, SpawnComponent};
