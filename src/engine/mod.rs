//! 引擎层：按角色划分的引擎契约、注册表与门面
//!
//! - **base**: 公共契约与角色
//! - **kinematics** / **controller**: 带焦点与机器人集合的基础实现
//! - **data** / **world**: 数据、世界构造与仿真引擎契约
//! - **registry**: 定位符 → 构造函数
//! - **interface**: EngineInterface 门面

pub mod base;
pub mod controller;
pub mod data;
pub mod interface;
pub mod kinematics;
pub mod registry;
pub mod world;

pub use base::{Engine, EngineRole};
pub use controller::{ControllerEngine, ControllerEngineBase};
pub use data::DataEngine;
pub use interface::EngineInterface;
pub use kinematics::{KinematicsEngine, KinematicsEngineBase};
pub use registry::{EngineFactory, EngineHandle, EngineRegistry};
pub use world::{SimulationEngine, WorldConstructorEngine};
