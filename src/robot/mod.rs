//! 机器人/传感器能力契约与多机器人组合器

pub mod combiner;
pub mod info;
pub mod model;
pub mod physical;
pub mod sensor;

pub use combiner::{ContextPreferencePolicy, ResolutionPolicy, RobotCombiner};
pub use info::{ModelInfo, SensorInfo};
pub use model::ModelRobot;
pub use physical::PhysicalRobot;
pub use sensor::PhysicalSensor;
