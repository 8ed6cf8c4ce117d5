//! 世界构造引擎与仿真引擎

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{SpawnComponent, Status};

use super::base::Engine;

#[async_trait]
pub trait WorldConstructorEngine: Engine {
    /// 需要在仿真/真实场景中加载的组件
    async fn get_spawn_components(&mut self) -> (Status, Vec<SpawnComponent>);
}

#[async_trait]
pub trait SimulationEngine: Engine {
    async fn reset(&mut self) -> Status;

    async fn load_robots(&mut self, robot_structure: &Value) -> Status;

    async fn load_components(&mut self, components: &[SpawnComponent]) -> Status;
}
