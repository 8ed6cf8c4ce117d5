//! 物理传感器

use async_trait::async_trait;

use crate::core::{Data, Status};

use super::info::SensorInfo;

#[async_trait]
pub trait PhysicalSensor: Send + Sync {
    fn info(&self) -> &SensorInfo;

    async fn connect(&mut self) -> Status;

    async fn disconnect(&mut self) -> Status;

    /// 力/力矩类读数
    async fn get_physics_state(&mut self, _cmd: &str, _extra: &Data) -> (Status, Data) {
        (Status::not_implemented("PhysicalSensor::get_physics_state"), Data::new())
    }

    /// 视觉类读数（图像、点云、识别结果）
    async fn get_scenery_state(&mut self, _cmd: &str, _extra: &Data) -> (Status, Data) {
        (Status::not_implemented("PhysicalSensor::get_scenery_state"), Data::new())
    }
}
