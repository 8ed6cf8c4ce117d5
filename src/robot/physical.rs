//! 物理机器人：控制器引擎持有的硬件（或仿真）会话

use async_trait::async_trait;

use crate::core::{Data, Pose, RobotAction, RobotRole, RobotState, Status};

#[async_trait]
pub trait PhysicalRobot: Send + Sync {
    fn unique_id(&self) -> &str;

    fn role(&self) -> RobotRole;

    async fn connect(&mut self) -> Status;

    async fn disconnect(&mut self) -> Status;

    /// 连接后的设备初始化（回原点、上使能等）
    async fn init(&mut self, _configs: &Data) -> Status {
        Status::not_implemented("PhysicalRobot::init")
    }

    async fn get_latest_state(&mut self) -> RobotState;

    async fn emergency_stop(&mut self) -> Status;

    async fn send_action(&mut self, action: &RobotAction) -> Status;

    async fn get_link_transform(&mut self, _link: &str) -> (Status, Pose) {
        (Status::not_implemented("PhysicalRobot::get_link_transform"), Pose::default())
    }
}
