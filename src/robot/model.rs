//! 模型机器人：运动学引擎持有的机器人模型（纯计算，无硬件会话）

use crate::core::{Data, Pose, RobotRole, Status};

use super::info::ModelInfo;

/// 模型能力契约；查询类方法在目标不存在时返回 None
pub trait ModelRobot: Send + Sync {
    fn unique_id(&self) -> &str;

    fn role(&self) -> RobotRole;

    fn create(&mut self, info: &ModelInfo, configs: &Data) -> Status;

    /// 释放模型资源；引擎 cleanup 时对每个模型恰好调用一次
    fn destroy(&mut self) -> Status;

    fn get_configuration_for_task(&self, _task: &str) -> Option<Data> {
        None
    }

    fn get_recognition_method(&self, _task: &str) -> Option<String> {
        None
    }

    fn get_link_transform(&self, _link: &str) -> Option<Pose> {
        None
    }

    /// 任务坐标系（如抓取点）相对机器人根的变换
    fn get_task_transform(&self, _task: &str) -> Option<Pose> {
        None
    }
}
