//! 运动学引擎：把目标级动作（IK / 导航 / 指向）求解为控制器可执行的动作
//!
//! KinematicsEngineBase 维护焦点（当前末端执行器、传感器）与模型集合；
//! 具体求解由实现 KinematicsEngine 的类型提供。

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::{CombinedRobotAction, CombinedRobotState, Data, Pose, RobotRole, SensorRole, Status};
use crate::robot::{ModelRobot, RobotCombiner, SensorInfo};

use super::base::Engine;

#[derive(Default)]
pub struct KinematicsEngineBase {
    pub base_id: String,
    pub end_effector_id: String,
    pub multiple_end_effector_ids: Vec<String>,
    pub sensor_ids: HashMap<SensorRole, String>,
    pub robot_combiner: Option<RobotCombiner>,
    pub robot_models: HashMap<String, Box<dyn ModelRobot>>,
    pub sensors: HashMap<String, SensorInfo>,
}

impl KinematicsEngineBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, model: Box<dyn ModelRobot>) {
        self.robot_models.insert(model.unique_id().to_string(), model);
    }

    pub fn add_sensor(&mut self, info: SensorInfo) {
        self.sensors.insert(info.unique_id().to_string(), info);
    }

    /// 设置焦点末端执行器；有多个候选时交给组合器裁决，否则取 id 最小的
    pub fn set_end_effector_robot(&mut self, task: &str, context: &Data) -> Status {
        let mut candidates: Vec<&String> = self
            .robot_models
            .iter()
            .filter(|(_, m)| m.role() == RobotRole::EndEffector)
            .map(|(id, _)| id)
            .collect();
        candidates.sort();

        let chosen = match (candidates.len(), &self.robot_combiner) {
            (0, _) => None,
            (1, _) | (_, None) => candidates.first().map(|id| id.to_string()),
            (_, Some(combiner)) => combiner.resolve_end_effector(&self.robot_models, task, context),
        };
        match chosen {
            Some(id) => {
                tracing::debug!("Kinematics: end effector for {} set to {}", task, id);
                self.end_effector_id = id;
                Status::success()
            }
            None => Status::failed(format!("no end effector robot available for task {task}")),
        }
    }

    pub fn free_end_effector_robot(&mut self) {
        self.end_effector_id.clear();
    }

    pub fn set_multiple_end_effector_robots(&mut self, task: &str, context: &Data) -> Status {
        let Some(combiner) = &self.robot_combiner else {
            return Status::failed("multiple end effectors require a robot combiner");
        };
        let ids = combiner.set_multiple_end_effector_robots(&self.robot_models, task, context);
        if ids.is_empty() {
            return Status::failed(format!("robot combiner resolved no end effectors for task {task}"));
        }
        self.multiple_end_effector_ids = ids;
        Status::success()
    }

    pub fn free_multiple_end_effector_robots(&mut self) {
        self.multiple_end_effector_ids.clear();
    }

    /// 设置某角色的焦点传感器；同角色多个时必须由组合器裁决
    pub fn set_sensor(&mut self, role: SensorRole, task: &str, context: &Data) -> Status {
        let candidates: Vec<&String> = self
            .sensors
            .iter()
            .filter(|(_, s)| s.sensor_type == role)
            .map(|(id, _)| id)
            .collect();
        let chosen = match (candidates.len(), &self.robot_combiner) {
            (0, _) => return Status::failed(format!("no sensor with role {role:?}")),
            (1, _) => Some(candidates[0].clone()),
            (_, Some(combiner)) => combiner.set_sensor(&self.sensors, role, task, context),
            (_, None) => {
                return Status::failed(format!(
                    "multiple {role:?} sensors but no robot combiner to resolve them"
                ))
            }
        };
        match chosen {
            Some(id) => {
                self.sensor_ids.insert(role, id);
                Status::success()
            }
            None => Status::failed(format!("could not resolve a {role:?} sensor for task {task}")),
        }
    }

    pub fn free_sensors(&mut self, role: SensorRole) {
        self.sensor_ids.remove(&role);
    }

    pub fn sensor_id(&self, role: SensorRole) -> Option<&str> {
        self.sensor_ids.get(&role).map(String::as_str)
    }

    /// 组合器注册的机器人走组合器，其余直接问模型
    pub fn get_task_transform(&self, robot_id: &str, task: &str) -> Option<Pose> {
        match &self.robot_combiner {
            Some(combiner) if combiner.contains(robot_id) => {
                combiner.get_task_transform(&self.robot_models, robot_id, task)
            }
            _ => self.robot_models.get(robot_id)?.get_task_transform(task),
        }
    }

    pub fn get_recognition_method(&self, robot_id: &str, task: &str) -> Option<String> {
        match &self.robot_combiner {
            Some(combiner) if combiner.contains(robot_id) => {
                combiner.get_recognition_method(&self.robot_models, robot_id, task)
            }
            _ => self.robot_models.get(robot_id)?.get_recognition_method(task),
        }
    }

    pub fn get_configuration_for_task(&self, robot_id: &str, task: &str) -> Option<Data> {
        match &self.robot_combiner {
            Some(combiner) if combiner.contains(robot_id) => {
                combiner.get_configuration_for_task(&self.robot_models, robot_id, task)
            }
            _ => self.robot_models.get(robot_id)?.get_configuration_for_task(task),
        }
    }

    pub fn get_link_transform(&self, robot_id: &str, link: &str) -> Option<Pose> {
        match &self.robot_combiner {
            Some(combiner) if combiner.contains(robot_id) => {
                combiner.get_link_transform(&self.robot_models, robot_id, link)
            }
            _ => self.robot_models.get(robot_id)?.get_link_transform(link),
        }
    }

    /// 对每个模型调用一次 destroy，然后清空全部字段；重复调用为空操作
    pub fn cleanup(&mut self) -> Status {
        let statuses: Vec<Status> = self
            .robot_models
            .values_mut()
            .map(|model| {
                let status = model.destroy();
                if !status.is_success() {
                    tracing::error!("Kinematics: failed to destroy model {}: {}", model.unique_id(), status);
                }
                status
            })
            .collect();
        *self = Self::default();
        Status::all_succeeded(statuses)
    }
}

#[async_trait]
pub trait KinematicsEngine: Engine {
    fn base(&self) -> &KinematicsEngineBase;

    fn base_mut(&mut self) -> &mut KinematicsEngineBase;

    /// 把目标级动作求解为控制器动作；current 为最新实际状态
    async fn solve(
        &mut self,
        actions: &CombinedRobotAction,
        current: &CombinedRobotState,
    ) -> (Status, CombinedRobotAction);
}
