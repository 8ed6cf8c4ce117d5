//! 控制器引擎：持有物理机器人/传感器会话，下发动作、刷新实际状态、急停

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::{CombinedRobotAction, CombinedRobotState, Data, Pose, SpawnComponent, Status};
use crate::robot::{PhysicalRobot, PhysicalSensor, RobotCombiner};

use super::base::Engine;

#[derive(Default)]
pub struct ControllerEngineBase {
    pub control_task: String,
    pub emergency_stop_request: bool,
    pub latest_robot_state: CombinedRobotState,
    pub robots: HashMap<String, Box<dyn PhysicalRobot>>,
    pub sensors: HashMap<String, Box<dyn PhysicalSensor>>,
    pub control_in_simulated_world: bool,
    /// 存在时，组合内机器人的状态经组合器合并
    pub robot_combiner: Option<RobotCombiner>,
}

impl ControllerEngineBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_robot(&mut self, robot: Box<dyn PhysicalRobot>) {
        self.robots.insert(robot.unique_id().to_string(), robot);
    }

    pub fn add_sensor(&mut self, sensor: Box<dyn PhysicalSensor>) {
        self.sensors.insert(sensor.info().unique_id().to_string(), sensor);
    }

    /// 断开所有机器人与传感器并清空集合
    pub async fn cleanup(&mut self) -> Status {
        let mut statuses = Vec::new();
        for (id, robot) in self.robots.iter_mut() {
            let status = robot.disconnect().await;
            if !status.is_success() {
                tracing::error!("Controller: failed to disconnect robot {}: {}", id, status);
            }
            statuses.push(status);
        }
        for (id, sensor) in self.sensors.iter_mut() {
            let status = sensor.disconnect().await;
            if !status.is_success() {
                tracing::error!("Controller: failed to disconnect sensor {}: {}", id, status);
            }
            statuses.push(status);
        }
        self.robots.clear();
        self.sensors.clear();
        Status::all_succeeded(statuses)
    }

    /// 对每个机器人调用一次急停；全部成功才算成功，否则返回第一个失败
    pub async fn emergency_stop(&mut self) -> Status {
        self.emergency_stop_request = true;
        let mut statuses = Vec::with_capacity(self.robots.len());
        for (id, robot) in self.robots.iter_mut() {
            let status = robot.emergency_stop().await;
            if !status.is_success() {
                tracing::error!("Controller: emergency stop failed on {}: {}", id, status);
            }
            statuses.push(status);
        }
        Status::all_succeeded(statuses)
    }

    /// 轮询每个机器人的最新状态写入缓存
    pub async fn refresh_latest_robot_states(&mut self) -> Status {
        let mut states = HashMap::with_capacity(self.robots.len());
        for (id, robot) in self.robots.iter_mut() {
            states.insert(id.clone(), robot.get_latest_state().await);
        }
        let status = Status::all_succeeded(states.values().map(|s| s.status.clone()).collect::<Vec<_>>());
        self.latest_robot_state = match &self.robot_combiner {
            Some(combiner) => {
                let (grouped, rest): (HashMap<_, _>, HashMap<_, _>) =
                    states.into_iter().partition(|(id, _)| combiner.contains(id));
                let mut merged = combiner.merge_states(grouped);
                merged.robot_states.extend(rest);
                merged
            }
            None => CombinedRobotState::new(states),
        };
        status
    }

    pub fn get_latest_robot_states(&self) -> &CombinedRobotState {
        &self.latest_robot_state
    }

    /// 按机器人顺序下发动作；目标机器人未知时失败
    pub async fn send_actions(&mut self, actions: &CombinedRobotAction) -> Status {
        self.control_task = actions.task.clone();
        for (robot_id, robot_actions) in &actions.actions {
            let Some(robot) = self.robots.get_mut(robot_id) else {
                return Status::failed(format!("unknown robot {robot_id}"));
            };
            for action in robot_actions {
                let status = robot.send_action(action).await;
                if !status.is_success() {
                    return status;
                }
            }
        }
        Status::success()
    }

    pub async fn get_physics_state(&mut self, sensor_id: &str, cmd: &str, extra: &Data) -> (Status, Data) {
        let Some(sensor) = self.sensors.get_mut(sensor_id) else {
            return (Status::failed(format!("unknown sensor {sensor_id}")), Data::new());
        };
        let role = sensor.info().sensor_type;
        if !role.is_physics() {
            return (
                Status::failed(format!("sensor {sensor_id} with role {role:?} has no physics state")),
                Data::new(),
            );
        }
        sensor.get_physics_state(cmd, extra).await
    }

    pub async fn get_scenery_state(&mut self, sensor_id: &str, cmd: &str, extra: &Data) -> (Status, Data) {
        let Some(sensor) = self.sensors.get_mut(sensor_id) else {
            return (Status::failed(format!("unknown sensor {sensor_id}")), Data::new());
        };
        let role = sensor.info().sensor_type;
        if !role.is_vision() {
            return (
                Status::failed(format!("sensor {sensor_id} with role {role:?} has no scenery state")),
                Data::new(),
            );
        }
        sensor.get_scenery_state(cmd, extra).await
    }

    /// 通过父机器人查询传感器挂载坐标系的变换
    pub async fn get_sensor_transform(&mut self, sensor_id: &str) -> (Status, Pose) {
        let Some(sensor) = self.sensors.get(sensor_id) else {
            return (Status::failed(format!("unknown sensor {sensor_id}")), Pose::default());
        };
        let parent_id = sensor.info().model.parent_id.clone();
        let frame = sensor.info().mount_frame().to_string();
        let Some(parent) = self.robots.get_mut(&parent_id) else {
            return (
                Status::failed(format!("parent robot {parent_id} of sensor {sensor_id} is unknown")),
                Pose::default(),
            );
        };
        parent.get_link_transform(&frame).await
    }
}

#[async_trait]
pub trait ControllerEngine: Engine {
    fn base(&self) -> &ControllerEngineBase;

    fn base_mut(&mut self) -> &mut ControllerEngineBase;

    async fn update_actual_robot_states(&mut self) -> Status {
        self.base_mut().refresh_latest_robot_states().await
    }

    async fn command(&mut self, actions: &CombinedRobotAction) -> Status {
        self.base_mut().send_actions(actions).await
    }

    async fn emergency_stop(&mut self) -> Status {
        self.base_mut().emergency_stop().await
    }

    /// 非仿真世界中为空操作；仿真世界中必须由实现覆盖
    async fn reset(&mut self) -> Status {
        if self.base().control_in_simulated_world {
            Status::not_supported_in_mode("ControllerEngine::reset must be provided when controlling a simulated world")
        } else {
            Status::success()
        }
    }

    async fn load_components(&mut self, _components: &[SpawnComponent]) -> Status {
        if self.base().control_in_simulated_world {
            Status::not_supported_in_mode(
                "ControllerEngine::load_components must be provided when controlling a simulated world",
            )
        } else {
            Status::success()
        }
    }
}
