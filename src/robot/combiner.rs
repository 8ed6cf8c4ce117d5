//! 多机器人组合器
//!
//! 角色歧义（两个同角色相机、多个末端执行器）的唯一裁决点：给定任务名与上下文，
//! 按可替换的 ResolutionPolicy 选出胜者 id。组合器只保存机器人 id，模型与传感器
//! 由引擎持有，调用时以借用传入。

use std::collections::HashMap;

use crate::core::{CombinedRobotAction, CombinedRobotState, Data, Pose, RobotRole, RobotState, SensorRole};

use super::info::SensorInfo;
use super::model::ModelRobot;

/// 角色裁决策略
pub trait ResolutionPolicy: Send + Sync {
    /// 从候选末端执行器中选出参与任务的一组（有序）
    fn choose_end_effectors(&self, task: &str, context: &Data, candidates: &[String]) -> Vec<String>;

    /// 从同角色候选传感器中选出一个
    fn choose_sensor(&self, task: &str, context: &Data, role: SensorRole, candidates: &[String]) -> Option<String>;
}

/// 默认策略：上下文显式指定优先，否则按 id 排序
///
/// - 末端执行器：`context.end_effectors`（id 数组，按给定顺序），缺省时取全部候选
/// - 传感器：`context.sensor_id`，缺省时取排序后的第一个候选
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextPreferencePolicy;

impl ResolutionPolicy for ContextPreferencePolicy {
    fn choose_end_effectors(&self, _task: &str, context: &Data, candidates: &[String]) -> Vec<String> {
        match context.get("end_effectors").and_then(|v| v.as_array()) {
            Some(preferred) => preferred
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|id| candidates.iter().any(|c| c == id))
                .map(String::from)
                .collect(),
            None => {
                let mut all = candidates.to_vec();
                all.sort();
                all
            }
        }
    }

    fn choose_sensor(&self, _task: &str, context: &Data, _role: SensorRole, candidates: &[String]) -> Option<String> {
        if let Some(id) = context.get("sensor_id").and_then(|v| v.as_str()) {
            if candidates.iter().any(|c| c == id) {
                return Some(id.to_string());
            }
            tracing::warn!("RobotCombiner: preferred sensor {} is not a candidate", id);
        }
        candidates.iter().min().cloned()
    }
}

pub struct RobotCombiner {
    class_id: String,
    robot_ids: Vec<String>,
    policy: Box<dyn ResolutionPolicy>,
}

impl RobotCombiner {
    pub fn new(class_id: impl Into<String>, robot_ids: Vec<String>) -> Self {
        Self {
            class_id: class_id.into(),
            robot_ids,
            policy: Box::new(ContextPreferencePolicy),
        }
    }

    /// 替换默认的 ContextPreferencePolicy
    pub fn with_policy(mut self, policy: impl ResolutionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn robot_ids(&self) -> &[String] {
        &self.robot_ids
    }

    pub fn contains(&self, robot_id: &str) -> bool {
        self.robot_ids.iter().any(|id| id == robot_id)
    }

    fn end_effector_candidates(&self, models: &HashMap<String, Box<dyn ModelRobot>>) -> Vec<String> {
        self.robot_ids
            .iter()
            .filter(|id| {
                models
                    .get(id.as_str())
                    .map(|m| m.role() == RobotRole::EndEffector)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// 选出参与任务的末端执行器组
    pub fn set_multiple_end_effector_robots(
        &self,
        models: &HashMap<String, Box<dyn ModelRobot>>,
        task: &str,
        context: &Data,
    ) -> Vec<String> {
        let candidates = self.end_effector_candidates(models);
        self.policy.choose_end_effectors(task, context, &candidates)
    }

    /// 多个末端执行器时选出单个焦点
    pub fn resolve_end_effector(
        &self,
        models: &HashMap<String, Box<dyn ModelRobot>>,
        task: &str,
        context: &Data,
    ) -> Option<String> {
        self.set_multiple_end_effector_robots(models, task, context)
            .into_iter()
            .next()
    }

    pub fn set_sensor(
        &self,
        sensors: &HashMap<String, SensorInfo>,
        role: SensorRole,
        task: &str,
        context: &Data,
    ) -> Option<String> {
        let candidates: Vec<String> = sensors
            .values()
            .filter(|s| s.sensor_type == role)
            .map(|s| s.unique_id().to_string())
            .collect();
        if candidates.is_empty() {
            return None;
        }
        self.policy.choose_sensor(task, context, role, &candidates)
    }

    pub fn get_task_transform(
        &self,
        models: &HashMap<String, Box<dyn ModelRobot>>,
        robot_id: &str,
        task: &str,
    ) -> Option<Pose> {
        if !self.contains(robot_id) {
            return None;
        }
        models.get(robot_id)?.get_task_transform(task)
    }

    pub fn get_recognition_method(
        &self,
        models: &HashMap<String, Box<dyn ModelRobot>>,
        robot_id: &str,
        task: &str,
    ) -> Option<String> {
        if !self.contains(robot_id) {
            return None;
        }
        models.get(robot_id)?.get_recognition_method(task)
    }

    pub fn get_configuration_for_task(
        &self,
        models: &HashMap<String, Box<dyn ModelRobot>>,
        robot_id: &str,
        task: &str,
    ) -> Option<Data> {
        if !self.contains(robot_id) {
            return None;
        }
        models.get(robot_id)?.get_configuration_for_task(task)
    }

    pub fn get_link_transform(
        &self,
        models: &HashMap<String, Box<dyn ModelRobot>>,
        robot_id: &str,
        link: &str,
    ) -> Option<Pose> {
        if !self.contains(robot_id) {
            return None;
        }
        models.get(robot_id)?.get_link_transform(link)
    }

    /// 按机器人拆分组合动作，供宿主逐台分派；未注册机器人的动作被丢弃
    pub fn split_action(&self, action: &CombinedRobotAction) -> HashMap<String, CombinedRobotAction> {
        let mut split = HashMap::new();
        for (robot_id, actions) in &action.actions {
            if !self.contains(robot_id) {
                tracing::warn!(
                    "RobotCombiner {}: dropping actions for unregistered robot {}",
                    self.class_id,
                    robot_id
                );
                continue;
            }
            split.insert(
                robot_id.clone(),
                CombinedRobotAction::new(
                    action.task.clone(),
                    HashMap::from([(robot_id.clone(), actions.clone())]),
                ),
            );
        }
        split
    }

    /// 合并各机器人状态；键与已注册机器人一致，缺失的填 UNKNOWN
    pub fn merge_states(&self, mut states: HashMap<String, RobotState>) -> CombinedRobotState {
        let robot_states = self
            .robot_ids
            .iter()
            .map(|id| {
                let state = states.remove(id).unwrap_or_else(RobotState::unknown);
                (id.clone(), state)
            })
            .collect();
        for extra in states.keys() {
            tracing::debug!("RobotCombiner {}: ignoring state of unregistered robot {}", self.class_id, extra);
        }
        CombinedRobotState::new(robot_states)
    }
}

impl std::fmt::Debug for RobotCombiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotCombiner")
            .field("class_id", &self.class_id)
            .field("robot_ids", &self.robot_ids)
            .finish()
    }
}
