//! 世界记录：一个控制周期的实际状态、期望动作与执行结果

use serde::{Deserialize, Serialize};

use super::status::Status;
use super::structs::{CombinedRobotAction, CombinedRobotState, Data, Pose};

/// 一个周期的快照，构造时深拷贝
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinedRobotStruct {
    pub actual_states: CombinedRobotState,
    pub desired_actions: CombinedRobotAction,
    pub status: Status,
}

impl CombinedRobotStruct {
    pub fn new(actual_states: &CombinedRobotState, desired_actions: &CombinedRobotAction, status: Status) -> Self {
        Self {
            actual_states: actual_states.clone(),
            desired_actions: desired_actions.clone(),
            status,
        }
    }
}

/// 世界构造引擎给出的待加载组件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnComponent {
    pub unique_id: String,
    pub model: String,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default)]
    pub properties: Data,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::structs::RobotState;
    use std::collections::HashMap;

    #[test]
    fn test_struct_is_deep_copy() {
        let mut states = CombinedRobotState::new(HashMap::from([(
            "arm".to_string(),
            RobotState::new(Pose::default()),
        )]));
        let record = CombinedRobotStruct::new(&states, &CombinedRobotAction::default(), Status::success());
        states.robot_states.clear();
        assert_eq!(record.actual_states.robot_states.len(), 1);
        assert!(record.status.is_success());
    }
}
