//! 技能抽象：一个可执行的行为单元
//!
//! 生命周期：CONSTRUCTED → INITIATED → ACTING（反复 get_action / format_action）
//! → TERMINAL（get_terminal 为 true）→ FINISHED。实例用完即弃，不复用。

use async_trait::async_trait;

use crate::core::{Blackboard, CombinedRobotAction, CombinedRobotState, Data, Status, TasqError};
use crate::engine::EngineInterface;

/// 技能阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillPhase {
    Constructed,
    Initiated,
    Acting,
    Terminal,
    Finished,
}

/// 技能的静态属性
#[derive(Debug, Clone, Default)]
pub struct SkillProfile {
    pub configs: Data,
    /// 决策器提示：运行中途可以安全打断
    pub interruptible_skill: bool,
    /// 动作由学习模型产生；为 false 时动作中必须带 terminate 字段
    pub learned_actions: bool,
}

impl SkillProfile {
    /// interruptible 取自 configs["interruptible"]，缺省为 true
    pub fn from_configs(configs: &Data, learned_actions: bool) -> Self {
        let interruptible_skill = configs
            .get("interruptible")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        Self {
            configs: configs.clone(),
            interruptible_skill,
            learned_actions,
        }
    }
}

/// 每步提供给技能的观测
#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub robot_states: Option<CombinedRobotState>,
    pub task_states: Data,
}

#[async_trait]
pub trait Skill: Send + Sync {
    fn profile(&self) -> &SkillProfile;

    /// params 为解码后的节点参数
    async fn init(&mut self, engines: &mut EngineInterface, params: &Data) -> Status;

    /// 进入动作循环前的一次性动作（如移动到初始姿态）
    async fn any_initiation_action(&mut self, _engines: &EngineInterface) -> Option<CombinedRobotAction> {
        None
    }

    async fn any_post_initiation(&mut self, _engines: &mut EngineInterface) -> Status {
        Status::success()
    }

    fn append_task_specific_states(&self, observation: Observation, _engines: &EngineInterface) -> Observation {
        observation
    }

    async fn get_action(&mut self, observation: &Observation) -> Data;

    /// 手动技能读取动作中的 terminate 字段；学习型技能必须覆盖
    fn get_terminal(&self, _observation: &Observation, action: &Data) -> Result<bool, TasqError> {
        if self.profile().learned_actions {
            return Err(TasqError::TerminationUndefined(
                "skills with learned actions must override get_terminal".to_string(),
            ));
        }
        action
            .get("terminate")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| {
                TasqError::TerminationUndefined(
                    "manual skills must report a boolean 'terminate' field in every action".to_string(),
                )
            })
    }

    fn format_action(&self, action: &Data) -> CombinedRobotAction;

    async fn on_finish(&mut self, _engines: &mut EngineInterface, _board: &mut Blackboard) -> Status {
        Status::success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubSkill {
        profile: SkillProfile,
    }

    #[async_trait]
    impl Skill for StubSkill {
        fn profile(&self) -> &SkillProfile {
            &self.profile
        }

        async fn init(&mut self, _engines: &mut EngineInterface, _params: &Data) -> Status {
            Status::success()
        }

        async fn get_action(&mut self, _observation: &Observation) -> Data {
            Data::new()
        }

        fn format_action(&self, _action: &Data) -> CombinedRobotAction {
            CombinedRobotAction::default()
        }
    }

    fn data(value: serde_json::Value) -> Data {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_profile_interruptible_default() {
        assert!(SkillProfile::from_configs(&Data::new(), false).interruptible_skill);
        let profile = SkillProfile::from_configs(&data(json!({"interruptible": false})), true);
        assert!(!profile.interruptible_skill);
        assert!(profile.learned_actions);
    }

    #[test]
    fn test_manual_terminal_reads_terminate_field() {
        let skill = StubSkill {
            profile: SkillProfile::from_configs(&Data::new(), false),
        };
        let obs = Observation::default();
        assert!(skill.get_terminal(&obs, &data(json!({"terminate": true}))).unwrap());
        assert!(!skill.get_terminal(&obs, &data(json!({"terminate": false}))).unwrap());
        assert!(matches!(
            skill.get_terminal(&obs, &Data::new()),
            Err(TasqError::TerminationUndefined(_))
        ));
    }

    #[test]
    fn test_learned_terminal_must_be_overridden() {
        let skill = StubSkill {
            profile: SkillProfile::from_configs(&Data::new(), true),
        };
        let result = skill.get_terminal(&Observation::default(), &data(json!({"terminate": true})));
        assert!(matches!(result, Err(TasqError::TerminationUndefined(_))));
    }
}
