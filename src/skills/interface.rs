//! 技能门面：按名称从技能库解析技能，驱动其完整生命周期，并负责清理

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::SkillsSection;
use crate::core::{Blackboard, Data, Status, StatusFlag};
use crate::engine::EngineInterface;

use super::base::{Observation, Skill, SkillPhase};
use super::library::SkillLibrary;
use super::registry::SkillRegistry;

/// 一轮运行的停止令牌；stop 是 emergency 的子 token，急停同时触发普通停止
#[derive(Debug, Clone)]
struct AbortTokens {
    emergency: CancellationToken,
    stop: CancellationToken,
}

impl AbortTokens {
    fn issue() -> Self {
        let emergency = CancellationToken::new();
        let stop = emergency.child_token();
        Self { emergency, stop }
    }
}

/// 可跨任务克隆的停止请求句柄
///
/// 所有克隆共享同一个 watch 通道；`clear` 换发新令牌，之前的请求随之失效。
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tokens: Arc<watch::Sender<AbortTokens>>,
}

impl AbortHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AbortTokens::issue());
        Self { tokens: Arc::new(tx) }
    }

    fn current(&self) -> AbortTokens {
        self.tokens.borrow().clone()
    }

    /// 普通停止：只打断可中断技能，其余在下一个叶子节点前生效
    pub fn request_stop(&self) {
        self.current().stop.cancel();
    }

    /// 急停：总是打断当前技能并对控制器急停
    pub fn request_emergency_stop(&self) {
        self.current().emergency.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.current().stop.is_cancelled()
    }

    pub fn is_emergency(&self) -> bool {
        self.current().emergency.is_cancelled()
    }

    /// 当前这一轮的停止令牌，供宿主 `select!` 等待
    pub fn stop_token(&self) -> CancellationToken {
        self.current().stop
    }

    pub fn clear(&self) {
        self.tokens.send_replace(AbortTokens::issue());
    }
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SkillInterface {
    registry: SkillRegistry,
    general: Data,
    library: SkillLibrary,
    active_skill: Option<Box<dyn Skill>>,
    phase: Option<SkillPhase>,
    /// 0 表示不限
    max_action_steps: usize,
    abort: AbortHandle,
}

impl SkillInterface {
    pub fn new(registry: SkillRegistry) -> Self {
        Self {
            registry,
            general: Data::new(),
            library: SkillLibrary::new(),
            active_skill: None,
            phase: None,
            max_action_steps: 0,
            abort: AbortHandle::new(),
        }
    }

    /// 按应用配置 [skills] 段构造
    pub fn from_config(registry: SkillRegistry, config: &SkillsSection) -> Self {
        Self::new(registry).with_max_action_steps(config.max_action_steps)
    }

    pub fn with_max_action_steps(mut self, n: usize) -> Self {
        self.max_action_steps = n;
        self
    }

    pub fn max_action_steps(&self) -> usize {
        self.max_action_steps
    }

    pub fn init(&mut self, general: &Data, library: SkillLibrary) -> Status {
        if library.is_empty() {
            return Status::failed("library list cannot be empty");
        }
        tracing::info!("Loaded {} skills", library.len());
        self.general = general.clone();
        self.library = library;
        Status::success()
    }

    pub fn library(&self) -> &SkillLibrary {
        &self.library
    }

    pub fn general_config(&self) -> &Data {
        &self.general
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn abort_requested(&self) -> bool {
        self.abort.is_requested()
    }

    /// 当前（或最近一次）技能所处阶段
    pub fn phase(&self) -> Option<SkillPhase> {
        self.phase
    }

    /// 解析 → 解码 → 构造 → init → 动作循环 → on_finish
    pub async fn run_skill(
        &mut self,
        skill_name: &str,
        node: &Data,
        board: &mut Blackboard,
        engines: &mut EngineInterface,
    ) -> Status {
        let span = tracing::info_span!("skill", name = %skill_name);
        self.run_skill_inner(skill_name, node, board, engines).instrument(span).await
    }

    async fn run_skill_inner(
        &mut self,
        skill_name: &str,
        node: &Data,
        board: &mut Blackboard,
        engines: &mut EngineInterface,
    ) -> Status {
        let Some(record) = self.library.get(skill_name).cloned() else {
            return Status::failed(format!("skill {skill_name} not found in library"));
        };

        let mut decoder = match self.registry.create_decoder(&record.decoder) {
            Ok(decoder) => decoder,
            Err(e) => return e.into(),
        };
        let status = decoder.decode(node, board);
        if !status.is_success() {
            return status;
        }
        let status = decoder.fill_runtime_parameters(engines).await;
        if !status.is_success() {
            return status;
        }
        let params = decoder.as_config();

        let skill = match self.registry.create_skill(&record.src, &record.src_configs) {
            Ok(skill) => skill,
            Err(e) => return e.into(),
        };
        self.phase = Some(SkillPhase::Constructed);
        let skill = self.active_skill.insert(skill);

        let status = skill.init(engines, &params).await;
        if !status.is_success() {
            return status;
        }
        self.phase = Some(SkillPhase::Initiated);

        if let Some(action) = skill.any_initiation_action(engines).await {
            let status = engines.execute_action(&action).await;
            if !status.is_success() {
                return status;
            }
        }
        let status = skill.any_post_initiation(engines).await;
        if !status.is_success() {
            return status;
        }

        self.phase = Some(SkillPhase::Acting);
        let mut steps = 0usize;
        loop {
            if self.abort.is_emergency() {
                let stop = engines.emergency_stop().await;
                if !stop.is_success() {
                    tracing::error!("Emergency stop during {} failed: {}", skill_name, stop);
                }
                return Status::with_message(StatusFlag::Aborted, format!("skill {skill_name} emergency stopped"));
            }
            if self.abort.is_requested() && skill.profile().interruptible_skill {
                return Status::with_message(StatusFlag::Aborted, format!("skill {skill_name} interrupted"));
            }

            steps += 1;
            if self.max_action_steps > 0 && steps > self.max_action_steps {
                return Status::failed(format!(
                    "skill {skill_name} exceeded {} action steps",
                    self.max_action_steps
                ));
            }

            let robot_states = if engines.controller().is_some() {
                let status = engines.update_actual_robot_states().await;
                if !status.is_success() {
                    return status;
                }
                engines.latest_robot_states().cloned()
            } else {
                None
            };
            let observation = Observation {
                robot_states,
                task_states: Data::new(),
            };
            let observation = skill.append_task_specific_states(observation, engines);

            let action = skill.get_action(&observation).await;
            match skill.get_terminal(&observation, &action) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => return e.into(),
            }
            let formatted = skill.format_action(&action);
            let status = engines.execute_action(&formatted).await;
            if !status.is_success() {
                return status;
            }
            tracing::debug!("Skill {} step {} done", skill_name, steps);
        }

        self.phase = Some(SkillPhase::Terminal);
        let status = skill.on_finish(engines, board).await;
        self.phase = Some(SkillPhase::Finished);
        tracing::info!("Skill {} finished after {} steps: {}", skill_name, steps, status);
        status
    }

    /// 释放当前技能并清除停止请求；可重复调用
    pub fn cleanup(&mut self) {
        if self.active_skill.take().is_some() {
            tracing::debug!("SkillInterface: released active skill");
        }
        self.phase = None;
        self.abort.clear();
    }

    pub fn has_active_skill(&self) -> bool {
        self.active_skill.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CombinedRobotAction, StatusReason};
    use crate::engine::EngineRegistry;
    use crate::skills::base::SkillProfile;
    use crate::skills::library::SkillRecord;
    use crate::skills::registry::GENERIC_DECODER;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 第 n 次 get_action 报告 terminate
    struct CountdownSkill {
        profile: SkillProfile,
        finish_after: usize,
        actions: Arc<AtomicUsize>,
        on_step: Option<AbortHandle>,
    }

    #[async_trait]
    impl Skill for CountdownSkill {
        fn profile(&self) -> &SkillProfile {
            &self.profile
        }

        async fn init(&mut self, _engines: &mut EngineInterface, params: &Data) -> Status {
            if params.get("fail_init").and_then(|v| v.as_bool()) == Some(true) {
                return Status::failed("init refused");
            }
            Status::success()
        }

        async fn get_action(&mut self, _observation: &Observation) -> Data {
            let n = self.actions.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(handle) = &self.on_step {
                handle.request_stop();
            }
            let mut action = Data::new();
            if self.profile.configs.get("omit_terminate").is_none() {
                action.insert("terminate".into(), json!(n >= self.finish_after));
            }
            action
        }

        fn format_action(&self, _action: &Data) -> CombinedRobotAction {
            CombinedRobotAction::default()
        }

        async fn on_finish(&mut self, _engines: &mut EngineInterface, board: &mut Blackboard) -> Status {
            board.set_board_variable("finished", true);
            Status::success()
        }
    }

    fn library() -> SkillLibrary {
        let mut library = SkillLibrary::new();
        library.insert(
            "countdown",
            SkillRecord {
                decoder: GENERIC_DECODER.to_string(),
                src: "test.countdown".to_string(),
                src_configs: Data::new(),
            },
        );
        library.insert(
            "sticky",
            SkillRecord {
                decoder: GENERIC_DECODER.to_string(),
                src: "test.countdown".to_string(),
                src_configs: json!({"interruptible": false}).as_object().cloned().unwrap_or_default(),
            },
        );
        library.insert(
            "broken",
            SkillRecord {
                decoder: GENERIC_DECODER.to_string(),
                src: "test.countdown".to_string(),
                src_configs: json!({"omit_terminate": true}).as_object().cloned().unwrap_or_default(),
            },
        );
        library
    }

    fn interface(actions: &Arc<AtomicUsize>, finish_after: usize, stop_on_step: bool) -> SkillInterface {
        interface_with(actions, finish_after, stop_on_step, &SkillsSection::default())
    }

    fn interface_with(
        actions: &Arc<AtomicUsize>,
        finish_after: usize,
        stop_on_step: bool,
        section: &SkillsSection,
    ) -> SkillInterface {
        let mut registry = SkillRegistry::new();
        let counter = actions.clone();
        let abort_slot: Arc<std::sync::Mutex<Option<AbortHandle>>> = Arc::default();
        let slot = abort_slot.clone();
        registry.register_skill("test.countdown", move |configs| {
            let on_step = if stop_on_step {
                slot.lock().ok().and_then(|s| s.clone())
            } else {
                None
            };
            Box::new(CountdownSkill {
                profile: SkillProfile::from_configs(configs, false),
                finish_after,
                actions: counter.clone(),
                on_step,
            })
        });
        let mut skills = SkillInterface::from_config(registry, section);
        if let Ok(mut slot) = abort_slot.lock() {
            *slot = Some(skills.abort_handle());
        }
        assert!(skills.init(&Data::new(), library()).is_success());
        skills
    }

    fn node(value: serde_json::Value) -> Data {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_abort_handle_clones_share_requests() {
        let handle = AbortHandle::new();
        let remote = handle.clone();
        let token = handle.stop_token();

        remote.request_stop();
        assert!(handle.is_requested());
        assert!(!handle.is_emergency());
        token.cancelled().await;

        handle.clear();
        assert!(!remote.is_requested());
        assert!(!handle.stop_token().is_cancelled());

        remote.request_emergency_stop();
        assert!(handle.is_emergency());
        assert!(handle.is_requested());
    }

    #[test]
    fn test_init_rejects_empty_library() {
        let mut skills = SkillInterface::new(SkillRegistry::new());
        let status = skills.init(&Data::new(), SkillLibrary::new());
        assert_eq!(status.flag(), StatusFlag::Failed);
        assert_eq!(status.message(), "library list cannot be empty");
    }

    #[tokio::test]
    async fn test_run_skill_until_terminal() {
        let actions = Arc::new(AtomicUsize::new(0));
        let mut skills = interface(&actions, 3, false);
        let mut board = Blackboard::new();
        let mut engines = EngineInterface::new(EngineRegistry::new());

        let status = skills
            .run_skill("countdown", &node(json!({"@skill": "countdown"})), &mut board, &mut engines)
            .await;
        assert!(status.is_success());
        assert_eq!(actions.load(Ordering::SeqCst), 3);
        assert_eq!(board.get_board_variable("finished"), Some(&json!(true)));
        assert_eq!(skills.phase(), Some(SkillPhase::Finished));

        skills.cleanup();
        assert!(!skills.has_active_skill());
        skills.cleanup();
    }

    #[tokio::test]
    async fn test_unknown_skill_and_init_failure() {
        let actions = Arc::new(AtomicUsize::new(0));
        let mut skills = interface(&actions, 1, false);
        let mut board = Blackboard::new();
        let mut engines = EngineInterface::new(EngineRegistry::new());

        let status = skills.run_skill("ghost", &Data::new(), &mut board, &mut engines).await;
        assert_eq!(status.flag(), StatusFlag::Failed);
        assert!(status.message().contains("ghost"));

        let status = skills
            .run_skill("countdown", &node(json!({"@fail_init": true})), &mut board, &mut engines)
            .await;
        assert_eq!(status.message(), "init refused");
        assert_eq!(actions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_terminate_is_configuration_error() {
        let actions = Arc::new(AtomicUsize::new(0));
        let mut skills = interface(&actions, 1, false);
        let mut board = Blackboard::new();
        let mut engines = EngineInterface::new(EngineRegistry::new());

        let status = skills.run_skill("broken", &Data::new(), &mut board, &mut engines).await;
        assert_eq!(status.flag(), StatusFlag::Failed);
        assert_eq!(status.reason(), StatusReason::ConfigurationError);
    }

    #[tokio::test]
    async fn test_step_guard() {
        let actions = Arc::new(AtomicUsize::new(0));
        let section = SkillsSection { max_action_steps: 5 };
        let mut skills = interface_with(&actions, 100, false, &section);
        assert_eq!(skills.max_action_steps(), 5);
        let mut board = Blackboard::new();
        let mut engines = EngineInterface::new(EngineRegistry::new());

        let status = skills.run_skill("countdown", &Data::new(), &mut board, &mut engines).await;
        assert_eq!(status.flag(), StatusFlag::Failed);
        assert!(status.message().contains("5 action steps"));
        assert_eq!(actions.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_stop_request_interrupts_only_interruptible_skills() {
        let actions = Arc::new(AtomicUsize::new(0));
        let mut skills = interface(&actions, 3, true);
        let mut board = Blackboard::new();
        let mut engines = EngineInterface::new(EngineRegistry::new());

        let status = skills.run_skill("countdown", &Data::new(), &mut board, &mut engines).await;
        assert_eq!(status.flag(), StatusFlag::Aborted);
        assert_eq!(actions.load(Ordering::SeqCst), 1);
        assert!(skills.abort_requested());

        skills.cleanup();
        assert!(!skills.abort_requested());

        actions.store(0, Ordering::SeqCst);
        let status = skills.run_skill("sticky", &Data::new(), &mut board, &mut engines).await;
        assert!(status.is_success());
        assert_eq!(actions.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_emergency_request_always_aborts() {
        let actions = Arc::new(AtomicUsize::new(0));
        let mut skills = interface(&actions, 3, false);
        let mut board = Blackboard::new();
        let mut engines = EngineInterface::new(EngineRegistry::new());

        skills.abort_handle().request_emergency_stop();
        let status = skills.run_skill("sticky", &Data::new(), &mut board, &mut engines).await;
        assert_eq!(status.flag(), StatusFlag::Aborted);
        assert_eq!(actions.load(Ordering::SeqCst), 0);
    }
}
