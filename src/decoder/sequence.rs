//! 行为树解释器
//!
//! 按单键映射 `{<Type>: body}` 递归遍历 `root.BehaviorTree.Tree`，支持：
//! - `Sequence`：依次执行，遇到第一个非成功结果立即返回（SKIPPED 视为通过）
//! - `Fallback`：依次执行，只有 FAILED 会尝试下一个；全部失败返回最后一个失败
//! - `Action`：通过 SkillInterface 运行 `@skill` 指定的技能
//!
//! 其它类型（包括 `Parallel`）一律返回 UNEXPECTED。
//!
//! 每个节点按子节点下标组成路径 id。`start_from_node_id` 之前的节点直接 SKIPPED，
//! 到达 `escape_at_node_id` 时返回 ESCAPED；日志字段在尝试节点前更新，
//! 失败后可把 `last_executed_node_id()` 作为下次的 `start_from_node_id`。

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::Instrument;

use crate::core::{Blackboard, Data, Status, StatusFlag};
use crate::engine::EngineInterface;
use crate::skills::SkillInterface;

use super::network::{NetworkClient, NodeFeedback};
use super::tree::{children, node_name, split_node, tree_list, ACTION, FALLBACK, SEQUENCE};

/// 一次树运行期间借用的协作者
pub struct RunContext<'a> {
    pub board: &'a mut Blackboard,
    pub skills: &'a mut SkillInterface,
    pub engines: &'a mut EngineInterface,
}

#[derive(Default)]
pub struct TaskSequenceDecoder {
    start_from_node_id: Vec<usize>,
    escape_at_node_id: Vec<usize>,
    log_last_executed_node_name: String,
    log_last_executed_node_id: Vec<usize>,
    run_id: String,
    network_client: Option<Arc<dyn NetworkClient>>,
}

impl TaskSequenceDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network_client(mut self, client: Arc<dyn NetworkClient>) -> Self {
        self.network_client = Some(client);
        self
    }

    pub fn last_executed_node_name(&self) -> &str {
        &self.log_last_executed_node_name
    }

    pub fn last_executed_node_id(&self) -> &[usize] {
        &self.log_last_executed_node_id
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// 运行整棵树；无论结果如何都会调用一次 `skills.cleanup()`
    pub async fn run_tree(
        &mut self,
        bt: &Value,
        board: &mut Blackboard,
        skills: &mut SkillInterface,
        engines: &mut EngineInterface,
        start_from_node_id: &[usize],
        escape_at_node_id: &[usize],
    ) -> Status {
        self.log_last_executed_node_name.clear();
        self.log_last_executed_node_id.clear();
        self.start_from_node_id = start_from_node_id.to_vec();
        self.escape_at_node_id = escape_at_node_id.to_vec();
        self.run_id = uuid::Uuid::new_v4().to_string();

        let span = tracing::info_span!("run_tree", run_id = %self.run_id);
        let status = async {
            tracing::info!(
                "Running tree (start_from={:?}, escape_at={:?})",
                self.start_from_node_id,
                self.escape_at_node_id
            );
            let Some(list) = tree_list(bt) else {
                return Status::unexpected("behavior tree must contain root.BehaviorTree.Tree as a list");
            };
            let nodes: Vec<&Value> = list.iter().collect();
            let mut ctx = RunContext {
                board: &mut *board,
                skills: &mut *skills,
                engines: &mut *engines,
            };
            self.run_sequence(nodes, &mut ctx, Vec::new()).await
        }
        .instrument(span)
        .await;

        skills.cleanup();
        tracing::info!(
            "Tree finished with {} at node {:?} '{}'",
            status,
            self.log_last_executed_node_id,
            self.log_last_executed_node_name
        );
        status
    }

    /// 解析并执行单个节点
    pub fn parse_control<'a, 'b: 'a>(
        &'a mut self,
        node: &'a Value,
        ctx: &'a mut RunContext<'b>,
        node_id: Vec<usize>,
    ) -> BoxFuture<'a, Status> {
        async move {
            if self.should_skip(&node_id) {
                tracing::debug!("Skipping node {:?}", node_id);
                return Status::new(StatusFlag::Skipped);
            }
            let Some((kind, body)) = split_node(node) else {
                return Status::unexpected(format!("node {node_id:?} must be a single-key mapping"));
            };

            self.log_last_executed_node_name = node_name(body).to_string();
            self.log_last_executed_node_id = node_id.clone();
            if !self.escape_at_node_id.is_empty() && node_id == self.escape_at_node_id {
                tracing::info!("Escaping at node {:?}", node_id);
                return Status::with_message(StatusFlag::Escaped, format!("escaped at node {node_id:?}"));
            }

            match kind {
                SEQUENCE => self.run_sequence(children(body), ctx, node_id).await,
                FALLBACK => self.run_fallback(children(body), ctx, node_id).await,
                ACTION => self.run_action(body, ctx, node_id).await,
                other => {
                    tracing::warn!("Unsupported node type {} at {:?}", other, node_id);
                    Status::unexpected(format!("unsupported node type {other}"))
                }
            }
        }
        .boxed()
    }

    /// SUCCESS / SKIPPED 继续，其它结果原样返回；空序列为 SUCCESS
    pub async fn run_sequence<'b>(
        &mut self,
        nodes: Vec<&Value>,
        ctx: &mut RunContext<'b>,
        node_id: Vec<usize>,
    ) -> Status {
        for (i, child) in nodes.into_iter().enumerate() {
            let mut child_id = node_id.clone();
            child_id.push(i);
            let status = self.parse_control(child, ctx, child_id).await;
            match status.flag() {
                StatusFlag::Success | StatusFlag::Skipped => continue,
                _ => return status,
            }
        }
        Status::success()
    }

    /// 只有 FAILED 会尝试下一个；全部跳过为 SKIPPED，没有子节点为 FAILED
    pub async fn run_fallback<'b>(
        &mut self,
        nodes: Vec<&Value>,
        ctx: &mut RunContext<'b>,
        node_id: Vec<usize>,
    ) -> Status {
        if nodes.is_empty() {
            return Status::failed("fallback has no child to run");
        }
        let mut last_failure = None;
        for (i, child) in nodes.into_iter().enumerate() {
            let mut child_id = node_id.clone();
            child_id.push(i);
            let status = self.parse_control(child, ctx, child_id).await;
            match status.flag() {
                StatusFlag::Failed => last_failure = Some(status),
                StatusFlag::Skipped => continue,
                _ => return status,
            }
        }
        last_failure.unwrap_or_else(|| Status::new(StatusFlag::Skipped))
    }

    async fn run_action<'b>(&mut self, body: &Value, ctx: &mut RunContext<'b>, node_id: Vec<usize>) -> Status {
        let Some(params) = body.as_object() else {
            return Status::unexpected(format!("action node {node_id:?} must be a mapping"));
        };
        let Some(skill) = params.get("@skill").and_then(|v| v.as_str()) else {
            return Status::unexpected(format!("action node {node_id:?} has no @skill"));
        };
        let abort = ctx.skills.abort_handle();
        if abort.is_emergency() {
            let stop = ctx.engines.emergency_stop().await;
            if !stop.is_success() {
                tracing::error!("Emergency stop before node {:?} failed: {}", node_id, stop);
            }
            return Status::with_message(StatusFlag::Aborted, format!("emergency stop before node {node_id:?}"));
        }
        if abort.is_requested() {
            return Status::with_message(StatusFlag::Aborted, format!("stop requested before node {node_id:?}"));
        }

        tracing::debug!("Running skill {} at {:?}", skill, node_id);
        let params: Data = params.clone();
        let status = ctx.skills.run_skill(skill, &params, ctx.board, ctx.engines).await;
        if !status.is_success() {
            tracing::warn!("Skill {} at {:?} returned {}", skill, node_id, status);
        }
        self.send_feedback(node_id, &status).await;
        status
    }

    async fn send_feedback(&self, node_id: Vec<usize>, status: &Status) {
        let Some(client) = &self.network_client else {
            return;
        };
        let feedback = NodeFeedback {
            run_id: self.run_id.clone(),
            node_name: self.log_last_executed_node_name.clone(),
            node_id,
            status: status.clone(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        };
        let sent = client.send_feedback(&feedback).await;
        if !sent.is_success() {
            tracing::warn!("Failed to send node feedback: {}", sent);
        }
    }

    /// start_from 非空、id 在其之前、且 start_from 不以 id 为前缀时跳过
    fn should_skip(&self, node_id: &[usize]) -> bool {
        let start = &self.start_from_node_id;
        !start.is_empty() && node_id < start.as_slice() && !start.starts_with(node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CombinedRobotAction;
    use crate::engine::EngineRegistry;
    use crate::skills::{Observation, Skill, SkillLibrary, SkillProfile, SkillRecord, SkillRegistry, GENERIC_DECODER};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// 按 `@result` 参数返回结果，并记录执行顺序
    struct ScriptedSkill {
        profile: SkillProfile,
        label: String,
        result: String,
        trace: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Skill for ScriptedSkill {
        fn profile(&self) -> &SkillProfile {
            &self.profile
        }

        async fn init(&mut self, _engines: &mut EngineInterface, params: &Data) -> Status {
            self.label = params.get("name").and_then(|v| v.as_str()).unwrap_or("").to_string();
            self.result = params.get("result").and_then(|v| v.as_str()).unwrap_or("ok").to_string();
            if let Ok(mut trace) = self.trace.lock() {
                trace.push(self.label.clone());
            }
            match self.result.as_str() {
                "fail" => Status::failed(format!("{} failed", self.label)),
                "abort" => Status::with_message(StatusFlag::Aborted, "stopped"),
                _ => Status::success(),
            }
        }

        async fn get_action(&mut self, _observation: &Observation) -> Data {
            json!({"terminate": true}).as_object().cloned().unwrap_or_default()
        }

        fn format_action(&self, _action: &Data) -> CombinedRobotAction {
            CombinedRobotAction::default()
        }
    }

    struct Harness {
        board: Blackboard,
        skills: SkillInterface,
        engines: EngineInterface,
        trace: Arc<Mutex<Vec<String>>>,
    }

    impl Harness {
        fn new() -> Self {
            let trace: Arc<Mutex<Vec<String>>> = Arc::default();
            let mut registry = SkillRegistry::new();
            let t = trace.clone();
            registry.register_skill("test.scripted", move |configs| {
                Box::new(ScriptedSkill {
                    profile: SkillProfile::from_configs(configs, false),
                    label: String::new(),
                    result: String::new(),
                    trace: t.clone(),
                })
            });
            let mut library = SkillLibrary::new();
            library.insert(
                "step",
                SkillRecord {
                    decoder: GENERIC_DECODER.to_string(),
                    src: "test.scripted".to_string(),
                    src_configs: Data::new(),
                },
            );
            let mut skills = SkillInterface::new(registry);
            assert!(skills.init(&Data::new(), library).is_success());
            Self {
                board: Blackboard::new(),
                skills,
                engines: EngineInterface::new(EngineRegistry::new()),
                trace,
            }
        }

        async fn run(&mut self, decoder: &mut TaskSequenceDecoder, bt: &Value, start: &[usize], escape: &[usize]) -> Status {
            decoder
                .run_tree(bt, &mut self.board, &mut self.skills, &mut self.engines, start, escape)
                .await
        }

        fn trace(&self) -> Vec<String> {
            self.trace.lock().map(|t| t.clone()).unwrap_or_default()
        }
    }

    fn action(name: &str, result: &str) -> Value {
        json!({"Action": {"@name": name, "@skill": "step", "@result": result}})
    }

    fn tree(nodes: Vec<Value>) -> Value {
        json!({"root": {"BehaviorTree": {"Tree": nodes}}})
    }

    #[tokio::test]
    async fn test_sequence_runs_in_order() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        let bt = tree(vec![json!({"Sequence": {"@name": "main", "child": [
            action("a", "ok"), action("b", "ok"), action("c", "ok")
        ]}})]);
        let status = h.run(&mut decoder, &bt, &[], &[]).await;
        assert!(status.is_success());
        assert_eq!(h.trace(), vec!["a", "b", "c"]);
        assert_eq!(decoder.last_executed_node_name(), "c");
        assert_eq!(decoder.last_executed_node_id(), &[0, 2]);
        assert!(!decoder.run_id().is_empty());
    }

    #[tokio::test]
    async fn test_sequence_stops_on_failure() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        let bt = tree(vec![json!({"Sequence": {"child": [
            action("a", "ok"), action("b", "fail"), action("c", "ok")
        ]}})]);
        let status = h.run(&mut decoder, &bt, &[], &[]).await;
        assert_eq!(status.flag(), StatusFlag::Failed);
        assert_eq!(status.message(), "b failed");
        assert_eq!(h.trace(), vec!["a", "b"]);
        assert_eq!(decoder.last_executed_node_id(), &[0, 1]);
    }

    #[tokio::test]
    async fn test_fallback_semantics() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        let bt = tree(vec![json!({"Fallback": {"child": [
            action("a", "fail"), action("b", "ok"), action("c", "ok")
        ]}})]);
        assert!(h.run(&mut decoder, &bt, &[], &[]).await.is_success());
        assert_eq!(h.trace(), vec!["a", "b"]);

        let mut h = Harness::new();
        let bt = tree(vec![json!({"Fallback": {"child": [action("a", "fail"), action("b", "fail")]}})]);
        let status = h.run(&mut decoder, &bt, &[], &[]).await;
        assert_eq!(status.message(), "b failed");

        let mut h = Harness::new();
        let bt = tree(vec![json!({"Fallback": {"child": [action("a", "abort"), action("b", "ok")]}})]);
        let status = h.run(&mut decoder, &bt, &[], &[]).await;
        assert_eq!(status.flag(), StatusFlag::Aborted);
        assert_eq!(h.trace(), vec!["a"]);

        let mut h = Harness::new();
        let bt = tree(vec![json!({"Fallback": {"child": []}})]);
        let status = h.run(&mut decoder, &bt, &[], &[]).await;
        assert_eq!(status.flag(), StatusFlag::Failed);
    }

    #[tokio::test]
    async fn test_unsupported_nodes_are_unexpected() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        let parallel = tree(vec![json!({"Parallel": {"@success_count": 1, "@failure_count": 1, "child": [
            action("a", "ok")
        ]}})]);
        assert_eq!(h.run(&mut decoder, &parallel, &[], &[]).await.flag(), StatusFlag::Unexpected);
        assert!(h.trace().is_empty());

        let unknown = tree(vec![json!({"Repeat": {}})]);
        assert_eq!(h.run(&mut decoder, &unknown, &[], &[]).await.flag(), StatusFlag::Unexpected);

        let malformed = tree(vec![json!({"Sequence": {}, "Action": {}})]);
        assert_eq!(h.run(&mut decoder, &malformed, &[], &[]).await.flag(), StatusFlag::Unexpected);

        let no_tree = json!({"root": {}});
        assert_eq!(h.run(&mut decoder, &no_tree, &[], &[]).await.flag(), StatusFlag::Unexpected);

        let fallback = tree(vec![json!({"Fallback": {"child": [action("a", "fail"), {"Parallel": {}}, action("c", "ok")]}})]);
        assert_eq!(h.run(&mut decoder, &fallback, &[], &[]).await.flag(), StatusFlag::Unexpected);
        assert_eq!(h.trace(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_parse_control_empty_sequence() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        let mut ctx = RunContext {
            board: &mut h.board,
            skills: &mut h.skills,
            engines: &mut h.engines,
        };
        let status = decoder
            .parse_control(&json!({"Sequence": {"child": []}}), &mut ctx, vec![0])
            .await;
        assert!(status.is_success());
        let status = decoder.parse_control(&json!({"Parallel": {}}), &mut ctx, vec![0]).await;
        assert_eq!(status.flag(), StatusFlag::Unexpected);
    }

    #[tokio::test]
    async fn test_resume_from_node() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        let bt = tree(vec![json!({"Sequence": {"child": [
            action("a", "ok"),
            {"Sequence": {"child": [action("b1", "ok"), action("b2", "ok")]}},
            action("c", "ok")
        ]}})]);
        let status = h.run(&mut decoder, &bt, &[0, 1, 1], &[]).await;
        assert!(status.is_success());
        assert_eq!(h.trace(), vec!["b2", "c"]);
    }

    #[tokio::test]
    async fn test_resume_inside_fallback_skips_earlier_children() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        let bt = tree(vec![json!({"Fallback": {"child": [action("a", "ok"), action("b", "ok")]}})]);
        let status = h.run(&mut decoder, &bt, &[0, 1], &[]).await;
        assert!(status.is_success());
        assert_eq!(h.trace(), vec!["b"]);

        let mut h = Harness::new();
        let status = h.run(&mut decoder, &bt, &[1], &[]).await;
        assert!(status.is_success());
        assert!(h.trace().is_empty());
    }

    #[tokio::test]
    async fn test_escape_at_node() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        let bt = tree(vec![json!({"Sequence": {"child": [
            action("a", "ok"), action("b", "ok"), action("c", "ok")
        ]}})]);
        let status = h.run(&mut decoder, &bt, &[], &[0, 1]).await;
        assert_eq!(status.flag(), StatusFlag::Escaped);
        assert_eq!(h.trace(), vec!["a"]);
        assert_eq!(decoder.last_executed_node_id(), &[0, 1]);
        assert_eq!(decoder.last_executed_node_name(), "b");

        let mut h = Harness::new();
        let status = h.run(&mut decoder, &bt, &[0, 1], &[0, 2]).await;
        assert_eq!(status.flag(), StatusFlag::Escaped);
        assert_eq!(h.trace(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_logs_reset_and_cleanup_each_run() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        let bt = tree(vec![action("a", "fail")]);
        h.run(&mut decoder, &bt, &[], &[]).await;
        assert_eq!(decoder.last_executed_node_id(), &[0]);
        assert!(!h.skills.has_active_skill());

        let empty = tree(vec![]);
        assert!(h.run(&mut decoder, &empty, &[], &[]).await.is_success());
        assert_eq!(decoder.last_executed_node_name(), "");
        assert!(decoder.last_executed_node_id().is_empty());
    }

    /// 直接跑一个中途中止的技能，使其残留为活动技能，并挂起一个停止请求
    async fn leave_skill_active(h: &mut Harness) {
        let node = json!({"@name": "left over", "@skill": "step", "@result": "abort"});
        let node = node.as_object().cloned().unwrap_or_default();
        let status = h.skills.run_skill("step", &node, &mut h.board, &mut h.engines).await;
        assert_eq!(status.flag(), StatusFlag::Aborted);
        h.skills.abort_handle().request_stop();
        assert!(h.skills.has_active_skill());
        assert!(h.skills.abort_requested());
    }

    #[tokio::test]
    async fn test_escaped_and_unexpected_runs_still_clean_up() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();

        leave_skill_active(&mut h).await;
        let bt = tree(vec![action("a", "ok")]);
        let status = h.run(&mut decoder, &bt, &[], &[0]).await;
        assert_eq!(status.flag(), StatusFlag::Escaped);
        assert!(!h.skills.has_active_skill());
        assert!(!h.skills.abort_requested());
        assert_eq!(h.skills.phase(), None);

        leave_skill_active(&mut h).await;
        let status = h.run(&mut decoder, &json!({"root": {"BehaviorTree": {}}}), &[], &[]).await;
        assert_eq!(status.flag(), StatusFlag::Unexpected);
        assert!(!h.skills.has_active_skill());
        assert!(!h.skills.abort_requested());
        assert_eq!(h.trace(), vec!["left over", "left over"]);
    }

    #[tokio::test]
    async fn test_stop_request_honored_before_next_leaf() {
        let mut h = Harness::new();
        let mut decoder = TaskSequenceDecoder::new();
        h.skills.abort_handle().request_stop();
        let bt = tree(vec![action("a", "ok")]);
        let status = h.run(&mut decoder, &bt, &[], &[]).await;
        assert_eq!(status.flag(), StatusFlag::Aborted);
        assert!(h.trace().is_empty());
        assert!(!h.skills.abort_requested());

        // 没有控制器时急停失败只记日志，结果仍为 ABORTED
        h.skills.abort_handle().request_emergency_stop();
        let status = h.run(&mut decoder, &bt, &[], &[]).await;
        assert_eq!(status.flag(), StatusFlag::Aborted);
        assert!(status.message().contains("emergency"));
        assert!(h.trace().is_empty());
        assert!(!h.skills.abort_handle().is_emergency());
    }

    struct RecordingClient {
        sent: Mutex<Vec<NodeFeedback>>,
    }

    #[async_trait]
    impl NetworkClient for RecordingClient {
        async fn send_feedback(&self, feedback: &NodeFeedback) -> Status {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(feedback.clone());
            }
            Status::success()
        }
    }

    #[tokio::test]
    async fn test_feedback_after_each_leaf() {
        let mut h = Harness::new();
        let client = Arc::new(RecordingClient {
            sent: Mutex::new(Vec::new()),
        });
        let mut decoder = TaskSequenceDecoder::new().with_network_client(client.clone());
        let bt = tree(vec![json!({"Sequence": {"child": [action("a", "ok"), action("b", "fail")]}})]);
        h.run(&mut decoder, &bt, &[], &[]).await;

        let sent = client.sent.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].node_name, "a");
        assert_eq!(sent[1].node_id, vec![0, 1]);
        assert_eq!(sent[1].status.flag(), StatusFlag::Failed);
        assert_eq!(sent[0].run_id, decoder.run_id());
    }
}
