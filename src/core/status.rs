//! 统一结果模型：Status = 结果标志 + 原因码 + 消息
//!
//! 所有跨边界（决策器 ↔ 技能 ↔ 引擎 ↔ 机器人/传感器）的调用都返回 Status，而不是 panic 或 Err。
//! Status 一经创建不可修改，传播时只会生成新值。

use serde::{Deserialize, Serialize};

/// 结果标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFlag {
    /// 成功
    Success,
    /// 运行期失败，message 说明原因
    Failed,
    /// 外部请求的停止（如急停）
    Aborted,
    /// 结构性错误：未知或不支持的节点类型
    Unexpected,
    /// 有意未执行（如 start_from_node_id 之前的节点）
    Skipped,
    /// 在断点（escape_at_node_id）处停止
    Escaped,
    /// 哨兵默认值
    Unknown,
}

impl StatusFlag {
    /// 与外部协议对齐的数值码
    pub fn code(self) -> i32 {
        match self {
            StatusFlag::Success => 1,
            StatusFlag::Failed => -1,
            StatusFlag::Aborted => -2,
            StatusFlag::Unexpected => -3,
            StatusFlag::Skipped => -4,
            StatusFlag::Escaped => -5,
            StatusFlag::Unknown => -6,
        }
    }
}

/// 原因码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusReason {
    #[default]
    None,
    SuccessfulTermination,
    ConnectionError,
    ProcessFailure,
    /// 配置错误（如手动终止的技能未在动作中给出 terminate 字段）
    ConfigurationError,
    /// 扩展点未实现（编程错误，集成/测试时暴露）
    NotImplemented,
    /// 当前模式下不支持（如非仿真世界中调用仿真专用操作）
    NotSupportedInMode,
    Other,
}

/// 不可变的结果值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    status: StatusFlag,
    #[serde(default)]
    reason: StatusReason,
    #[serde(default)]
    message: String,
}

impl Default for Status {
    fn default() -> Self {
        Self::new(StatusFlag::Unknown)
    }
}

impl Status {
    pub fn new(status: StatusFlag) -> Self {
        Self {
            status,
            reason: StatusReason::None,
            message: String::new(),
        }
    }

    pub fn with_message(status: StatusFlag, message: impl Into<String>) -> Self {
        Self {
            status,
            reason: StatusReason::None,
            message: message.into(),
        }
    }

    pub fn with_reason(status: StatusFlag, reason: StatusReason, message: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(StatusFlag::Success)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::with_message(StatusFlag::Failed, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::with_message(StatusFlag::Unexpected, message)
    }

    /// 扩展点未被具体实现覆盖
    pub fn not_implemented(what: &str) -> Self {
        Self::with_reason(
            StatusFlag::Failed,
            StatusReason::NotImplemented,
            format!("{what} is not implemented"),
        )
    }

    /// 当前模式下不支持的调用
    pub fn not_supported_in_mode(message: impl Into<String>) -> Self {
        Self::with_reason(StatusFlag::Failed, StatusReason::NotSupportedInMode, message)
    }

    pub fn flag(&self) -> StatusFlag {
        self.status
    }

    pub fn reason(&self) -> StatusReason {
        self.reason
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.status == StatusFlag::Success
    }

    /// 复合操作聚合：全部成功才返回 SUCCESS，否则原样返回第一个非成功结果
    pub fn all_succeeded<I>(statuses: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        statuses
            .into_iter()
            .find(|s| !s.is_success())
            .unwrap_or_else(Status::success)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?}", self.status)
        } else {
            write!(f, "{:?} ({:?}): {}", self.status, self.reason, self.message)
        }
    }
}
