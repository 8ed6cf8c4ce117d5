//! 编排层错误类型
//!
//! 只用于 Status 边界之前的编程/配置错误（未知定位符、角色不匹配、技能未定义终止方式等）；
//! 到达边界时通过 `From<TasqError> for Status` 转成 FAILED + 对应原因码。

use thiserror::Error;

use super::status::{Status, StatusFlag, StatusReason};

#[derive(Error, Debug)]
pub enum TasqError {
    /// 注册表中找不到定位符（engine / skill / decoder）
    #[error("Unknown {kind} locator: {locator}")]
    UnknownLocator { kind: &'static str, locator: String },

    /// 定位符构造出的引擎角色与配置键不一致
    #[error("Engine '{locator}' has role {actual}, expected {expected}")]
    RoleMismatch {
        locator: String,
        expected: String,
        actual: String,
    },

    /// 手动技能的动作中没有 terminate 字段，或学习型技能未覆盖 get_terminal
    #[error("Termination undefined: {0}")]
    TerminationUndefined(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<TasqError> for Status {
    fn from(err: TasqError) -> Self {
        let reason = match &err {
            TasqError::TerminationUndefined(_) | TasqError::Config(_) | TasqError::MissingField(_) => {
                StatusReason::ConfigurationError
            }
            TasqError::UnknownLocator { .. } | TasqError::RoleMismatch { .. } => StatusReason::Other,
        };
        Status::with_reason(StatusFlag::Failed, reason, err.to_string())
    }
}
