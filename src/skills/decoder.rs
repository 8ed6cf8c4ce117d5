//! 技能参数解码：把行为树 Action 节点转换为技能初始化参数
//!
//! 通用规则：去掉键前缀 `@`，丢弃 `@skill`；形如 `"{var}"` 的字符串值从黑板读取。

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{Blackboard, Data, Status};
use crate::engine::EngineInterface;

#[async_trait]
pub trait SkillDecoder: Send + Sync {
    fn decode(&mut self, node: &Data, board: &Blackboard) -> Status;

    /// 运行时参数（依赖引擎状态的，如当前末端位姿）
    async fn fill_runtime_parameters(&mut self, _engines: &EngineInterface) -> Status {
        Status::success()
    }

    fn as_config(&self) -> Data;
}

/// 只做通用解码的默认解码器
#[derive(Debug, Default)]
pub struct GenericDecoder {
    params: Data,
}

impl GenericDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SkillDecoder for GenericDecoder {
    fn decode(&mut self, node: &Data, board: &Blackboard) -> Status {
        match decode_node_parameters(node, board) {
            Ok(params) => {
                self.params = params;
                Status::success()
            }
            Err(status) => status,
        }
    }

    fn as_config(&self) -> Data {
        self.params.clone()
    }
}

pub fn decode_node_parameters(node: &Data, board: &Blackboard) -> Result<Data, Status> {
    let mut params = Data::new();
    for (key, value) in node {
        let key = key.strip_prefix('@').unwrap_or(key);
        if key == "skill" {
            continue;
        }
        params.insert(key.to_string(), resolve_value(value, board)?);
    }
    Ok(params)
}

fn resolve_value(value: &Value, board: &Blackboard) -> Result<Value, Status> {
    let Some(text) = value.as_str() else {
        return Ok(value.clone());
    };
    let Some(var) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) else {
        return Ok(value.clone());
    };
    board
        .get_board_variable(var)
        .cloned()
        .ok_or_else(|| Status::failed(format!("blackboard variable {var} is not set")))
}
