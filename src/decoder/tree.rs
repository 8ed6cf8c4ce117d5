//! 行为树文档的结构辅助：节点拆解、子节点提取、大纲

use serde::Serialize;
use serde_json::Value;

/// 受支持的节点类型
pub const SEQUENCE: &str = "Sequence";
pub const FALLBACK: &str = "Fallback";
pub const ACTION: &str = "Action";

/// 取出 `root.BehaviorTree.Tree` 列表
pub fn tree_list(bt: &Value) -> Option<&Vec<Value>> {
    bt.get("root")?.get("BehaviorTree")?.get("Tree")?.as_array()
}

/// 单键映射 → (节点类型, 节点体)
pub fn split_node(node: &Value) -> Option<(&str, &Value)> {
    let map = node.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.iter().next().map(|(k, v)| (k.as_str(), v))
}

/// `child` 可以是数组、单个对象或缺省
pub fn children(body: &Value) -> Vec<&Value> {
    match body.get("child") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item @ Value::Object(_)) => vec![item],
        _ => Vec::new(),
    }
}

pub fn node_name(body: &Value) -> &str {
    body.get("@name").and_then(|v| v.as_str()).unwrap_or("")
}

/// 不执行任何节点，只列出结构
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutline {
    pub id: Vec<usize>,
    pub kind: String,
    pub name: String,
    pub skill: Option<String>,
    pub supported: bool,
}

pub fn outline_tree(bt: &Value) -> Vec<NodeOutline> {
    let mut out = Vec::new();
    if let Some(list) = tree_list(bt) {
        for (i, node) in list.iter().enumerate() {
            outline_node(node, vec![i], &mut out);
        }
    }
    out
}

fn outline_node(node: &Value, id: Vec<usize>, out: &mut Vec<NodeOutline>) {
    let Some((kind, body)) = split_node(node) else {
        out.push(NodeOutline {
            id,
            kind: String::new(),
            name: String::new(),
            skill: None,
            supported: false,
        });
        return;
    };
    let supported = matches!(kind, SEQUENCE | FALLBACK | ACTION);
    let skill = (kind == ACTION)
        .then(|| body.get("@skill").and_then(|v| v.as_str()).map(String::from))
        .flatten();
    out.push(NodeOutline {
        id: id.clone(),
        kind: kind.to_string(),
        name: node_name(body).to_string(),
        skill,
        supported,
    });
    if kind == SEQUENCE || kind == FALLBACK {
        for (i, child) in children(body).into_iter().enumerate() {
            let mut child_id = id.clone();
            child_id.push(i);
            outline_node(child, child_id, out);
        }
    }
}
