//! tasq - 行为树任务检查工具
//!
//! 入口：初始化日志、加载应用配置与任务配置，打印行为树大纲并检查技能是否都在技能库中。
//! 不驱动硬件：引擎与技能实现由宿主程序注册。
//!
//! 用法：`tasq [task-config.json] [tree.json]`，缺省时取 config/default.toml 的 [task] 段。

use std::path::PathBuf;

use anyhow::{bail, Context};
use tasq::config::{load_config, TaskConfigLoader};
use tasq::decoder::outline_tree;
use tasq::skills::{SkillInterface, SkillRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tasq::observability::init();

    let app = load_config(None).context("Failed to load config")?;
    let mut args = std::env::args().skip(1);
    let task_path = args.next().map(PathBuf::from).or(app.task.config_path.clone());
    let tree_path = args.next().map(PathBuf::from).or(app.task.tree_path.clone());

    let Some(task_path) = task_path else {
        bail!("usage: tasq [task-config.json] [tree.json]");
    };
    let task = TaskConfigLoader::load_file(&task_path)
        .with_context(|| format!("Failed to load task config {}", task_path.display()))?;

    let mut skills = SkillInterface::from_config(SkillRegistry::new(), &app.skills);
    let status = skills.init(&task.general, task.library.clone());
    if !status.is_success() {
        bail!("Skill library rejected: {status}");
    }
    println!("{} skills in library:", skills.library().len());
    for name in skills.library().names() {
        println!("  - {name}");
    }
    match skills.max_action_steps() {
        0 => println!("action steps per skill: unlimited"),
        n => println!("action steps per skill: {n}"),
    }
    let mut roles: Vec<&String> = task.engines.keys().collect();
    roles.sort();
    println!("engine roles: {}", roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", "));

    let Some(tree_path) = tree_path else {
        return Ok(());
    };
    let text = std::fs::read_to_string(&tree_path)
        .with_context(|| format!("Failed to read tree {}", tree_path.display()))?;
    let bt: serde_json::Value = serde_json::from_str(&text).context("Tree is not valid JSON")?;

    let outline = outline_tree(&bt);
    if outline.is_empty() {
        tracing::warn!("Tree {} has no nodes under root.BehaviorTree.Tree", tree_path.display());
    }
    for node in &outline {
        let indent = "  ".repeat(node.id.len().saturating_sub(1));
        let skill = node.skill.as_deref().map(|s| format!(" <{s}>")).unwrap_or_default();
        println!("{indent}{:?} {} '{}'{}", node.id, node.kind, node.name, skill);
        if !node.supported {
            tracing::warn!("Node {:?} ({}) is not supported and will return UNEXPECTED", node.id, node.kind);
        }
        if let Some(skill) = &node.skill {
            if !skills.library().contains(skill) {
                tracing::warn!("Node {:?} uses skill '{}' which is not in the library", node.id, skill);
            }
        }
    }
    Ok(())
}
