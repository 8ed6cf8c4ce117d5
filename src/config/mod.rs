//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `TASQ__*` 覆盖（双下划线表示嵌套，如 `TASQ__SKILLS__MAX_ACTION_STEPS=200`）。
//! 任务配置（general / library / robot_structure / engines）见 [`task`]。

pub mod task;

use std::path::PathBuf;

use serde::Deserialize;

pub use task::{TaskConfig, TaskConfigError, TaskConfigLoader};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub skills: SkillsSection,
    #[serde(default)]
    pub task: TaskSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [skills] 段：技能运行限制
#[derive(Debug, Clone, Deserialize)]
pub struct SkillsSection {
    /// 单个技能动作循环的最大步数，0 表示不限
    #[serde(default = "default_max_action_steps")]
    pub max_action_steps: usize,
}

impl Default for SkillsSection {
    fn default() -> Self {
        Self {
            max_action_steps: default_max_action_steps(),
        }
    }
}

fn default_max_action_steps() -> usize {
    0
}

/// [task] 段：默认任务配置与行为树路径，可被命令行参数覆盖
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskSection {
    pub config_path: Option<PathBuf>,
    pub tree_path: Option<PathBuf>,
}

/// 加载配置：默认文件 → 可选指定文件 → 环境变量 TASQ__*
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("TASQ")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.skills.max_action_steps, 0);
        assert!(config.task.config_path.is_none());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[app]\nname = \"cell-3\"\n\n[skills]\nmax_action_steps = 50\n\n[task]\ntree_path = \"trees/pick.json\""
        )
        .unwrap();
        let config = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.app.name.as_deref(), Some("cell-3"));
        assert_eq!(config.skills.max_action_steps, 50);
        assert_eq!(config.task.tree_path, Some(PathBuf::from("trees/pick.json")));
    }
}
