//! 任务配置加载（JSON）
//!
//! 顶层字段：
//! - `general`：必填对象
//! - `library`：内联对象，或指向 .toml / .json 文件的路径（文件顶层为 `library` 表）
//! - `robot_structure`：内联，或路径；以 `$` 开头表示从环境变量读取路径；取文件中的 `robot_structure` 字段
//! - `engines`：内联对象，或指向 JSON 文件的路径；必须包含 `data` 键
//!
//! 相对路径按任务配置文件所在目录解析。

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::core::Data;
use crate::skills::SkillLibrary;

#[derive(Error, Debug)]
pub enum TaskConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// 解析后的任务配置
#[derive(Debug, Clone)]
pub struct TaskConfig {
    pub general: Data,
    pub library: SkillLibrary,
    pub robot_structure: Value,
    pub engines: Data,
}

#[derive(Debug, Clone, Default)]
pub struct TaskConfigLoader {
    base_dir: PathBuf,
}

impl TaskConfigLoader {
    /// base_dir 用于解析相对路径
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// 读取任务配置文件，相对路径按该文件所在目录解析
    pub fn load_file(path: &Path) -> Result<TaskConfig, TaskConfigError> {
        let root = read_json(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::new(base_dir).load_value(&root)
    }

    pub fn load_value(&self, root: &Value) -> Result<TaskConfig, TaskConfigError> {
        let general = root
            .get("general")
            .ok_or_else(|| TaskConfigError::MissingField("general".into()))?
            .as_object()
            .cloned()
            .ok_or_else(|| invalid("general", "must be an object"))?;

        let library = self.expand_library(root.get("library"))?;
        let robot_structure = self.expand_robot_structure(root.get("robot_structure"))?;
        let engines = self.expand_engines(root.get("engines"))?;

        tracing::info!(
            "Loaded task config: {} skills, {} engine entries",
            library.len(),
            engines.len()
        );
        Ok(TaskConfig {
            general,
            library,
            robot_structure,
            engines,
        })
    }

    fn expand_library(&self, value: Option<&Value>) -> Result<SkillLibrary, TaskConfigError> {
        let table = match value {
            None | Some(Value::Null) => return Err(TaskConfigError::MissingField("library".into())),
            Some(Value::String(path)) => {
                let path = self.resolve(path);
                let doc = match path.extension().and_then(|e| e.to_str()) {
                    Some("toml") => read_toml(&path)?,
                    _ => read_json(&path)?,
                };
                doc.get("library")
                    .cloned()
                    .ok_or_else(|| TaskConfigError::MissingField(format!("library in {}", path.display())))?
            }
            Some(inline) => inline.clone(),
        };
        SkillLibrary::from_value(&table).map_err(|e| invalid("library", &e.to_string()))
    }

    fn expand_robot_structure(&self, value: Option<&Value>) -> Result<Value, TaskConfigError> {
        match value {
            None => Err(TaskConfigError::MissingField("robot_structure".into())),
            Some(Value::String(path)) => {
                let path = match path.strip_prefix('$') {
                    Some(var) => std::env::var(var).map_err(|_| TaskConfigError::MissingEnv(var.to_string()))?,
                    None => path.clone(),
                };
                let path = self.resolve(&path);
                let doc = read_json(&path)?;
                doc.get("robot_structure").cloned().ok_or_else(|| {
                    TaskConfigError::MissingField(format!("robot_structure in {}", path.display()))
                })
            }
            Some(inline) => Ok(inline.clone()),
        }
    }

    fn expand_engines(&self, value: Option<&Value>) -> Result<Data, TaskConfigError> {
        let engines = match value {
            None | Some(Value::Null) => return Err(TaskConfigError::MissingField("engines".into())),
            Some(Value::String(path)) => read_json(&self.resolve(path))?,
            Some(inline) => inline.clone(),
        };
        let engines = engines
            .as_object()
            .cloned()
            .ok_or_else(|| invalid("engines", "must be an object"))?;
        if !engines.contains_key("data") {
            return Err(invalid("engines", "must contain the 'data' key (null for no data engine)"));
        }
        Ok(engines)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

fn invalid(field: &str, reason: &str) -> TaskConfigError {
    TaskConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn read_json(path: &Path) -> Result<Value, TaskConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| TaskConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| TaskConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_toml(path: &Path) -> Result<Value, TaskConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| TaskConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| TaskConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}
