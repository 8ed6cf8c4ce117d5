//! 技能库：技能名 → {decoder, src, src_configs}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Data, TasqError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// 解码器定位符
    pub decoder: String,
    /// 技能实现定位符
    pub src: String,
    #[serde(default)]
    pub src_configs: Data,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillLibrary {
    records: HashMap<String, SkillRecord>,
}

impl SkillLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: &Value) -> Result<Self, TasqError> {
        serde_json::from_value(value.clone()).map_err(|e| TasqError::Config(format!("invalid skill library: {e}")))
    }

    pub fn insert(&mut self, name: impl Into<String>, record: SkillRecord) {
        self.records.insert(name.into(), record);
    }

    pub fn get(&self, name: &str) -> Option<&SkillRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
