//! 机器人结构配置中的模型/传感器描述

use serde::{Deserialize, Serialize};

use crate::core::{Data, SensorRole};

/// 一个模型（机器人或传感器）在结构树中的位置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    pub unique_id: String,
    /// 挂载的父机器人 id，顶层为空
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub parent_link: String,
    /// 传感器坐标系名，用于 get_sensor_transform
    #[serde(default)]
    pub sensor_frame: String,
    #[serde(default)]
    pub configs: Data,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorInfo {
    #[serde(flatten)]
    pub model: ModelInfo,
    #[serde(rename = "type")]
    pub sensor_type: SensorRole,
}

impl SensorInfo {
    pub fn new(model: ModelInfo, sensor_type: SensorRole) -> Self {
        Self { model, sensor_type }
    }

    pub fn unique_id(&self) -> &str {
        &self.model.unique_id
    }

    /// 挂载坐标系：优先 sensor_frame，其次 parent_link
    pub fn mount_frame(&self) -> &str {
        if self.model.sensor_frame.is_empty() {
            &self.model.parent_link
        } else {
            &self.model.sensor_frame
        }
    }
}
