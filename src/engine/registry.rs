//! 引擎注册表：定位符字符串 → 构造函数
//!
//! 由宿主程序在启动时显式注册；EngineInterface 按配置中的 `engine` 字段查找。

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::TasqError;

use super::base::{Engine, EngineRole};
use super::controller::ControllerEngine;
use super::data::DataEngine;
use super::kinematics::KinematicsEngine;
use super::world::{SimulationEngine, WorldConstructorEngine};

/// 按角色区分的引擎实例
pub enum EngineHandle {
    Data(Box<dyn DataEngine>),
    WorldConstructor(Box<dyn WorldConstructorEngine>),
    Simulation(Box<dyn SimulationEngine>),
    Kinematics(Box<dyn KinematicsEngine>),
    Controller(Box<dyn ControllerEngine>),
}

impl EngineHandle {
    pub fn role(&self) -> EngineRole {
        match self {
            EngineHandle::Data(_) => EngineRole::Data,
            EngineHandle::WorldConstructor(_) => EngineRole::WorldConstructor,
            EngineHandle::Simulation(_) => EngineRole::Simulation,
            EngineHandle::Kinematics(_) => EngineRole::Kinematics,
            EngineHandle::Controller(_) => EngineRole::Controller,
        }
    }

    pub fn class_id(&self) -> &str {
        match self {
            EngineHandle::Data(e) => e.class_id(),
            EngineHandle::WorldConstructor(e) => e.class_id(),
            EngineHandle::Simulation(e) => e.class_id(),
            EngineHandle::Kinematics(e) => e.class_id(),
            EngineHandle::Controller(e) => e.class_id(),
        }
    }
}

/// 构造函数参数为配置中的 class_id
pub type EngineFactory = Arc<dyn Fn(&str) -> EngineHandle + Send + Sync>;

#[derive(Default, Clone)]
pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, locator: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> EngineHandle + Send + Sync + 'static,
    {
        self.factories.insert(locator.into(), Arc::new(factory));
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.factories.contains_key(locator)
    }

    pub fn create(&self, locator: &str, class_id: &str) -> Result<EngineHandle, TasqError> {
        let factory = self.factories.get(locator).ok_or_else(|| TasqError::UnknownLocator {
            kind: "engine",
            locator: locator.to_string(),
        })?;
        Ok(factory(class_id))
    }

    pub fn locators(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}
