//! 技能/解码器注册表：按定位符构造实例

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Data, TasqError};

use super::base::Skill;
use super::decoder::{GenericDecoder, SkillDecoder};

/// 构造函数参数为技能库中的 src_configs
pub type SkillFactory = Arc<dyn Fn(&Data) -> Box<dyn Skill> + Send + Sync>;
pub type DecoderFactory = Arc<dyn Fn() -> Box<dyn SkillDecoder> + Send + Sync>;

/// 内置通用解码器的定位符
pub const GENERIC_DECODER: &str = "generic";

#[derive(Clone)]
pub struct SkillRegistry {
    skills: HashMap<String, SkillFactory>,
    decoders: HashMap<String, DecoderFactory>,
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillRegistry {
    /// 预置 `generic` 解码器
    pub fn new() -> Self {
        let mut registry = Self {
            skills: HashMap::new(),
            decoders: HashMap::new(),
        };
        registry.register_decoder(GENERIC_DECODER, || Box::new(GenericDecoder::new()));
        registry
    }

    pub fn register_skill<F>(&mut self, locator: impl Into<String>, factory: F)
    where
        F: Fn(&Data) -> Box<dyn Skill> + Send + Sync + 'static,
    {
        self.skills.insert(locator.into(), Arc::new(factory));
    }

    pub fn register_decoder<F>(&mut self, locator: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn SkillDecoder> + Send + Sync + 'static,
    {
        self.decoders.insert(locator.into(), Arc::new(factory));
    }

    pub fn create_skill(&self, locator: &str, configs: &Data) -> Result<Box<dyn Skill>, TasqError> {
        let factory = self.skills.get(locator).ok_or_else(|| TasqError::UnknownLocator {
            kind: "skill",
            locator: locator.to_string(),
        })?;
        Ok(factory(configs))
    }

    pub fn create_decoder(&self, locator: &str) -> Result<Box<dyn SkillDecoder>, TasqError> {
        let factory = self.decoders.get(locator).ok_or_else(|| TasqError::UnknownLocator {
            kind: "decoder",
            locator: locator.to_string(),
        })?;
        Ok(factory())
    }

    pub fn has_skill(&self, locator: &str) -> bool {
        self.skills.contains_key(locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_decoder_is_builtin() {
        let registry = SkillRegistry::new();
        assert!(registry.create_decoder(GENERIC_DECODER).is_ok());
        assert!(matches!(
            registry.create_decoder("custom"),
            Err(TasqError::UnknownLocator { kind: "decoder", .. })
        ));
        assert!(matches!(
            registry.create_skill("samples.grasp", &Data::new()),
            Err(TasqError::UnknownLocator { kind: "skill", .. })
        ));
    }
}
