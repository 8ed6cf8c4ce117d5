//! 技能系统
//!
//! 技能（Skill）是带 init / act / terminate 生命周期的行为单元。
//! 技能库把技能名映射到解码器与实现的定位符，SkillInterface 负责解析与驱动。
//!
//! 技能库记录：
//! ```text
//! {
//!   "grasp": {
//!     "decoder": "generic",          # 参数解码器定位符
//!     "src": "samples.grasp",        # 技能实现定位符
//!     "src_configs": {"interruptible": false}
//!   }
//! }
//! ```

mod base;
mod decoder;
mod interface;
mod library;
mod registry;

pub use base::{Observation, Skill, SkillPhase, SkillProfile};
pub use decoder::{decode_node_parameters, GenericDecoder, SkillDecoder};
pub use interface::{AbortHandle, SkillInterface};
pub use library::{SkillLibrary, SkillRecord};
pub use registry::{DecoderFactory, SkillFactory, SkillRegistry, GENERIC_DECODER};
