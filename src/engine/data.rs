//! 数据引擎：任务运行期间可读写的命名数据（地图、物体位置、学习结果等）

use async_trait::async_trait;
use serde_json::Value;

use crate::core::Status;

use super::base::Engine;

#[async_trait]
pub trait DataEngine: Engine {
    /// init 之后由 EngineInterface 调用一次
    async fn load(&mut self) -> Status;

    fn get_data(&self, name: &str) -> Option<Value>;

    fn update_data(&mut self, name: &str, value: Value) -> Status;

    async fn save(&mut self) -> Status;
}
