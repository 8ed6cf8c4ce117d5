//! 引擎门面：按配置解析、构造并初始化引擎组，并代理动作执行与急停
//!
//! 独占持有全部引擎；close 无论初始化进行到哪一步都会关闭并清理已构造的引擎。

use serde_json::Value;

use crate::core::{
    CombinedRobotAction, CombinedRobotState, CombinedRobotStruct, Data, RobotAction, SolveByType, Status, TasqError,
};

use super::base::EngineRole;
use super::controller::ControllerEngine;
use super::data::DataEngine;
use super::kinematics::KinematicsEngine;
use super::registry::{EngineHandle, EngineRegistry};
use super::world::{SimulationEngine, WorldConstructorEngine};

pub struct EngineInterface {
    registry: EngineRegistry,
    robot_structure: Value,
    data: Option<Box<dyn DataEngine>>,
    world_constructor: Option<Box<dyn WorldConstructorEngine>>,
    simulation: Option<Box<dyn SimulationEngine>>,
    kinematics: Option<Box<dyn KinematicsEngine>>,
    controller: Option<Box<dyn ControllerEngine>>,
    last_cycle: Option<CombinedRobotStruct>,
}

impl EngineInterface {
    pub fn new(registry: EngineRegistry) -> Self {
        Self {
            registry,
            robot_structure: Value::Null,
            data: None,
            world_constructor: None,
            simulation: None,
            kinematics: None,
            controller: None,
            last_cycle: None,
        }
    }

    /// 按 data → world_constructor → simulation → kinematics → controller 顺序初始化；
    /// `data` 键必须存在（值可为 null），任一引擎失败立即返回。
    /// 已持有引擎时先 close 旧引擎组再重新构造。
    pub async fn init(&mut self, general: &Data, robot_structure: &Value, engine_config: &Data) -> Status {
        if !engine_config.contains_key(EngineRole::Data.config_key()) {
            return Status::failed("engine config must contain the 'data' key (null for no data engine)");
        }
        if self.is_initialized() {
            tracing::warn!("EngineInterface: re-initializing, closing previous engines first");
            let status = self.close().await;
            if !status.is_success() {
                tracing::error!("EngineInterface: closing previous engines failed: {}", status);
            }
        }
        for key in engine_config.keys() {
            if EngineRole::from_config_key(key).is_none() {
                tracing::warn!("EngineInterface: ignoring unknown engine role '{}'", key);
            }
        }
        self.robot_structure = robot_structure.clone();

        for role in EngineRole::INIT_ORDER {
            let entry = match engine_config.get(role.config_key()) {
                None | Some(Value::Null) => continue,
                Some(Value::Object(entry)) => entry,
                Some(_) => return Status::failed(format!("engine config for '{role}' must be an object or null")),
            };
            let mut handle = match self.construct(role, entry) {
                Ok(handle) => handle,
                Err(e) => return e.into(),
            };
            let status = init_handle(&mut handle, general, robot_structure, entry).await;
            let class_id = handle.class_id().to_string();
            // 初始化失败的引擎也要纳管，close 时统一清理
            self.store(handle);
            if !status.is_success() {
                tracing::error!("EngineInterface: {} engine '{}' failed to init: {}", role, class_id, status);
                return status;
            }
            tracing::info!("EngineInterface: {} engine '{}' ready", role, class_id);
        }
        Status::success()
    }

    fn construct(&self, role: EngineRole, entry: &Data) -> Result<EngineHandle, TasqError> {
        let locator = entry
            .get("engine")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TasqError::MissingField(format!("engines.{role}.engine")))?;
        let class_id = entry.get("class_id").and_then(|v| v.as_str()).unwrap_or(locator);
        let handle = self.registry.create(locator, class_id)?;
        if handle.role() != role {
            return Err(TasqError::RoleMismatch {
                locator: locator.to_string(),
                expected: role.to_string(),
                actual: handle.role().to_string(),
            });
        }
        Ok(handle)
    }

    fn store(&mut self, handle: EngineHandle) {
        match handle {
            EngineHandle::Data(e) => self.data = Some(e),
            EngineHandle::WorldConstructor(e) => self.world_constructor = Some(e),
            EngineHandle::Simulation(e) => self.simulation = Some(e),
            EngineHandle::Kinematics(e) => self.kinematics = Some(e),
            EngineHandle::Controller(e) => self.controller = Some(e),
        }
    }

    /// 场景加载：世界构造 → 仿真加载机器人与组件 → 控制器绑定
    pub async fn call_environment_load_pipeline(&mut self) -> Status {
        let mut components = Vec::new();
        if let Some(constructor) = self.world_constructor.as_mut() {
            let (status, spawned) = constructor.get_spawn_components().await;
            if !status.is_success() {
                return status;
            }
            components = spawned;
        }

        if let Some(simulation) = self.simulation.as_mut() {
            let status = simulation.reset().await;
            if !status.is_success() {
                return status;
            }
            let status = simulation.load_robots(&self.robot_structure).await;
            if !status.is_success() {
                return status;
            }
            let status = simulation.load_components(&components).await;
            if !status.is_success() {
                return status;
            }
        }

        if let Some(controller) = self.controller.as_mut() {
            let status = controller.reset().await;
            if !status.is_success() {
                return status;
            }
            let status = controller.load_components(&components).await;
            if !status.is_success() {
                return status;
            }
            let status = controller.update_actual_robot_states().await;
            if !status.is_success() {
                return status;
            }
        }
        tracing::info!("EngineInterface: environment loaded with {} components", components.len());
        Status::success()
    }

    /// 执行一个组合动作：需要求解的先交给运动学引擎，再由控制器下发
    pub async fn execute_action(&mut self, actions: &CombinedRobotAction) -> Status {
        let current = self.latest_robot_states().cloned().unwrap_or_default();
        let status = self.dispatch(actions, &current).await;
        self.last_cycle = Some(CombinedRobotStruct::new(&current, actions, status.clone()));
        status
    }

    async fn dispatch(&mut self, actions: &CombinedRobotAction, current: &CombinedRobotState) -> Status {
        let pending: CombinedRobotAction = CombinedRobotAction::new(
            actions.task.clone(),
            actions
                .actions
                .iter()
                .map(|(id, list)| {
                    let list: Vec<RobotAction> = list
                        .iter()
                        .filter(|a| a.solve_by() != SolveByType::NullAction)
                        .cloned()
                        .collect();
                    (id.clone(), list)
                })
                .filter(|(_, list)| !list.is_empty())
                .collect(),
        );
        if pending.is_empty() {
            return Status::success();
        }

        let needs_kinematics = pending
            .actions
            .values()
            .flatten()
            .any(|a| a.solve_by().target_engine() == Some(EngineRole::Kinematics));
        let commands = if needs_kinematics {
            let Some(kinematics) = self.kinematics.as_mut() else {
                return Status::failed(format!("task {} needs a kinematics engine", actions.task));
            };
            let (status, solved) = kinematics.solve(&pending, current).await;
            if !status.is_success() {
                return status;
            }
            solved
        } else {
            pending
        };

        let Some(controller) = self.controller.as_mut() else {
            return Status::failed(format!("task {} needs a controller engine", actions.task));
        };
        controller.command(&commands).await
    }

    pub async fn update_actual_robot_states(&mut self) -> Status {
        match self.controller.as_mut() {
            Some(controller) => controller.update_actual_robot_states().await,
            None => Status::failed("no controller engine to refresh robot states"),
        }
    }

    pub fn latest_robot_states(&self) -> Option<&CombinedRobotState> {
        self.controller.as_ref().map(|c| c.base().get_latest_robot_states())
    }

    pub async fn emergency_stop(&mut self) -> Status {
        match self.controller.as_mut() {
            Some(controller) => {
                tracing::warn!("EngineInterface: emergency stop requested");
                controller.emergency_stop().await
            }
            None => Status::failed("no controller engine to emergency stop"),
        }
    }

    /// 关闭全部已构造引擎并执行基础清理；返回第一个失败
    pub async fn close(&mut self) -> Status {
        let mut statuses = Vec::new();
        if let Some(mut controller) = self.controller.take() {
            statuses.push(controller.close().await);
            statuses.push(controller.base_mut().cleanup().await);
        }
        if let Some(mut kinematics) = self.kinematics.take() {
            statuses.push(kinematics.close().await);
            statuses.push(kinematics.base_mut().cleanup());
        }
        if let Some(mut simulation) = self.simulation.take() {
            statuses.push(simulation.close().await);
        }
        if let Some(mut constructor) = self.world_constructor.take() {
            statuses.push(constructor.close().await);
        }
        if let Some(mut data) = self.data.take() {
            statuses.push(data.close().await);
        }
        for status in statuses.iter().filter(|s| !s.is_success()) {
            tracing::error!("EngineInterface: close step failed: {}", status);
        }
        self.last_cycle = None;
        Status::all_succeeded(statuses)
    }

    pub fn last_cycle(&self) -> Option<&CombinedRobotStruct> {
        self.last_cycle.as_ref()
    }

    pub fn robot_structure(&self) -> &Value {
        &self.robot_structure
    }

    pub fn data(&self) -> Option<&dyn DataEngine> {
        self.data.as_deref()
    }

    pub fn data_mut(&mut self) -> Option<&mut (dyn DataEngine + 'static)> {
        self.data.as_deref_mut()
    }

    pub fn kinematics(&self) -> Option<&dyn KinematicsEngine> {
        self.kinematics.as_deref()
    }

    pub fn kinematics_mut(&mut self) -> Option<&mut (dyn KinematicsEngine + 'static)> {
        self.kinematics.as_deref_mut()
    }

    pub fn controller(&self) -> Option<&dyn ControllerEngine> {
        self.controller.as_deref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut (dyn ControllerEngine + 'static)> {
        self.controller.as_deref_mut()
    }

    /// 是否持有任一引擎
    pub fn is_initialized(&self) -> bool {
        EngineRole::INIT_ORDER.into_iter().any(|role| self.has_role(role))
    }

    pub fn has_role(&self, role: EngineRole) -> bool {
        match role {
            EngineRole::Data => self.data.is_some(),
            EngineRole::WorldConstructor => self.world_constructor.is_some(),
            EngineRole::Simulation => self.simulation.is_some(),
            EngineRole::Kinematics => self.kinematics.is_some(),
            EngineRole::Controller => self.controller.is_some(),
        }
    }
}

async fn init_handle(handle: &mut EngineHandle, general: &Data, robot_structure: &Value, configs: &Data) -> Status {
    match handle {
        EngineHandle::Data(e) => {
            let status = e.init(general, robot_structure, configs).await;
            if !status.is_success() {
                return status;
            }
            e.load().await
        }
        EngineHandle::WorldConstructor(e) => e.init(general, robot_structure, configs).await,
        EngineHandle::Simulation(e) => e.init(general, robot_structure, configs).await,
        EngineHandle::Kinematics(e) => e.init(general, robot_structure, configs).await,
        EngineHandle::Controller(e) => e.init(general, robot_structure, configs).await,
    }
}
