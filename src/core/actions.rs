//! 动作格式：按 solve-by 类型区分的目标描述
//!
//! 每种动作都是值对象，构造时深拷贝传入的目标/状态，调用方之后的修改不会影响已排队的动作。
//! 除结构性默认值外不做校验（Nav3D timeout = -1，IK posture_rate = 1.0，configs 缺省为空）。

use serde::{Deserialize, Serialize};

use crate::engine::EngineRole;

use super::structs::{Data, Point, Pose, RobotState};

/// 动作由哪个引擎求解
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveByType {
    NullAction,
    ForwardKinematics,
    InverseKinematics,
    Navigation3d,
    PointToIk,
    ControlCommand,
}

impl SolveByType {
    /// 目标引擎角色；NullAction 不需要任何引擎
    pub fn target_engine(self) -> Option<EngineRole> {
        match self {
            SolveByType::NullAction => None,
            SolveByType::ControlCommand => Some(EngineRole::Controller),
            _ => Some(EngineRole::Kinematics),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FkAction {
    pub goal: RobotState,
    #[serde(default)]
    pub configs: Data,
}

impl FkAction {
    pub fn new(goal: &RobotState) -> Self {
        Self {
            goal: goal.clone(),
            configs: Data::new(),
        }
    }

    pub fn with_configs(mut self, configs: &Data) -> Self {
        self.configs = configs.clone();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IkAction {
    pub goal: Pose,
    pub source_links: Vec<String>,
    /// 求解时保持不变的关节形状
    #[serde(default)]
    pub fixed_shape: Option<RobotState>,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub start_posture: String,
    #[serde(default)]
    pub end_posture: String,
    /// 取值 [0, 1]
    pub posture_rate: f64,
    #[serde(default)]
    pub configs: Data,
}

impl IkAction {
    pub fn new(goal: Pose, source_links: &[String]) -> Self {
        Self {
            goal,
            source_links: source_links.to_vec(),
            fixed_shape: None,
            context: String::new(),
            start_posture: String::new(),
            end_posture: String::new(),
            posture_rate: 1.0,
            configs: Data::new(),
        }
    }

    pub fn with_fixed_shape(mut self, fixed_shape: &RobotState) -> Self {
        self.fixed_shape = Some(fixed_shape.clone());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_postures(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_posture = start.into();
        self.end_posture = end.into();
        self
    }

    pub fn with_posture_rate(mut self, rate: f64) -> Self {
        self.posture_rate = rate;
        self
    }

    pub fn with_configs(mut self, configs: &Data) -> Self {
        self.configs = configs.clone();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nav3dAction {
    pub pose: Pose,
    pub relative_pose: Pose,
    pub dest_name: String,
    pub context: String,
    /// 秒；-1 表示不限时
    pub timeout: f64,
    #[serde(default)]
    pub configs: Data,
}

impl Nav3dAction {
    pub fn new(pose: Pose, relative_pose: Pose, dest_name: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            pose,
            relative_pose,
            dest_name: dest_name.into(),
            context: context.into(),
            timeout: -1.0,
            configs: Data::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_configs(mut self, configs: &Data) -> Self {
        self.configs = configs.clone();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointToAction {
    pub point: Point,
    pub source_link: String,
    pub context: String,
    #[serde(default)]
    pub configs: Data,
}

impl PointToAction {
    pub fn new(point: Point, source_link: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            point,
            source_link: source_link.into(),
            context: context.into(),
            configs: Data::new(),
        }
    }

    pub fn with_configs(mut self, configs: &Data) -> Self {
        self.configs = configs.clone();
        self
    }
}

/// 直接下发给控制器的命令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandAction {
    pub commands: Data,
    #[serde(default)]
    pub configs: Data,
}

impl CommandAction {
    pub fn new(commands: &Data) -> Self {
        Self {
            commands: commands.clone(),
            configs: Data::new(),
        }
    }

    pub fn with_configs(mut self, configs: &Data) -> Self {
        self.configs = configs.clone();
        self
    }
}

/// 单个机器人的一条动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solve_by", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RobotAction {
    NullAction {
        #[serde(default)]
        configs: Data,
    },
    ForwardKinematics(FkAction),
    InverseKinematics(IkAction),
    Navigation3d(Nav3dAction),
    PointToIk(PointToAction),
    ControlCommand(CommandAction),
}

impl RobotAction {
    pub fn null() -> Self {
        RobotAction::NullAction { configs: Data::new() }
    }

    pub fn solve_by(&self) -> SolveByType {
        match self {
            RobotAction::NullAction { .. } => SolveByType::NullAction,
            RobotAction::ForwardKinematics(_) => SolveByType::ForwardKinematics,
            RobotAction::InverseKinematics(_) => SolveByType::InverseKinematics,
            RobotAction::Navigation3d(_) => SolveByType::Navigation3d,
            RobotAction::PointToIk(_) => SolveByType::PointToIk,
            RobotAction::ControlCommand(_) => SolveByType::ControlCommand,
        }
    }

    pub fn configs(&self) -> &Data {
        match self {
            RobotAction::NullAction { configs } => configs,
            RobotAction::ForwardKinematics(a) => &a.configs,
            RobotAction::InverseKinematics(a) => &a.configs,
            RobotAction::Navigation3d(a) => &a.configs,
            RobotAction::PointToIk(a) => &a.configs,
            RobotAction::ControlCommand(a) => &a.configs,
        }
    }
}

impl From<FkAction> for RobotAction {
    fn from(a: FkAction) -> Self {
        RobotAction::ForwardKinematics(a)
    }
}

impl From<IkAction> for RobotAction {
    fn from(a: IkAction) -> Self {
        RobotAction::InverseKinematics(a)
    }
}

impl From<Nav3dAction> for RobotAction {
    fn from(a: Nav3dAction) -> Self {
        RobotAction::Navigation3d(a)
    }
}

impl From<PointToAction> for RobotAction {
    fn from(a: PointToAction) -> Self {
        RobotAction::PointToIk(a)
    }
}

impl From<CommandAction> for RobotAction {
    fn from(a: CommandAction) -> Self {
        RobotAction::ControlCommand(a)
    }
}
