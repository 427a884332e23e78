//! HierarchyBlueprint - Config Loader 输出
//!
//! 描述完整的层级配置：节点、参数声明、同步边、运行参数与脚本。

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{FilterConfig, ParamName, ParamType, ParamValue, SyncDirection, SyncEdgeConfig};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的层级配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HierarchyBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 帧调度设置
    #[serde(default)]
    #[validate(nested)]
    pub runtime: RuntimeConfig,

    /// 节点列表 (父节点可以出现在子节点之后)
    #[validate(nested)]
    pub nodes: Vec<NodeConfig>,

    /// 同步边列表
    #[serde(default)]
    #[validate(nested)]
    pub edges: Vec<EdgeConfig>,

    /// 按帧执行的脚本步骤
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

/// 帧调度设置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RuntimeConfig {
    /// 每帧间隔 (毫秒)
    #[serde(default = "default_tick_interval_ms")]
    #[validate(range(min = 1))]
    pub tick_interval_ms: u64,

    /// 运行帧数上限
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

fn default_tick_interval_ms() -> u64 {
    16
}

fn default_max_ticks() -> u64 {
    60
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: default_max_ticks(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// 节点配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NodeConfig {
    /// 唯一标识符
    #[validate(length(min = 1))]
    pub id: String,

    /// 父节点 ID (None = 根节点)
    #[serde(default)]
    pub parent: Option<String>,

    /// 是否挂载参数存储
    #[serde(default = "default_true")]
    pub has_store: bool,

    /// 存储初始是否就绪
    #[serde(default = "default_true")]
    pub ready: bool,

    /// 每帧结束时自动清除已触发的 trigger
    #[serde(default)]
    pub auto_clear_triggers: bool,

    /// 本地声明的参数 (同时也是 bootstrap 时受保护的参数)
    #[serde(default)]
    pub params: Vec<ParamDecl>,
}

/// 本地参数声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: ParamName,

    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// 初始值 (省略时取类型默认值)
    #[serde(default)]
    pub value: Option<InitialValue>,
}

/// 初始值字面量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl ParamDecl {
    pub fn new(name: impl Into<ParamName>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            value: None,
        }
    }

    pub fn with_value(mut self, value: InitialValue) -> Self {
        self.value = Some(value);
        self
    }

    /// 将字面量解析为声明类型的值
    ///
    /// 整数字面量可用于 float 参数；其余类型不匹配返回描述信息。
    pub fn initial_value(&self) -> Result<ParamValue, String> {
        match (self.param_type, self.value) {
            (ParamType::Float, None) => Ok(ParamValue::Float(0.0)),
            (ParamType::Float, Some(InitialValue::Float(v))) => Ok(ParamValue::Float(v)),
            (ParamType::Float, Some(InitialValue::Int(v))) => Ok(ParamValue::Float(v as f64)),
            (ParamType::Int, None) => Ok(ParamValue::Int(0)),
            (ParamType::Int, Some(InitialValue::Int(v))) => Ok(ParamValue::Int(v)),
            (ParamType::Bool | ParamType::Trigger, None) => Ok(ParamValue::Bool(false)),
            (ParamType::Bool | ParamType::Trigger, Some(InitialValue::Bool(v))) => {
                Ok(ParamValue::Bool(v))
            }
            (ty, Some(value)) => Err(format!("value {value:?} is not a valid {ty}")),
        }
    }
}

/// 同步边配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EdgeConfig {
    /// 唯一标识符
    #[validate(length(min = 1))]
    pub id: String,

    /// 挂载该边的节点 ID
    #[validate(length(min = 1))]
    pub node: String,

    /// 同步方向
    pub direction: SyncDirection,

    /// 仅同步这些参数
    #[serde(default)]
    pub include: Vec<ParamName>,

    /// 同步除这些以外的全部参数
    #[serde(default)]
    pub exclude: Vec<ParamName>,

    /// 调试日志
    #[serde(default)]
    pub debug: bool,

    /// 启动后是否启用
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl EdgeConfig {
    /// 转换为引擎使用的边配置
    pub fn sync_config(&self) -> SyncEdgeConfig {
        SyncEdgeConfig {
            direction: self.direction,
            filter: FilterConfig {
                include: self.include.clone(),
                exclude: self.exclude.clone(),
            },
            debug: self.debug,
        }
    }
}

/// 脚本步骤：在指定帧执行一个动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub tick: u64,
    pub action: ScriptAction,
}

/// 脚本动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptAction {
    SetFloat {
        node: String,
        name: ParamName,
        value: f64,
    },
    SetInt {
        node: String,
        name: ParamName,
        value: i64,
    },
    SetBool {
        node: String,
        name: ParamName,
        value: bool,
    },
    FireTrigger {
        node: String,
        name: ParamName,
    },
    ClearTrigger {
        node: String,
        name: ParamName,
    },
    MarkReady {
        node: String,
    },
    EnableEdge {
        edge: String,
    },
    DisableEdge {
        edge: String,
    },
}

impl ScriptAction {
    /// 动作引用的节点 ID
    pub fn node(&self) -> Option<&str> {
        match self {
            ScriptAction::SetFloat { node, .. }
            | ScriptAction::SetInt { node, .. }
            | ScriptAction::SetBool { node, .. }
            | ScriptAction::FireTrigger { node, .. }
            | ScriptAction::ClearTrigger { node, .. }
            | ScriptAction::MarkReady { node } => Some(node),
            ScriptAction::EnableEdge { .. } | ScriptAction::DisableEdge { .. } => None,
        }
    }

    /// 动作引用的边 ID
    pub fn edge(&self) -> Option<&str> {
        match self {
            ScriptAction::EnableEdge { edge } | ScriptAction::DisableEdge { edge } => Some(edge),
            _ => None,
        }
    }
}
