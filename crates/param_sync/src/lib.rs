//! # Param Sync
//!
//! 节点层级间的双向参数同步。
//!
//! 负责：
//! - 父 -> 子：就绪后一次性 bootstrap 对齐，之后增量同步（跳过本地声明的参数）
//! - 子 -> 父：仅增量同步，trigger 的清除不向上传播
//! - include / exclude 参数过滤
//! - 边的生命周期（start / enable / disable）
//! - 深度优先的事件分发与同步环检测
//!
//! ## 使用示例
//!
//! ```ignore
//! use param_sync::{HostBuilder, Script};
//!
//! let (mut host, graph) = HostBuilder::from_blueprint(&blueprint)?;
//! let script = Script::new(&blueprint.script);
//! host.start();
//!
//! for tick in 1..=blueprint.runtime.max_ticks {
//!     script.run_tick(tick, &mut host, &graph)?;
//!     let report = host.tick();
//! }
//! ```

mod builder;
mod engine;
mod filter;
mod from_parent;
mod host;
mod lifecycle;
mod protocol;
mod script;
mod store;
mod to_parent;
mod world;

pub use builder::HostBuilder;
pub use engine::{EdgeEngine, Propagation};
pub use filter::FilterSpec;
pub use from_parent::SyncFromParent;
pub use host::SyncHost;
pub use lifecycle::{LifecycleAction, LifecycleBinder};
pub use protocol::{apply_snapshot_entry, apply_update, forwards_upward, snapshot_to_update};
pub use script::{apply_action, Script};
pub use store::MemoryStore;
pub use to_parent::SyncToParent;
pub use world::World;

// Re-export contracts types
pub use contracts::{
    EdgeReport, EdgeState, EdgeStats, ParamUpdate, PropagationStats, SyncDirection,
    SyncEdgeConfig, TickReport,
};
