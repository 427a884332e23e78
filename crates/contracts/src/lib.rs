//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Parameter Model
//! - A parameter's type is fixed once it exists in a store
//! - Triggers are booleans in storage, with dedicated set/clear events

mod blueprint;
mod error;
mod param;
mod runtime;
mod store;
mod sync_edge;
mod update;

pub use blueprint::*;
pub use error::*;
pub use param::{ParamName, ParamType, ParamValue};
pub use runtime::*;
pub use store::{NotifyPolicy, ParameterStore, RequirePolicy, WriteOptions};
pub use sync_edge::*;
pub use update::*;
