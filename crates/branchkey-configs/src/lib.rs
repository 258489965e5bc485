//! branchkey-configs
//!
//! Resource-manager configuration types and loader for branchkey.

pub mod config;

pub use config::*;
pub use config::defaults;
