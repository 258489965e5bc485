// branchkey
//
// Primary-key resolution and table-schema caching for INSERT statements that
// run inside a distributed-transaction branch. The resolved key values feed
// the undo log that rolls the branch back.

pub mod context;
pub mod logging;

pub use context::{load_config, RmContext};

pub use branchkey_commons;
pub use branchkey_configs;
pub use branchkey_core;
