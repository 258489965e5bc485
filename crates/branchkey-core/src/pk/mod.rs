//! Primary key resolution for INSERT statements
//!
//! [`PkResolver`] decides where each primary key value of an insert comes
//! from; [`generated`] reads database-assigned values when the statement
//! itself does not carry them.

pub mod generated;
pub mod resolver;

pub use generated::{auto_increment_column, fetch_auto_keys, GeneratedKeyOptions};
pub use resolver::PkResolver;
