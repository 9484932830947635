//! Database layer (SQLite).

pub mod schema;
pub mod store;

pub use store::{ActivityStore, StoreTransaction};

/// Table names as constants.
pub mod tables {
    pub const SCHEMA_VERSION: &str = "schema_version";
}
