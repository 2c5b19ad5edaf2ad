//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection pool management
//! - Query execution and result shaping
//! - Schema introspection
//! - Type mappings

pub mod executor;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::Database;
pub use schema::SchemaInspector;
