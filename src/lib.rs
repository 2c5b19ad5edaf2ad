//! PG MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to query a PostgreSQL database. Submitted SQL is validated against a
//! restrictive read-only policy before execution; see [`validator`].

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;
pub mod validator;

pub use config::Config;
pub use error::PgError;
pub use mcp::PgService;
pub use validator::{SecurityMode, ValidationOutcome, validate};
