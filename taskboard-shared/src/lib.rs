//! # Taskboard Shared Library
//!
//! Types and logic shared by the Taskboard API server and client.
//!
//! ## Module Organization
//!
//! - `models`: Typed records (`users`, `tasks`), the document codec and accounts
//! - `store`: Document store and authentication service traits, in-memory store
//! - `auth`: Passwords, session tokens, provider tokens, ownership rules
//! - `db`: Postgres pool, migrations and the Postgres document store

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
