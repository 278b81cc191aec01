//! # Taskboard API Server Library
//!
//! The hosted document store and authentication service behind Taskboard
//! clients.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `mailer`: Password reset mail delivery
//! - `middleware`: Response security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod routes;
