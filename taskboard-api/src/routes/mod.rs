/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Sign-in, registration, refresh and password reset
/// - `documents`: Per-user document CRUD and queries

pub mod auth;
pub mod documents;
pub mod health;
