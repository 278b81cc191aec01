/// Middleware modules for the API server
///
/// Bearer-token authentication lives in `taskboard_shared::auth::middleware`.

pub mod security;
