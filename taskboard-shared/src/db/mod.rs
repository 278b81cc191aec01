/// Database layer for Taskboard
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Embedded migration runner
/// - `documents`: [`DocumentStore`](crate::store::DocumentStore) over the `documents` table
///
/// Account queries live on [`Account`](crate::models::account::Account).

pub mod documents;
pub mod migrations;
pub mod pool;
