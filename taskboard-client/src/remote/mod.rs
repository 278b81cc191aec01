/// Remote Store Client implementations
///
/// Both types implement [`DocumentStore`](taskboard_shared::store::DocumentStore)
/// and [`AuthService`](taskboard_shared::store::AuthService):
///
/// - [`HttpRemote`]: the hosted Taskboard API over HTTP
/// - [`MemoryRemote`]: in-process accounts and documents, for tests and offline demos
///
/// Each operation is one awaited request. Failures come back as
/// [`StoreError`](taskboard_shared::store::StoreError) and are never retried.

pub mod http;
pub mod memory;

pub use http::HttpRemote;
pub use memory::MemoryRemote;
