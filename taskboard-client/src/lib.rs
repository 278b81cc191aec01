//! # Taskboard Client Library
//!
//! Keeps a user's task list and profile picture in step with the Taskboard
//! document store.
//!
//! ## Modules
//!
//! - `remote`: Remote Store Client (HTTP and in-memory)
//! - `session`: Session Gate driven by the auth-state observer
//! - `tasks`: Task Sync (load, add, edit, toggle, remove, filter)
//! - `profile`: Profile Sync (size-capped base64 profile picture)
//! - `accounts`: Sign-in, registration and password reset flows
//! - `dashboard`: Task page controller tying the above together
//! - `notify`: Alerts and toasts
//! - `config`: Layered client configuration
//! - `error`: Client error taxonomy
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use taskboard_client::accounts::Accounts;
//! use taskboard_client::dashboard::Dashboard;
//! use taskboard_client::notify::LogNotifier;
//! use taskboard_client::remote::MemoryRemote;
//! use taskboard_client::session::RecordingNavigator;
//!
//! # async fn example() -> Result<(), taskboard_client::error::SyncError> {
//! let remote = Arc::new(MemoryRemote::new());
//! let notifier = Arc::new(LogNotifier);
//!
//! let accounts = Accounts::new(remote.clone(), remote.clone(), notifier.clone());
//! accounts.register("Ada", "ada@example.com", "secret1").await?;
//!
//! let mut dashboard = Dashboard::new(
//!     remote.clone(),
//!     remote.clone(),
//!     notifier,
//!     Arc::new(RecordingNavigator::new()),
//! );
//! dashboard.start().await?;
//! dashboard.set_input("buy milk")?;
//! dashboard.submit().await?;
//!
//! assert_eq!(dashboard.remaining_label(), "1 tasks remaining");
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod profile;
pub mod remote;
pub mod session;
pub mod tasks;
