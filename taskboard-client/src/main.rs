//! # Taskboard Client
//!
//! Line-oriented terminal front end for the Taskboard API.
//!
//! ## Usage
//!
//! ```bash
//! TASKBOARD_API_URL=http://localhost:8080 cargo run -p taskboard-client
//! ```
//!
//! Type `help` for the command list. The refresh token is kept in the
//! configured session file so the next run resumes the session.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use taskboard_client::accounts::Accounts;
use taskboard_client::config::ClientConfig;
use taskboard_client::dashboard::Dashboard;
use taskboard_client::error::SyncResult;
use taskboard_client::notify::Notifier;
use taskboard_client::profile::{ImageFile, ProfileDisplay};
use taskboard_client::remote::HttpRemote;
use taskboard_client::session::Navigator;
use taskboard_client::tasks::FilterMode;
use taskboard_shared::store::ProviderCredential;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rotate the access token when it has less than this left
const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

const HELP: &str = "\
Commands:
  login <email> <password>            sign in
  google <id-token>                   sign in with Google
  register <name> <email> <password>  create an account
  reset <email>                       send a password reset link
  logout                              sign out
  list                                show tasks under the current filter
  add <text>                          add a task (even while editing)
  edit <n>                            start editing task n
  update <text>                       save the edit
  cancel                              abandon the edit
  toggle <n>                          flip task n
  rm <n>                              delete task n
  filter all|active|completed         change the filter
  upload <path>                       upload a profile picture (max 1MB)
  profile                             show account information
  quit                                exit";

struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&self, message: &str) {
        println!("!! {}", message);
    }

    fn toast(&self, message: &str) {
        println!("-- {}", message);
    }
}

struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect_to_entry(&self) {
        println!("Not signed in. Use `login`, `google` or `register`.");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::load()?;
    tracing::info!(api_url = %config.api_url, "Taskboard client v{} starting", env!("CARGO_PKG_VERSION"));

    let remote = Arc::new(HttpRemote::from_config(&config)?);
    let notifier = Arc::new(TerminalNotifier);
    let accounts = Accounts::new(remote.clone(), remote.clone(), notifier.clone());
    let mut dashboard = Dashboard::new(remote.clone(), remote.clone(), notifier, Arc::new(TerminalNavigator));

    let stored = tokio::fs::read_to_string(&config.session_file).await.ok();
    if let Err(e) = remote.restore_session(stored.as_deref().map(str::trim)).await {
        println!("-- Could not resume session: {}", e);
    }
    // The refresh endpoint rotates the token pair
    if remote.refresh_token().await.as_deref() != stored.as_deref().map(str::trim) {
        persist_session(&remote, &config.session_file).await;
    }
    if let Ok(Some(user)) = dashboard.start().await {
        println!("Signed in as {}", user.email);
        print_tasks(&dashboard);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let args: Vec<&str> = rest.split_whitespace().collect();

        if let Err(e) = remote.refresh_if_expiring(REFRESH_MARGIN).await {
            tracing::warn!(error = %e, "Could not refresh session");
        }
        let token_before = remote.refresh_token().await;

        // Errors were already reported through the notifier
        let _: SyncResult<()> = match (command, args.as_slice()) {
            ("", _) => Ok(()),
            ("help", _) => {
                println!("{}", HELP);
                Ok(())
            }
            ("quit" | "exit", _) => break,
            ("login", [email, password]) => accounts.sign_in_with_password(email, password).await.map(drop),
            ("google", [token]) => accounts
                .sign_in_with_provider(ProviderCredential::google(*token))
                .await
                .map(drop),
            ("register", [name, email, password]) => accounts.register(name, email, password).await.map(drop),
            ("reset", [email]) => accounts.send_password_reset(email).await,
            ("logout", []) => accounts.sign_out().await,
            ("list", []) => {
                print_tasks(&dashboard);
                Ok(())
            }
            ("add", _) if !rest.trim().is_empty() => dashboard.add(rest.trim()).await,
            ("update", _) if !rest.trim().is_empty() => {
                if dashboard.tasks().and_then(|tasks| tasks.editing()).is_none() {
                    println!("Nothing is being edited. Use `edit <n>` first.");
                    Ok(())
                } else {
                    match dashboard.set_input(rest.trim()) {
                        Ok(()) => dashboard.submit().await,
                        Err(e) => Err(e),
                    }
                }
            }
            ("edit", [n]) => match n.parse() {
                Ok(index) => dashboard.begin_edit(index).map(|()| {
                    if let Some(tasks) = dashboard.tasks() {
                        println!("Editing: {}", tasks.input());
                    }
                }),
                Err(_) => usage(),
            },
            ("cancel", []) => dashboard.cancel_edit(),
            ("toggle", [n]) => match n.parse() {
                Ok(index) => dashboard.toggle_completion(index).await,
                Err(_) => usage(),
            },
            ("rm", [n]) => match n.parse() {
                Ok(index) => dashboard.remove(index).await,
                Err(_) => usage(),
            },
            ("filter", [mode]) => match mode.parse::<FilterMode>() {
                Ok(mode) => {
                    dashboard.set_filter(mode);
                    print_tasks(&dashboard);
                    Ok(())
                }
                Err(e) => {
                    println!("{}", e);
                    Ok(())
                }
            },
            ("upload", [path]) => upload(&mut dashboard, Path::new(path)).await,
            ("profile", []) => {
                print_profile(&dashboard);
                Ok(())
            }
            _ => usage(),
        };

        let _ = dashboard.poll_session().await;
        if remote.refresh_token().await != token_before {
            persist_session(&remote, &config.session_file).await;
        }
        if matches!(command, "add" | "update" | "toggle" | "rm" | "login" | "google" | "register") {
            print_tasks(&dashboard);
        }
    }

    tracing::info!("Exiting");
    Ok(())
}

fn usage() -> SyncResult<()> {
    println!("Unknown command. Type `help` for the command list.");
    Ok(())
}

async fn upload(dashboard: &mut Dashboard, path: &Path) -> SyncResult<()> {
    match ImageFile::read(path).await {
        Ok(file) => {
            dashboard.select_image(file)?;
            let result = dashboard.upload_profile_image().await.map(drop);
            if let Some(message) = dashboard.profile().and_then(|p| p.error_message()) {
                println!("{}", message);
            }
            result
        }
        Err(e) => {
            println!("Could not read {}: {}", path.display(), e);
            Ok(())
        }
    }
}

async fn persist_session(remote: &HttpRemote, path: &Path) {
    let result = match remote.refresh_token().await {
        Some(token) => tokio::fs::write(path, token).await,
        None => match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        },
    };

    if let Err(e) = result {
        tracing::warn!(path = %path.display(), error = %e, "Failed to update session file");
    }
}

fn print_tasks(dashboard: &Dashboard) {
    let Some(tasks) = dashboard.tasks() else {
        return;
    };

    for (index, task) in dashboard.visible_tasks() {
        let mark = if task.completed { "x" } else { " " };
        let editing = if tasks.editing() == Some(index) { " (editing)" } else { "" };
        println!("{:>3} [{}] {}{}", index, mark, task.text, editing);
    }
    println!("{} ({} filter)", dashboard.remaining_label(), dashboard.filter());
}

fn print_profile(dashboard: &Dashboard) {
    let (Some(user), Some(profile)) = (dashboard.user(), dashboard.profile()) else {
        println!("Not signed in.");
        return;
    };

    println!("Email: {}", user.email);
    println!("UID: {}", user.uid);
    match profile.display() {
        ProfileDisplay::Image { data_uri } => println!("Picture: {} bytes of data URI", data_uri.len()),
        ProfileDisplay::Placeholder => println!("Picture: (none)"),
    }
}
