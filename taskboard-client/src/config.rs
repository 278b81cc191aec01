/// Client configuration
///
/// Settings are layered, later sources winning:
///
/// 1. Built-in defaults
/// 2. `taskboard.toml` in the working directory (optional)
/// 3. `TASKBOARD_*` environment variables (`.env` is loaded first when present)
///
/// # Settings
///
/// | Key                    | Env var                          | Default                 |
/// |------------------------|----------------------------------|-------------------------|
/// | `api_url`              | `TASKBOARD_API_URL`              | `http://localhost:8080` |
/// | `request_timeout_secs` | `TASKBOARD_REQUEST_TIMEOUT_SECS` | `30`                    |
/// | `session_file`         | `TASKBOARD_SESSION_FILE`         | `.taskboard-session`    |
///
/// # Example
///
/// ```no_run
/// use taskboard_client::config::ClientConfig;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = ClientConfig::load()?;
/// println!("Talking to {}", config.api_url);
/// # Ok(())
/// # }
/// ```

use config::{Config, ConfigError, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default configuration file name (extension is inferred)
pub const CONFIG_FILE: &str = "taskboard";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TASKBOARD";

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the Taskboard API
    pub api_url: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Where the refresh token is kept between runs
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Loads configuration from defaults, `taskboard.toml` and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a value has the
    /// wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_sources(
            File::with_name(CONFIG_FILE).required(false),
            Environment::with_prefix(ENV_PREFIX),
        )
    }

    /// Builds configuration from explicit file and environment sources
    pub fn from_sources(
        file: File<FileSourceFile, FileFormat>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("api_url", "http://localhost:8080")?
            .set_default("request_timeout_secs", 30)?
            .set_default("session_file", ".taskboard-session")?
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
