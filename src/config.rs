use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings; every field can also come from the environment
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Run the resident HTTP server instead of a single search
    #[arg(long)]
    pub webui: bool,

    /// Show the browser window
    #[arg(long)]
    pub nonheadless: bool,

    /// Server port
    #[arg(long, env = "SCOUT_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding areas.json, unitTypes.json and sortBy.json
    #[arg(long = "data-dir", env = "SCOUT_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Where a one-shot search writes its listings
    #[arg(long, env = "SCOUT_OUTPUT", default_value = "output.json")]
    pub output: PathBuf,

    /// Where the intercepted request log is written
    #[arg(long = "requests-log", env = "SCOUT_REQUESTS_LOG", default_value = "requests.json")]
    pub requests_log: PathBuf,

    /// Site root the search URL is built on
    #[arg(long = "base-url", env = "SCOUT_BASE_URL", default_value = "https://streeteasy.com/")]
    pub base_url: String,

    /// Navigation timeout in seconds
    #[arg(long = "navigation-timeout", env = "SCOUT_NAVIGATION_TIMEOUT", default_value_t = 30)]
    pub navigation_timeout_secs: u64,
}

impl Settings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
