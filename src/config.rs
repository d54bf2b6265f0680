use crate::core::get_config_dir;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct HttpConfig {
    /// Skip TLS certificate verification (same as `-k`)
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout. Unset by default: Jenkins may keep a
    /// progressive-text request open for as long as the build runs.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StreamConfig {
    /// Pause before refetching after a chunk that was empty but promised more data
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Program to pipe the log into, e.g. `lnav`
    #[serde(default)]
    pub viewer: Option<String>,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            insecure: false,
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: None,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            viewer: None,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl StreamConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

pub fn load_config(config_path: Option<&PathBuf>) -> Result<Config, config::ConfigError> {
    let mut config_vec = vec![];

    // User-provided config file
    if let Some(config_path) = config_path {
        if config_path.exists() {
            config_vec.push(config_path.clone());
        } else {
            eprintln!("Warning: Config file {config_path:?} not found.");
        }
    }

    // Default config file
    if let Ok(default_config_path) = get_config_dir().map(|d| d.join("jwatch.toml")) {
        if default_config_path.exists() {
            config_vec.push(default_config_path);
        }
    }

    load_from_files(&config_vec)
}

fn load_from_files(paths: &[PathBuf]) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder();
    let settings = paths.iter().fold(settings, |s, path| {
        s.add_source(config::File::from(path.as_path()))
    });

    settings
        .add_source(
            config::Environment::with_prefix("JWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
