/*!
Configuration management for the notification listener
*/

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::core::error::BoxError;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Notification feed settings
    pub feed: FeedConfig,
    /// Installed application catalog settings
    pub catalog: CatalogConfig,
    /// Log output settings
    pub logging: LoggingConfig,
    /// Where the subscriber forwards streamed notifications
    pub outputs: Vec<OutputConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// JSON-lines spool the platform appends raw notifications to
    pub spool_path: PathBuf,
    /// Spool polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Maximum number of lines to ingest per poll
    pub max_batch_size: usize,
    /// Skip whatever the spool already holds at startup
    pub start_at_end: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directories searched for `.desktop` entries
    pub desktop_dirs: Vec<PathBuf>,
    /// Whether `NoDisplay`/`Hidden` entries are listed
    pub include_hidden: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Output plugin type
    pub plugin: OutputPlugin,
    /// Whether this output is enabled
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub enum OutputPlugin {
    Json { path: PathBuf, pretty: bool },
    Webhook { url: String, auth_token: Option<String> },
    Terminal { format: TerminalFormat },
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub enum TerminalFormat {
    Plain,
    Colored,
    Json,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for FeedConfig {
    fn default() -> Self {
        let spool_path = dirs::data_local_dir()
            .map(|dir| dir.join("notification-listener").join("feed.jsonl"))
            .unwrap_or_else(|| PathBuf::from("./feed.jsonl"));

        Self {
            spool_path,
            poll_interval_ms: 500,
            max_batch_size: 100,
            start_at_end: false,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let mut desktop_dirs = vec![
            PathBuf::from("/usr/share/applications"),
            PathBuf::from("/usr/local/share/applications"),
        ];
        if let Some(data_dir) = dirs::data_dir() {
            desktop_dirs.push(data_dir.join("applications"));
        }

        Self {
            desktop_dirs,
            include_hidden: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            catalog: CatalogConfig::default(),
            logging: LoggingConfig::default(),
            outputs: vec![OutputConfig {
                plugin: OutputPlugin::Terminal {
                    format: TerminalFormat::Colored,
                },
                enabled: true,
            }],
        }
    }
}

impl ListenerConfig {
    /// Load a TOML config file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BoxError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, BoxError> {
        Ok(toml::from_str(content)?)
    }
}
