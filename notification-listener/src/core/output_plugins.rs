/*!
Output handlers the subscriber forwards streamed notifications to
*/

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::core::{
    config::{OutputConfig, OutputPlugin, TerminalFormat},
    error::BoxError,
    record::NotificationRecord,
};

/// Trait for output plugins
#[async_trait]
pub trait OutputHandler: Send {
    /// Name of the output handler
    fn name(&self) -> &'static str;

    /// Initialize the output handler (create files, connections, etc.)
    async fn initialize(&mut self) -> Result<(), BoxError>;

    /// Handle one streamed notification
    async fn handle_notification(&mut self, record: &NotificationRecord) -> Result<(), BoxError>;

    /// Cleanup/finalize the output handler
    async fn finalize(&mut self) -> Result<(), BoxError>;
}

/// Manages multiple output handlers
pub struct OutputManager {
    handlers: Vec<Box<dyn OutputHandler>>,
}

impl OutputManager {
    pub fn new(configs: &[OutputConfig]) -> Self {
        let mut handlers: Vec<Box<dyn OutputHandler>> = Vec::new();

        for config in configs {
            if !config.enabled {
                continue;
            }

            let handler: Box<dyn OutputHandler> = match &config.plugin {
                OutputPlugin::Json { path, pretty } => {
                    Box::new(JsonOutputHandler::new(path.clone(), *pretty))
                }
                OutputPlugin::Webhook { url, auth_token } => {
                    Box::new(WebhookOutputHandler::new(url.clone(), auth_token.clone()))
                }
                OutputPlugin::Terminal { format } => {
                    Box::new(TerminalOutputHandler::new(*format))
                }
            };

            handlers.push(handler);
        }

        info!("Initialized output manager with {} handlers", handlers.len());
        Self { handlers }
    }

    pub fn with_handlers(handlers: Vec<Box<dyn OutputHandler>>) -> Self {
        Self { handlers }
    }

    /// Initialize all handlers
    pub async fn initialize(&mut self) -> Result<(), BoxError> {
        for handler in &mut self.handlers {
            handler.initialize().await?;
            info!("Initialized output handler: {}", handler.name());
        }
        Ok(())
    }

    /// Send a notification to all enabled handlers
    pub async fn handle_notification(&mut self, record: &NotificationRecord) {
        for handler in &mut self.handlers {
            if let Err(e) = handler.handle_notification(record).await {
                error!("Handler {} failed to process notification {}: {}",
                       handler.name(), record.key, e);
            }
        }
    }

    /// Finalize all handlers
    pub async fn finalize(&mut self) -> Result<(), BoxError> {
        for handler in &mut self.handlers {
            handler.finalize().await?;
        }
        Ok(())
    }

    /// Consume a subscription until it ends, forwarding every record.
    /// Returns how many records were forwarded.
    pub async fn run<S>(&mut self, stream: S) -> u64
    where
        S: Stream<Item = String> + Unpin,
    {
        let mut stream = stream;
        let mut forwarded = 0;

        while let Some(payload) = stream.next().await {
            match serde_json::from_str::<NotificationRecord>(&payload) {
                Ok(record) => {
                    self.handle_notification(&record).await;
                    forwarded += 1;
                }
                Err(e) => warn!("Skipping undecodable stream payload: {}", e),
            }
        }

        debug!("Subscription ended after {} record(s)", forwarded);
        forwarded
    }
}

/// JSON-lines file output handler
pub struct JsonOutputHandler {
    file_path: std::path::PathBuf,
    pretty: bool,
    file: Option<tokio::fs::File>,
}

impl JsonOutputHandler {
    pub fn new(file_path: std::path::PathBuf, pretty: bool) -> Self {
        Self {
            file_path,
            pretty,
            file: None,
        }
    }
}

#[async_trait]
impl OutputHandler for JsonOutputHandler {
    fn name(&self) -> &'static str {
        "JSON"
    }

    async fn initialize(&mut self) -> Result<(), BoxError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        self.file = Some(OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .await?);
        Ok(())
    }

    async fn handle_notification(&mut self, record: &NotificationRecord) -> Result<(), BoxError> {
        if let Some(ref mut file) = self.file {
            let mut json_str = if self.pretty {
                serde_json::to_string_pretty(record)?
            } else {
                serde_json::to_string(record)?
            };
            json_str.push('\n');

            file.write_all(json_str.as_bytes()).await?;
            file.flush().await?;
        }
        Ok(())
    }

    async fn finalize(&mut self) -> Result<(), BoxError> {
        if let Some(ref mut file) = self.file {
            file.flush().await?;
        }
        Ok(())
    }
}

/// Webhook output handler
pub struct WebhookOutputHandler {
    url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl WebhookOutputHandler {
    pub fn new(url: String, auth_token: Option<String>) -> Self {
        Self {
            url,
            auth_token,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self) -> reqwest::RequestBuilder {
        let request = self.client.post(&self.url);
        match self.auth_token {
            Some(ref token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

#[async_trait]
impl OutputHandler for WebhookOutputHandler {
    fn name(&self) -> &'static str {
        "Webhook"
    }

    async fn initialize(&mut self) -> Result<(), BoxError> {
        // Probe the endpoint; a dead webhook should not stop the listener
        let probe = serde_json::json!({
            "test": true,
            "timestamp": chrono::Utc::now().timestamp_millis()
        });

        match self.request().json(&probe).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!("Webhook probe returned {}", response.status());
            }
            Ok(_) => {}
            Err(e) => warn!("Webhook probe failed: {}", e),
        }
        Ok(())
    }

    async fn handle_notification(&mut self, record: &NotificationRecord) -> Result<(), BoxError> {
        let response = self.request().json(record).send().await?;

        if !response.status().is_success() {
            return Err(format!("Webhook delivery failed: {}", response.status()).into());
        }

        Ok(())
    }

    async fn finalize(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Terminal output handler. Writes to stderr; stdout carries the command channel.
pub struct TerminalOutputHandler {
    format: TerminalFormat,
}

impl TerminalOutputHandler {
    pub fn new(format: TerminalFormat) -> Self {
        Self { format }
    }

    fn format_notification(&self, record: &NotificationRecord) -> String {
        let posted = chrono::DateTime::from_timestamp_millis(record.post_time)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        match self.format {
            TerminalFormat::Plain => {
                format!(
                    "NOTIFICATION {} from {} ({}) at {}\n{}\n{}",
                    record.key,
                    record.source_name,
                    record.source_id,
                    posted,
                    record.title,
                    record.text
                )
            }
            TerminalFormat::Colored => {
                format!(
                    "\x1b[32m🔔 {}\x1b[0m \x1b[2m({})\x1b[0m\n\
                     \x1b[36m⏰ Posted:\x1b[0m {}\n\
                     \x1b[36m📝 Title:\x1b[0m {}\n\
                     \x1b[36m💬 Text:\x1b[0m {}",
                    record.source_name,
                    record.source_id,
                    posted,
                    record.title,
                    record.text
                )
            }
            TerminalFormat::Json => {
                serde_json::to_string_pretty(record).unwrap_or_else(|_| "JSON serialization failed".to_string())
            }
        }
    }
}

#[async_trait]
impl OutputHandler for TerminalOutputHandler {
    fn name(&self) -> &'static str {
        "Terminal"
    }

    async fn initialize(&mut self) -> Result<(), BoxError> {
        match self.format {
            TerminalFormat::Colored => {
                eprintln!("\x1b[32m🚀 Notification Listener Started\x1b[0m");
            }
            _ => {
                eprintln!("🚀 Notification Listener Started");
            }
        }
        Ok(())
    }

    async fn handle_notification(&mut self, record: &NotificationRecord) -> Result<(), BoxError> {
        eprintln!("{}", self.format_notification(record));
        eprintln!();
        Ok(())
    }

    async fn finalize(&mut self) -> Result<(), BoxError> {
        match self.format {
            TerminalFormat::Colored => {
                eprintln!("\x1b[33m🏁 Notification Listener Stopped\x1b[0m");
            }
            _ => {
                eprintln!("🏁 Notification Listener Stopped");
            }
        }
        Ok(())
    }
}
