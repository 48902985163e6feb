/*!
Event source for raw notifications: tails the platform's JSON-lines spool
*/

use std::io::{ErrorKind, SeekFrom};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio::time::MissedTickBehavior;
use tokio_stream::{Stream, StreamExt, wrappers::IntervalStream};
use tracing::{debug, error, info, warn};

use crate::core::{config::FeedConfig, record::RawNotification};

/// Events emitted by the feed monitor
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A raw notification line was read
    Notification(RawNotification),
    /// A complete line that is not a raw notification
    Malformed { line: String, error: String },
    /// The spool could not be read this tick
    MonitoringError(String),
}

/// Polls the spool for appended lines.
///
/// Only complete lines are consumed; a trailing partial line is picked up on
/// a later tick. Each tick reads no further than the lines it consumes, and
/// always consumes at least one line when one is available. A spool that shrinks is treated as truncated and re-read
/// from the start.
pub struct FeedMonitor {
    config: FeedConfig,
    offset: u64,
}

impl FeedMonitor {
    pub fn new(config: FeedConfig) -> Self {
        Self { config, offset: 0 }
    }

    /// Turn the monitor into an endless stream of feed events
    pub async fn start(mut self) -> impl Stream<Item = FeedEvent> {
        let period = Duration::from_millis(self.config.poll_interval_ms.max(1));
        info!(
            "Watching notification feed {:?} every {:?}",
            self.config.spool_path, period
        );
        if self.config.start_at_end {
            self.skip_existing().await;
        }

        async_stream::stream! {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks = IntervalStream::new(interval);

            while ticks.next().await.is_some() {
                match self.check_for_changes().await {
                    Ok(events) => {
                        for event in events {
                            yield event;
                        }
                    }
                    Err(e) => {
                        error!("Feed monitoring error: {}", e);
                        yield FeedEvent::MonitoringError(e.to_string());
                    }
                }
            }
        }
    }

    async fn skip_existing(&mut self) {
        match tokio::fs::metadata(&self.config.spool_path).await {
            Ok(metadata) => {
                self.offset = metadata.len();
                debug!("Skipping {} existing bytes of the feed", self.offset);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Could not stat feed spool: {}", e),
        }
    }

    async fn check_for_changes(&mut self) -> std::io::Result<Vec<FeedEvent>> {
        let current_size = match tokio::fs::metadata(&self.config.spool_path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e),
        };

        if current_size < self.offset {
            info!("Feed spool truncated ({} -> {} bytes), rereading", self.offset, current_size);
            self.offset = 0;
        }
        if current_size == self.offset {
            return Ok(vec![]);
        }

        let mut file = tokio::fs::File::open(&self.config.spool_path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut reader = BufReader::new(file.take(current_size - self.offset));
        let max_batch_size = self.config.max_batch_size.max(1);

        let mut events = Vec::new();
        let mut consumed = 0usize;
        let mut line = Vec::new();
        while events.len() < max_batch_size {
            line.clear();
            let read = reader.read_until(b'\n', &mut line).await?;
            if read == 0 || !line.ends_with(b"\n") {
                break;
            }
            consumed += read;

            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            match serde_json::from_str::<RawNotification>(text) {
                Ok(raw) => events.push(FeedEvent::Notification(raw)),
                Err(e) => events.push(FeedEvent::Malformed {
                    line: text.to_string(),
                    error: e.to_string(),
                }),
            }
        }

        debug!("Read {} feed event(s) from {} bytes", events.len(), consumed);
        self.offset += consumed as u64;
        Ok(events)
    }
}
