/*!
Composition root that wires the feed, pipeline and facade together
*/

use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::core::{
    config::ListenerConfig,
    context::ListenerContext,
    error::BoxError,
    event_system::{FeedEvent, FeedMonitor},
    facade::NotificationFacade,
    normalizer::EventNormalizer,
    pipeline::{IngestionPipeline, PipelineStats},
};
use crate::platform::{Host, access::SpoolAccess, desktop_entries::DesktopEntryCatalog};

/// Main listener that owns the shared state and drives ingestion
pub struct NotificationTracker {
    config: ListenerConfig,
    context: ListenerContext,
    pipeline: Arc<IngestionPipeline>,
    facade: NotificationFacade,
}

impl NotificationTracker {
    /// Create a listener around the given platform collaborators
    pub fn new(config: ListenerConfig, host: Host) -> Self {
        info!("Initializing notification listener...");

        let context = ListenerContext::new();
        let normalizer = EventNormalizer::new(host.resolver.clone());
        let pipeline = Arc::new(IngestionPipeline::new(context.clone(), normalizer));
        let facade = NotificationFacade::new(context.clone(), host, pipeline.clone());

        Self {
            config,
            context,
            pipeline,
            facade,
        }
    }

    /// Create a listener backed by the desktop platform
    pub fn from_config(config: ListenerConfig) -> Self {
        let host = platform_host(&config);
        Self::new(config, host)
    }

    pub fn facade(&self) -> NotificationFacade {
        self.facade.clone()
    }

    pub fn pipeline(&self) -> Arc<IngestionPipeline> {
        self.pipeline.clone()
    }

    pub fn context(&self) -> &ListenerContext {
        &self.context
    }

    /// Run the ingestion loop until the feed stream ends
    pub async fn start(&self) -> Result<(), BoxError> {
        info!("🚀 Starting notification listener...");
        info!("📥 Feed: {:?}", self.config.feed.spool_path);
        info!("🗂  Catalog dirs: {:?}", self.config.catalog.desktop_dirs);

        let events = FeedMonitor::new(self.config.feed.clone()).start().await;
        tokio::pin!(events);

        while let Some(event) = events.next().await {
            self.handle_event(event).await;
        }

        info!("🏁 Notification feed ended");
        Ok(())
    }

    /// Handle a single feed event. Nothing here is fatal to the loop.
    pub async fn handle_event(&self, event: FeedEvent) {
        match event {
            FeedEvent::Notification(raw) => {
                let outcome = self.pipeline.ingest(&raw).await;
                debug!("Ingest outcome: {:?}", outcome);
            }
            FeedEvent::Malformed { line, error } => {
                warn!("⚠️ Skipping malformed feed line ({}): {}", error, line);
            }
            FeedEvent::MonitoringError(error) => {
                error!("⚠️ Feed monitoring error: {}", error);
            }
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.pipeline.stats()
    }

    /// Detach the subscriber so its stream ends, and report totals
    pub async fn shutdown(&self) {
        info!("🛑 Initiating graceful shutdown...");
        self.context.distributor.unsubscribe().await;

        let stats = self.stats();
        info!(
            "📈 Received {}, stored {}, replaced {}, filtered {}, dropped {}, delivered {}",
            stats.received, stats.stored, stats.replaced, stats.filtered, stats.dropped, stats.delivered
        );
    }
}

/// Platform collaborators for a desktop session
pub fn platform_host(config: &ListenerConfig) -> Host {
    let catalog = Arc::new(DesktopEntryCatalog::load(&config.catalog));
    Host {
        access: Arc::new(SpoolAccess::new(config.feed.spool_path.clone())),
        catalog: catalog.clone(),
        resolver: catalog,
    }
}

/// Helper function to create a listener from a config file
pub async fn create_tracker_from_config_file<P: AsRef<std::path::Path>>(
    config_path: P,
) -> Result<NotificationTracker, BoxError> {
    let config = ListenerConfig::from_file(config_path).await?;
    Ok(NotificationTracker::from_config(config))
}
