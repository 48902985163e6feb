/*!
Ingestion pipeline: normalize, filter, store, then distribute
*/

use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{
    context::ListenerContext,
    distributor::DeliveryOutcome,
    error::NormalizationError,
    event_store::UpsertOutcome,
    normalizer::EventNormalizer,
    record::{RawEventKind, RawNotification},
};

/// What happened to one raw event
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Stored {
        upsert: UpsertOutcome,
        delivery: DeliveryOutcome,
    },
    /// Source is not on the allow-list
    Filtered,
    /// Normalization failed; nothing was stored
    Dropped(NormalizationError),
    /// Removal events are not tracked
    Ignored,
}

/// Counters describing the pipeline since start
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub received: u64,
    pub stored: u64,
    pub replaced: u64,
    pub filtered: u64,
    pub dropped: u64,
    pub delivered: u64,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    stored: AtomicU64,
    replaced: AtomicU64,
    filtered: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
}

pub struct IngestionPipeline {
    context: ListenerContext,
    normalizer: EventNormalizer,
    counters: Counters,
}

impl IngestionPipeline {
    pub fn new(context: ListenerContext, normalizer: EventNormalizer) -> Self {
        Self {
            context,
            normalizer,
            counters: Counters::default(),
        }
    }

    /// Ingest one raw event captured now
    pub async fn ingest(&self, raw: &RawNotification) -> IngestOutcome {
        self.ingest_at(raw, chrono::Utc::now().timestamp_millis()).await
    }

    /// Ingest one raw event captured at `observed_at` (epoch ms).
    ///
    /// The record is stored before it is pushed, so a concurrent snapshot
    /// never lags behind what a subscriber has seen.
    pub async fn ingest_at(&self, raw: &RawNotification, observed_at: i64) -> IngestOutcome {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        if raw.event_type == RawEventKind::Removed {
            debug!("Ignoring removal of notification {:?} (removal tracking disabled)", raw.id);
            return IngestOutcome::Ignored;
        }

        let record = match self.normalizer.normalize(raw, observed_at) {
            Ok(record) => record,
            Err(e) => {
                warn!("Dropping notification from {:?}: {}", raw.package_name, e);
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                return IngestOutcome::Dropped(e);
            }
        };

        if !self.context.filter.accepts(&record.source_id).await {
            debug!("Filtered notification {} from {}", record.key, record.source_id);
            self.counters.filtered.fetch_add(1, Ordering::Relaxed);
            return IngestOutcome::Filtered;
        }

        let upsert = self.context.store.upsert(record.clone()).await;
        match upsert {
            UpsertOutcome::Inserted => self.counters.stored.fetch_add(1, Ordering::Relaxed),
            UpsertOutcome::Replaced(_) => self.counters.replaced.fetch_add(1, Ordering::Relaxed),
        };

        let delivery = self.context.distributor.push(&record).await;
        if delivery == DeliveryOutcome::Delivered {
            self.counters.delivered.fetch_add(1, Ordering::Relaxed);
        }

        info!(
            "Notification {} from {} ({:?}, {:?})",
            record.key, record.source_name, upsert, delivery
        );
        IngestOutcome::Stored { upsert, delivery }
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            received: self.counters.received.load(Ordering::Relaxed),
            stored: self.counters.stored.load(Ordering::Relaxed),
            replaced: self.counters.replaced.load(Ordering::Relaxed),
            filtered: self.counters.filtered.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
        }
    }
}
