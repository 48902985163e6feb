/*!
Conversion of raw platform events into canonical notification records
*/

use std::sync::Arc;
use tracing::debug;

use crate::core::{
    error::{NormalizationError, ResolveError},
    record::{EventType, NotificationKey, NotificationRecord, RawNotification},
};

/// Looks up a human-readable name for a source identifier
pub trait SourceResolver: Send + Sync {
    fn resolve_name(&self, source_id: &str) -> Result<String, ResolveError>;
}

/// Resolver that knows no names; every source falls back to its id
pub struct NoopResolver;

impl SourceResolver for NoopResolver {
    fn resolve_name(&self, source_id: &str) -> Result<String, ResolveError> {
        Err(ResolveError::UnknownSource(source_id.to_string()))
    }
}

pub struct EventNormalizer {
    resolver: Arc<dyn SourceResolver>,
}

impl EventNormalizer {
    pub fn new(resolver: Arc<dyn SourceResolver>) -> Self {
        Self { resolver }
    }

    /// Map a raw event to a record captured at `observed_at` (epoch ms).
    ///
    /// Missing title/text become empty strings. A failed name lookup only
    /// degrades `source_name` to the source id.
    pub fn normalize(
        &self,
        raw: &RawNotification,
        observed_at: i64,
    ) -> Result<NotificationRecord, NormalizationError> {
        let id = raw.id.ok_or(NormalizationError::MissingField("id"))?;
        let post_time = raw.post_time.ok_or(NormalizationError::MissingField("postTime"))?;
        let source_id = raw
            .package_name
            .clone()
            .ok_or(NormalizationError::MissingField("packageName"))?;
        if source_id.trim().is_empty() {
            return Err(NormalizationError::EmptySource);
        }

        let source_name = match self.resolver.resolve_name(&source_id) {
            Ok(name) if !name.is_empty() => name,
            Ok(_) => source_id.clone(),
            Err(e) => {
                debug!("Source name fallback for {}: {}", source_id, e);
                source_id.clone()
            }
        };

        Ok(NotificationRecord {
            id,
            key: NotificationKey::new(id, post_time).to_string(),
            title: raw.title.clone().unwrap_or_default(),
            text: raw.text.clone().unwrap_or_default(),
            source_id,
            source_name,
            post_time,
            dismissible: raw.is_clearable.unwrap_or(true),
            observed_at,
            event_type: EventType::Posted,
        })
    }
}
