/*!
Notification listener: captures platform notifications, deduplicates them in
an in-memory store, filters them by source and streams them to one subscriber.
*/

pub mod core;
pub mod platform;

pub use crate::core::{
    config::ListenerConfig,
    context::ListenerContext,
    error::FacadeError,
    facade::{MethodCall, MethodResponse, NotificationFacade},
    pipeline::{IngestOutcome, IngestionPipeline, PipelineStats},
    record::{NotificationKey, NotificationRecord, RawNotification},
    tracker::NotificationTracker,
};
