/*!
Process-wide listener state shared by the pipeline and the facade
*/

use std::sync::Arc;

use crate::core::{distributor::Distributor, event_store::EventStore, source_filter::SourceFilter};

/// Store, allow-list and subscriber slot. Each has its own lock; they are never
/// mutated together.
#[derive(Clone, Default)]
pub struct ListenerContext {
    pub store: Arc<EventStore>,
    pub filter: Arc<SourceFilter>,
    pub distributor: Arc<Distributor>,
}

impl ListenerContext {
    pub fn new() -> Self {
        Self::default()
    }
}
