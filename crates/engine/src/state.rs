use std::sync::Arc;

use infra::store::Store;

use crate::config::EngineConfig;
use crate::events::{BroadcastSink, EventSink};

/// Shared handles threaded through every operation. Cloning is cheap; all
/// clones point at the same store and event sink.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub events: Arc<dyn EventSink>,
    pub config: EngineConfig,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::from_env())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            store: Store::new(),
            events: Arc::new(BroadcastSink),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}
