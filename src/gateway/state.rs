use std::sync::Arc;

use crate::config::Network;
use crate::upstream::CoreApi;

/// Shared gateway state. Cheap to clone; handlers get it via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<dyn CoreApi>,
    pub network: Network,
}

impl AppState {
    pub fn new(core: Arc<dyn CoreApi>, network: Network) -> Self {
        Self { core, network }
    }
}
