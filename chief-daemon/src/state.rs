//! Shared handler state

use crate::access::AccessGate;
use crate::service::{RunEngine, RunRegistry};
use std::sync::Arc;
use tokio::sync::watch;

/// State shared by every control-plane handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RunEngine>,
    pub access: Arc<dyn AccessGate>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(engine: Arc<RunEngine>, access: Arc<dyn AccessGate>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            engine,
            access,
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        self.engine.registry()
    }

    /// Asks the server to stop accepting connections
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolves once shutdown has been requested
    pub async fn shutdown_requested(&self) {
        let mut receiver = self.shutdown.subscribe();
        let _ = receiver.wait_for(|stopping| *stopping).await;
    }
}
