//! Connection state shared between a gateway and its worker thread

use std::sync::{Arc, Mutex, MutexGuard};

use contracts::ConnectionState;
use tracing::{error, info};

#[derive(Debug, Clone, Default)]
pub(crate) struct SharedState {
    gateway: &'static str,
    inner: Arc<Mutex<ConnectionState>>,
}

impl SharedState {
    pub(crate) fn new(gateway: &'static str) -> Self {
        Self {
            gateway,
            inner: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn get(&self) -> ConnectionState {
        self.lock().clone()
    }

    /// Transition, logging only actual changes
    pub(crate) fn set(&self, next: ConnectionState) {
        let mut current = self.lock();
        if *current == next {
            return;
        }
        match &next {
            ConnectionState::Failed { code } => {
                error!(gateway = self.gateway, code = %code, "gateway connection failed")
            }
            state => info!(gateway = self.gateway, state = %state, "gateway state changed"),
        }
        *current = next;
    }

    pub(crate) fn fail(&self, code: impl Into<String>) {
        self.set(ConnectionState::Failed { code: code.into() });
    }
}
