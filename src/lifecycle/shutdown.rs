//! Shutdown coordination for the fleet.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Hands out [`ShutdownSignal`]s that every long-running task races against.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal { rx: Some(self.tx.subscribe()) }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of [`Shutdown`]. Subscribers created after the trigger still observe it.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl ShutdownSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_triggered(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once shutdown has been triggered.
    pub async fn cancelled(&mut self) {
        let fired = match self.rx.as_mut() {
            Some(rx) => rx.wait_for(|triggered| *triggered).await.is_ok(),
            None => false,
        };
        if !fired {
            // No coordinator, or it was dropped without triggering.
            std::future::pending::<()>().await;
        }
    }
}
