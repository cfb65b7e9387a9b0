//! Shutdown coordination.

use tokio::sync::broadcast;

/// Fans a single stop signal out to the HTTP server and any other
/// long-running task. Triggering twice is harmless.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Stop accepting requests; in-flight confirmation waits still finish.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks that have not yet exited.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
