//! Shutdown coordination.
//!
//! One [`Shutdown`] per process. Each server takes a [`ShutdownSignal`] and
//! hands `signal.wait()` to axum's graceful shutdown.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// A signal that fires on [`trigger`](Self::trigger).
    ///
    /// Subscribing after the trigger yields a signal that has already fired.
    pub fn subscribe(&self) -> ShutdownSignal {
        let rx = self.tx.subscribe();
        let fired = self.triggered.load(Ordering::SeqCst);
        ShutdownSignal { rx, fired }
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Number of signals that have not yet been dropped.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One server's view of the shutdown coordinator.
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
    fired: bool,
}

impl ShutdownSignal {
    /// Resolve once shutdown is triggered or the coordinator is dropped.
    pub async fn wait(mut self) {
        if self.fired {
            return;
        }
        // Closed means the coordinator is gone; nothing can trigger us anymore.
        let _ = self.rx.recv().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let shutdown = Shutdown::new();
        let a = shutdown.subscribe();
        let b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        a.wait().await;
        b.wait().await;
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let late = shutdown.subscribe();
        tokio::time::timeout(Duration::from_secs(1), late.wait())
            .await
            .expect("signal subscribed after trigger should fire at once");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_pends_until_triggered() {
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        assert!(tokio::time::timeout(Duration::from_secs(5), signal.wait())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_dropped_coordinator_releases_waiters() {
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        drop(shutdown);
        signal.wait().await;
    }

    #[test]
    fn test_trigger_without_subscribers_is_harmless() {
        let shutdown = Shutdown::default();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
    }
}
