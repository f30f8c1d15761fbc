use std::sync::Arc;
use tokio::sync::watch;

/// External interruption signal shared between the signal handler and the Collector.
///
/// Once triggered it stays triggered.
#[derive(Clone, Debug)]
pub struct Interrupt {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Create a signal that is triggered on Ctrl-C
    pub fn on_ctrl_c() -> Self {
        let interrupt = Self::new();
        let handle = interrupt.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    ::log::warn!("Interrupt received, finishing current page and flushing");
                    handle.trigger();
                }
                Err(e) => ::log::error!("Failed to listen for Ctrl-C: {}", e),
            }
        });
        interrupt
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has been triggered
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.is_triggered());

        let waiter = interrupt.clone();
        let handle = tokio::spawn(async move { waiter.triggered().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        interrupt.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(interrupt.is_triggered());
    }

    #[tokio::test]
    async fn test_already_triggered_resolves_immediately() {
        let interrupt = Interrupt::new();
        interrupt.trigger();
        tokio::time::timeout(Duration::from_millis(100), interrupt.triggered())
            .await
            .unwrap();
    }
}
