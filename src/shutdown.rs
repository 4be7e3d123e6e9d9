//! Cooperative cancellation shared by the sweep and the display loops.
//!
//! A [`Shutdown`] is a cheap clone of a `watch` receiver. Loops race their
//! suspension points (dwell, pacing, operator input) against
//! [`Shutdown::wait`] inside `tokio::select!`.

use tokio::sync::watch;
use tracing::info;

/// Sending half. Dropping it does not trigger shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// Handle that never fires. For one-shot tools and tests.
    pub fn never() -> Shutdown {
        let (_, shutdown) = Self::channel();
        shutdown
    }

    /// Handle fired by the first Ctrl+C. Must be called inside a runtime.
    pub fn on_ctrl_c() -> Shutdown {
        let (trigger, shutdown) = Self::channel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, shutting down");
                trigger.trigger();
            }
        });
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            // Sender gone without firing: nothing can ever cancel us.
            std::future::pending::<()>().await;
        }
    }
}
