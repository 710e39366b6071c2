//! One-shot reload notification.
//!
//! Each published snapshot generation owns one `ReloadSignal`. When the
//! generation is replaced, its signal fires exactly once and is retired; the
//! next generation carries a fresh, unfired signal. A consumer holding a
//! `ReloadToken` therefore sees one change and must ask the provider for a new
//! token to observe the next one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct SignalState {
    fired: AtomicBool,
    notify: Notify,
}

/// Producer side, held by the provider.
#[derive(Debug, Clone, Default)]
pub struct ReloadSignal {
    state: Arc<SignalState>,
}

impl ReloadSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A consumer handle bound to this signal.
    pub fn token(&self) -> ReloadToken {
        ReloadToken {
            state: self.state.clone(),
        }
    }

    /// Fire and retire the signal. Only the first call has an effect.
    pub(crate) fn fire(&self) -> bool {
        let first = !self.state.fired.swap(true, Ordering::AcqRel);
        if first {
            self.state.notify.notify_waiters();
        }
        first
    }

    pub fn is_fired(&self) -> bool {
        self.state.fired.load(Ordering::Acquire)
    }
}

/// Consumer side: observes a single change.
#[derive(Debug, Clone)]
pub struct ReloadToken {
    state: Arc<SignalState>,
}

impl ReloadToken {
    /// Whether the generation this token was taken from has been replaced.
    pub fn has_changed(&self) -> bool {
        self.state.fired.load(Ordering::Acquire)
    }

    /// Wait until the generation is replaced. Returns at once if it already was.
    pub async fn changed(&self) {
        let notified = self.state.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent fire is not lost.
        notified.as_mut().enable();

        if self.has_changed() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_fires_once() {
        let signal = ReloadSignal::new();
        let token = signal.token();
        assert!(!token.has_changed());

        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(token.has_changed());
        assert!(signal.is_fired());
    }

    #[tokio::test]
    async fn test_changed_returns_after_fire() {
        let signal = ReloadSignal::new();
        let token = signal.token();

        let waiter = tokio::spawn(async move { token.changed().await });
        tokio::task::yield_now().await;
        signal.fire();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be woken")
            .unwrap();
    }

    #[tokio::test]
    async fn test_changed_on_fired_token_is_immediate() {
        let signal = ReloadSignal::new();
        signal.fire();
        tokio::time::timeout(Duration::from_millis(10), signal.token().changed())
            .await
            .expect("already fired");
    }
}
