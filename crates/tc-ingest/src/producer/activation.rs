//! Completion counting for producer activations.
//!
//! Centralized venues register one activation per successfully attached pair,
//! decentralized venues register exactly one. Each registration hands out an
//! [`ActivationGuard`] that the producer unit owns for as long as it runs;
//! dropping it marks the unit finished. The runner waits on the tracker to
//! know when every activation has finished.

use std::sync::Arc;

use tokio::sync::watch;

/// Counter of outstanding activations with wait capability.
///
/// Cloning shares the same counter.
#[derive(Debug, Clone)]
pub struct ActivationTracker {
    outstanding: Arc<watch::Sender<usize>>,
}

impl ActivationTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0usize);
        Self { outstanding: Arc::new(tx) }
    }

    /// Record one more running activation. The count goes back down when
    /// the returned guard is dropped.
    pub fn register(&self) -> ActivationGuard {
        self.outstanding.send_modify(|n| *n += 1);
        ActivationGuard { tracker: self.clone() }
    }

    /// Mark one activation as finished. Never goes below zero.
    pub fn complete(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Mark every outstanding activation as finished.
    pub fn retire_all(&self) {
        self.outstanding.send_modify(|n| *n = 0);
    }

    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Wait until no activation is outstanding.
    pub async fn wait(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for ActivationTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Ownership of one outstanding activation.
///
/// Moved into the producer unit it stands for. Dropping it (the unit ended,
/// failed to start, or was torn down) completes the activation.
#[must_use = "dropping the guard completes the activation immediately"]
#[derive(Debug)]
pub struct ActivationGuard {
    tracker: ActivationTracker,
}

impl ActivationGuard {
    /// Explicitly mark the activation finished.
    pub fn finish(self) {}
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        self.tracker.complete();
    }
}
