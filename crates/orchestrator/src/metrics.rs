use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking session lifecycle outcomes.
///
/// All counters use relaxed ordering for maximum throughput. For a
/// consistent point-in-time view, call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// Sessions created and dispatched to a tablet.
    pub sessions_created: AtomicU64,
    /// Sessions that failed because the tablet refused the request.
    pub dispatch_failures: AtomicU64,
    /// Signature callbacks that completed a session.
    pub callbacks_completed: AtomicU64,
    /// Duplicate or late callbacks ignored because the session was already final.
    pub callbacks_ignored: AtomicU64,
    /// Callbacks rejected outright (bad payload, unknown session).
    pub callbacks_rejected: AtomicU64,
    /// Sessions marked expired, lazily or by the sweeper.
    pub sessions_expired: AtomicU64,
    /// Sessions cancelled by a workstation.
    pub sessions_cancelled: AtomicU64,
    /// Signed-artifact generation or publication failures after completion.
    pub artifact_failures: AtomicU64,
    /// Workstation broadcast failures.
    pub broadcast_failures: AtomicU64,
}

impl SessionMetrics {
    /// Increment the sessions created counter.
    pub fn increment_sessions_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the dispatch failures counter.
    pub fn increment_dispatch_failures(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the callbacks completed counter.
    pub fn increment_callbacks_completed(&self) {
        self.callbacks_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the callbacks ignored counter.
    pub fn increment_callbacks_ignored(&self) {
        self.callbacks_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the callbacks rejected counter.
    pub fn increment_callbacks_rejected(&self) {
        self.callbacks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the sessions expired counter.
    pub fn increment_sessions_expired(&self) {
        self.sessions_expired.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the sessions cancelled counter.
    pub fn increment_sessions_cancelled(&self) {
        self.sessions_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the artifact failures counter.
    pub fn increment_artifact_failures(&self) {
        self.artifact_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the broadcast failures counter.
    pub fn increment_broadcast_failures(&self) {
        self.broadcast_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a consistent point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            callbacks_completed: self.callbacks_completed.load(Ordering::Relaxed),
            callbacks_ignored: self.callbacks_ignored.load(Ordering::Relaxed),
            callbacks_rejected: self.callbacks_rejected.load(Ordering::Relaxed),
            sessions_expired: self.sessions_expired.load(Ordering::Relaxed),
            sessions_cancelled: self.sessions_cancelled.load(Ordering::Relaxed),
            artifact_failures: self.artifact_failures.load(Ordering::Relaxed),
            broadcast_failures: self.broadcast_failures.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`SessionMetrics`] at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Sessions created and dispatched to a tablet.
    pub sessions_created: u64,
    /// Sessions that failed because the tablet refused the request.
    pub dispatch_failures: u64,
    /// Signature callbacks that completed a session.
    pub callbacks_completed: u64,
    /// Duplicate or late callbacks ignored.
    pub callbacks_ignored: u64,
    /// Callbacks rejected outright.
    pub callbacks_rejected: u64,
    /// Sessions marked expired.
    pub sessions_expired: u64,
    /// Sessions cancelled by a workstation.
    pub sessions_cancelled: u64,
    /// Signed-artifact failures after completion.
    pub artifact_failures: u64,
    /// Workstation broadcast failures.
    pub broadcast_failures: u64,
}
