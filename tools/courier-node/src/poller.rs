//! Periodic dashboard refresh for a signed-in session.
//!
//! The poller owns a background task that asks a [`DashboardSource`] for the
//! session's dashboard on a fixed interval and publishes the result on a
//! `watch` channel. A failed refresh keeps the last good view and marks the
//! snapshot degraded until the next success.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use courier_common::dashboard::DashboardView;
use courier_common::Identity;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::queries::DashboardSource;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Shorter intervals are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Who is looking at the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    /// Last successfully computed view, if any refresh has succeeded yet.
    pub view: Option<DashboardView>,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// The most recent refresh failed; `view` is stale.
    pub degraded: bool,
    pub last_error: Option<String>,
    /// Completed refresh attempts, successful or not.
    pub attempts: u64,
}

struct Running {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub struct DashboardPoller {
    source: Arc<dyn DashboardSource>,
    session: Session,
    interval: Duration,
    snapshot: watch::Sender<DashboardSnapshot>,
    running: Option<Running>,
}

impl DashboardPoller {
    pub fn new(source: Arc<dyn DashboardSource>, session: Session) -> Self {
        let (snapshot, _) = watch::channel(DashboardSnapshot::default());
        Self {
            source,
            session,
            interval: DEFAULT_POLL_INTERVAL,
            snapshot,
            running: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.subscribe()
    }

    /// Start polling. The first refresh happens immediately. Calling `start`
    /// on a running poller does nothing.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }
        let (stop, mut stopped) = oneshot::channel();
        let source = self.source.clone();
        let identity = self.session.identity.clone();
        let snapshot = self.snapshot.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => refresh(&*source, &identity, &snapshot).await,
                }
            }
            tracing::debug!(user = %identity.user_id, "dashboard poller stopped");
        });

        tracing::debug!(
            user = %self.session.identity.user_id,
            role = %self.session.identity.role,
            interval_ms = self.interval.as_millis() as u64,
            "dashboard poller started"
        );
        self.running = Some(Running { stop, task });
    }

    /// Stop polling and wait for the background task to finish. The last
    /// snapshot stays readable.
    pub async fn stop(&mut self) {
        if let Some(Running { stop, task }) = self.running.take() {
            let _ = stop.send(());
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "dashboard poller task ended abnormally");
            }
        }
    }
}

impl Drop for DashboardPoller {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }
}

async fn refresh(
    source: &dyn DashboardSource,
    identity: &Identity,
    snapshot: &watch::Sender<DashboardSnapshot>,
) {
    match source.dashboard(identity).await {
        Ok(view) => {
            snapshot.send_modify(|s| {
                s.view = Some(view);
                s.refreshed_at = Some(Utc::now());
                s.degraded = false;
                s.last_error = None;
                s.attempts += 1;
            });
        }
        Err(e) => {
            tracing::warn!(user = %identity.user_id, error = %e, "dashboard refresh failed");
            snapshot.send_modify(|s| {
                s.degraded = true;
                s.last_error = Some(e.to_string());
                s.attempts += 1;
            });
        }
    }
}
