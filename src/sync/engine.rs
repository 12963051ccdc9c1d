//! Local-first sync orchestrator.
//!
//! Every operation commits to the local store first and returns the local
//! result. Remote work happens afterwards, bounded by a timeout, and its
//! outcome only moves the [`AvailabilityState`]; no remote error ever
//! reaches the caller.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::availability::{Availability, AvailabilityState};
use super::deadline::bounded;
use super::rollover::{resolve_today, roll_over};
use crate::clock::Clock;
use crate::error::Result;
use crate::model::{
    DEFAULT_GOAL_ML, DailyRecord, DayStats, IntakeEvent, ReminderSettings, UserId, positive_ml,
};
use crate::remote::{RemoteResult, RemoteStore};
use crate::session::{SessionEvent, SessionEvents, SessionProvider};
use crate::storage::{LocalStore, SnapshotStore};

/// Bounds applied to remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTimeouts {
    pub probe: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl Default for SyncTimeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_millis(2000),
            read: Duration::from_millis(3000),
            write: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub timeouts: SyncTimeouts,
    /// Goal of a record created from nothing.
    pub default_goal_ml: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            timeouts: SyncTimeouts::default(),
            default_goal_ml: DEFAULT_GOAL_ML,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub availability: Availability,
    pub remote_configured: bool,
    pub user: Option<UserId>,
    pub probe_started: bool,
    pub pending_mirrors: usize,
}

struct Inner<L, R, S, C> {
    local: SnapshotStore<L>,
    remote: Option<Arc<R>>,
    session: S,
    clock: C,
    availability: AvailabilityState,
    options: SyncOptions,
    probe_started: AtomicBool,
    /// Background remote work: the probe and write mirrors.
    tasks: Mutex<JoinSet<()>>,
    /// Serializes local read-modify-write cycles.
    write_gate: Mutex<()>,
}

/// The orchestrator. Cheap to clone; clones share all state.
///
/// Dropping the last clone abandons in-flight mirrors. Call
/// [`SyncEngine::settle`] first to let them finish.
pub struct SyncEngine<L, R, S, C> {
    inner: Arc<Inner<L, R, S, C>>,
}

impl<L, R, S, C> Clone for SyncEngine<L, R, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L, R, S, C> SyncEngine<L, R, S, C>
where
    L: LocalStore,
    R: RemoteStore,
    S: SessionProvider,
    C: Clock,
{
    pub fn new(local: L, remote: Option<R>, session: S, clock: C, options: SyncOptions) -> Self {
        Self::with_availability(local, remote, session, clock, options, AvailabilityState::new())
    }

    /// Like [`SyncEngine::new`], with a caller-supplied availability state.
    pub fn with_availability(
        local: L,
        remote: Option<R>,
        session: S,
        clock: C,
        options: SyncOptions,
        availability: AvailabilityState,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                local: SnapshotStore::new(local),
                remote: remote.map(Arc::new),
                session,
                clock,
                availability,
                options,
                probe_started: AtomicBool::new(false),
                tasks: Mutex::new(JoinSet::new()),
                write_gate: Mutex::new(()),
            }),
        }
    }

    pub fn local(&self) -> &SnapshotStore<L> {
        &self.inner.local
    }

    pub fn remote(&self) -> Option<&R> {
        self.inner.remote.as_deref()
    }

    pub fn availability(&self) -> Availability {
        self.inner.availability.get()
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            availability: self.availability(),
            remote_configured: self.inner.remote.is_some(),
            user: self.inner.session.current_user(),
            probe_started: self.inner.probe_started.load(Ordering::SeqCst),
            pending_mirrors: self.inner.tasks.lock().len(),
        }
    }

    /// Kick off the one-shot availability probe in the background.
    ///
    /// Returns `false` if the probe already ran (or is running), or if there
    /// is no runtime to run it on.
    pub fn start_probe(&self) -> bool {
        let Ok(handle) = Handle::try_current() else {
            warn!("no async runtime, availability probe not started");
            return false;
        };
        if self.inner.probe_started.swap(true, Ordering::SeqCst) {
            return false;
        }
        let inner = Arc::clone(&self.inner);
        self.inner
            .tasks
            .lock()
            .spawn_on(async move { inner.run_probe().await }, &handle);
        true
    }

    /// Run the probe inline if it has not run yet, then report availability.
    pub async fn probe(&self) -> Availability {
        if !self.inner.probe_started.swap(true, Ordering::SeqCst) {
            self.inner.run_probe().await;
        }
        self.availability()
    }

    /// Today's record: local snapshot after rollover, replaced by the remote
    /// snapshot when the remote answers in time. A remote with no record for
    /// today keeps the local one and is sent a copy of it.
    pub async fn read_today(&self) -> DailyRecord {
        let today = self.inner.clock.today();
        let local = resolve_today(
            self.inner.local.load_record(),
            today,
            self.inner.options.default_goal_ml,
        );

        let Some((remote, user)) = self.inner.remote_target("read_today") else {
            return local;
        };
        let limit = self.inner.options.timeouts.read;
        match bounded(limit, remote.fetch_day(&user, today))
            .await
            .into_remote(limit)
        {
            Ok(Some(record)) => {
                self.inner.observe("read_today", Ok(()));
                let record = roll_over(record.normalized(), today);
                {
                    let _gate = self.inner.write_gate.lock();
                    self.inner.local.save_record(&record);
                }
                debug!(
                    consumed_ml = record.consumed_ml,
                    entries = record.history.len(),
                    "adopted remote snapshot"
                );
                record
            }
            Ok(None) => {
                self.inner.observe("read_today", Ok(()));
                if self.inner.is_untouched(&local) {
                    return local;
                }
                debug!(
                    consumed_ml = local.consumed_ml,
                    goal_ml = local.goal_ml,
                    "remote has no record for today, uploading local snapshot"
                );
                let snapshot = local.clone();
                self.mirror("put_day", move |remote, user| async move {
                    remote.put_day(&user, &snapshot).await
                });
                local
            }
            Err(err) => {
                self.inner.observe("read_today", Err(err));
                local
            }
        }
    }

    /// Log a drink. Returns once the local snapshot is written.
    pub fn add_intake(&self, amount_ml: i64) -> Result<DailyRecord> {
        let amount_ml = positive_ml(amount_ml, "amount")?;

        let (record, event) = {
            let _gate = self.inner.write_gate.lock();
            let mut record = self.inner.current_record();
            let event = IntakeEvent::new(amount_ml, self.inner.clock.now());
            record.record_intake(event.clone());
            self.inner.local.save_record(&record);
            let event = record.history.last().cloned().unwrap_or(event);
            (record, event)
        };
        info!(
            amount_ml,
            consumed_ml = record.consumed_ml,
            goal_ml = record.goal_ml,
            "intake recorded"
        );

        let (day, goal_ml) = (record.day_key, record.goal_ml);
        self.mirror("add_intake", move |remote, user| async move {
            remote.add_intake(&user, day, &event, goal_ml).await
        });
        Ok(record)
    }

    /// Zero today's record, keeping the goal.
    pub fn reset_today(&self) -> DailyRecord {
        let record = {
            let _gate = self.inner.write_gate.lock();
            let mut record = self.inner.current_record();
            record.clear(self.inner.clock.today());
            self.inner.local.save_record(&record);
            record
        };
        info!(day = %record.day_key, "today reset");

        let (day, goal_ml) = (record.day_key, record.goal_ml);
        self.mirror("reset_today", move |remote, user| async move {
            remote.reset_day(&user, day, goal_ml).await
        });
        record
    }

    pub fn set_goal(&self, goal_ml: i64) -> Result<DailyRecord> {
        let goal_ml = positive_ml(goal_ml, "goal")?;

        let record = {
            let _gate = self.inner.write_gate.lock();
            let mut record = self.inner.current_record();
            record.goal_ml = goal_ml;
            self.inner.local.save_record(&record);
            record
        };
        info!(goal_ml, "goal updated");

        let day = record.day_key;
        self.mirror("set_goal", move |remote, user| async move {
            remote.set_goal(&user, day, goal_ml).await
        });
        Ok(record)
    }

    pub async fn read_reminder_settings(&self) -> ReminderSettings {
        let local = self.inner.local.load_settings().unwrap_or_default();

        let Some((remote, user)) = self.inner.remote_target("read_reminder_settings") else {
            return local;
        };
        let limit = self.inner.options.timeouts.read;
        match bounded(limit, remote.load_settings(&user))
            .await
            .into_remote(limit)
        {
            Ok(settings) => {
                self.inner.observe("read_reminder_settings", Ok(()));
                if let Err(err) = settings.validate() {
                    warn!(error = %err, "remote reminder settings are invalid, keeping local");
                    return local;
                }
                {
                    let _gate = self.inner.write_gate.lock();
                    self.inner.local.save_settings(&settings);
                }
                settings
            }
            Err(err) => {
                self.inner.observe("read_reminder_settings", Err(err));
                local
            }
        }
    }

    pub fn save_reminder_settings(&self, settings: &ReminderSettings) -> Result<()> {
        settings.validate()?;

        {
            let _gate = self.inner.write_gate.lock();
            self.inner.local.save_settings(settings);
        }
        info!(
            enabled = settings.enabled,
            interval_minutes = settings.interval_minutes,
            "reminder settings saved"
        );

        let settings = settings.clone();
        self.mirror("save_reminder_settings", move |remote, user| async move {
            remote.save_settings(&user, &settings).await
        });
        Ok(())
    }

    /// Per-day totals for the last `days` days (today included), newest
    /// first. Remote only; empty when the remote cannot be used.
    pub async fn history(&self, days: u32) -> Vec<DayStats> {
        if days == 0 {
            return Vec::new();
        }
        let Some((remote, user)) = self.inner.remote_target("history") else {
            return Vec::new();
        };
        let since = self.inner.clock.today().days_before(days - 1);
        let limit = self.inner.options.timeouts.read;
        match bounded(limit, remote.day_stats(&user, since))
            .await
            .into_remote(limit)
        {
            Ok(stats) => {
                self.inner.observe("history", Ok(()));
                stats
            }
            Err(err) => {
                self.inner.observe("history", Err(err));
                Vec::new()
            }
        }
    }

    /// Wait for every background task started so far, and any they spawn.
    pub async fn settle(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.inner.tasks.lock());
            if tasks.is_empty() {
                return;
            }
            while let Some(joined) = tasks.join_next().await {
                if let Err(err) = joined {
                    warn!(error = %err, "background sync task failed");
                }
            }
        }
    }

    /// Reconcile on sign-in, keep local state on sign-out.
    pub fn watch_sessions(&self) -> JoinHandle<()> {
        let engine = self.clone();
        let mut events = SessionEvents::new(self.inner.session.subscribe());
        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                match event {
                    SessionEvent::Started(user) => {
                        info!(user = %user, "session started, reconciling today");
                        let record = engine.read_today().await;
                        debug!(consumed_ml = record.consumed_ml, "reconciled");
                    }
                    SessionEvent::Ended => {
                        info!("session ended, keeping local state");
                    }
                }
            }
        })
    }

    /// Spawn a bounded remote write whose outcome only feeds availability.
    fn mirror<F, Fut>(&self, op: &'static str, call: F)
    where
        F: FnOnce(Arc<R>, UserId) -> Fut,
        Fut: Future<Output = RemoteResult<()>> + Send + 'static,
    {
        let Some((remote, user)) = self.inner.remote_target(op) else {
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            debug!(op, "no async runtime, remote mirror skipped");
            return;
        };

        let limit = self.inner.options.timeouts.write;
        let inner = Arc::clone(&self.inner);
        let fut = call(remote, user);

        let mut tasks = self.inner.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.spawn_on(
            async move {
                let outcome = bounded(limit, fut).await.into_remote(limit);
                inner.observe(op, outcome);
            },
            &handle,
        );
    }
}

impl<L, R, S, C> Inner<L, R, S, C>
where
    L: LocalStore,
    R: RemoteStore,
    S: SessionProvider,
    C: Clock,
{
    fn current_record(&self) -> DailyRecord {
        resolve_today(
            self.local.load_record(),
            self.clock.today(),
            self.options.default_goal_ml,
        )
    }

    /// A record nobody has written to: no entries and the default goal.
    fn is_untouched(&self, record: &DailyRecord) -> bool {
        record.history.is_empty() && record.goal_ml == self.options.default_goal_ml
    }

    /// Remote and user for a call, if a call should be attempted at all.
    fn remote_target(&self, op: &str) -> Option<(Arc<R>, UserId)> {
        let remote = self.remote.as_ref()?;
        let Some(user) = self.session.current_user() else {
            debug!(op, "no session, remote phase skipped");
            return None;
        };
        if !self.availability.is_usable() {
            debug!(op, availability = %self.availability.get(), "remote not usable, remote phase skipped");
            return None;
        }
        Some((Arc::clone(remote), user))
    }

    async fn run_probe(&self) {
        let (Some(remote), Some(user)) = (self.remote.as_ref(), self.session.current_user())
        else {
            self.availability.record_probe(false);
            info!(
                remote_configured = self.remote.is_some(),
                "probe skipped, remote marked unavailable"
            );
            return;
        };

        let limit = self.options.timeouts.probe;
        let today = self.clock.today();
        let outcome = bounded(limit, remote.fetch_day(&user, today))
            .await
            .into_remote(limit);
        match outcome {
            Ok(_) => {
                self.availability.record_probe(true);
                info!("probe succeeded, remote available");
            }
            Err(err) => {
                self.availability.record_probe(false);
                info!(kind = %err.kind, error = %err, "probe failed, remote unavailable");
            }
        }
    }

    /// Fold a remote outcome into the availability state.
    fn observe(&self, op: &str, outcome: RemoteResult<()>) {
        match outcome {
            Ok(()) => {
                if self.availability.mark_available() {
                    info!(op, "remote reachable again");
                }
            }
            Err(err) if err.is_permission() => {
                let changed = self.availability.mark_unavailable();
                warn!(op, kind = %err.kind, changed, error = %err, "remote rejected the session");
            }
            Err(err) if err.is_unreachable() => {
                let changed = self.availability.mark_unavailable();
                warn!(op, kind = %err.kind, changed, error = %err, "remote unreachable");
            }
            Err(err) => {
                debug!(op, kind = %err.kind, error = %err, "remote call failed, availability unchanged");
            }
        }
    }
}
