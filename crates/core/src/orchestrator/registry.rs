//! Named recurring jobs.
//!
//! The registry owns one timer task per job. Each fire spawns the job's
//! action as its own task, so a failing or panicking tick is contained and
//! never cancels the timer. A tick that is still running when the next fire
//! comes due causes that fire to be skipped.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::audit::{emit_opt, AuditHandle};
use crate::metrics;

use super::types::{JobInfo, JobKind, TickError};

/// Future produced by one job tick.
pub type JobFuture = BoxFuture<'static, Result<(), TickError>>;

/// Action invoked on every fire of a job.
pub type JobAction = Arc<dyn Fn() -> JobFuture + Send + Sync>;

type NextFire = Arc<Mutex<Option<DateTime<Utc>>>>;

/// Wrap an async closure as a [`JobAction`].
pub fn job_action<F, Fut>(f: F) -> JobAction
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TickError>> + Send + 'static,
{
    Arc::new(move || -> JobFuture { Box::pin(f()) })
}

struct JobEntry {
    interval: Duration,
    action: JobAction,
    /// Set while a tick of this job is executing. Outlives timer restarts.
    busy: Arc<AtomicBool>,
    next_fire: NextFire,
    timer: Option<JoinHandle<()>>,
}

impl JobEntry {
    fn new(interval: Duration, action: JobAction) -> Self {
        Self {
            interval,
            action,
            busy: Arc::new(AtomicBool::new(false)),
            next_fire: Arc::new(Mutex::new(None)),
            timer: None,
        }
    }

    fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        *lock_ignoring_poison(&self.next_fire) = None;
    }
}

/// Registry of named recurring jobs.
///
/// All mutations happen under a single lock, so a check-then-create via
/// [`JobRegistry::ensure_running`] cannot race with itself.
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobKind, JobEntry>>,
    /// Whether newly created jobs start immediately.
    active: AtomicBool,
    audit: Option<AuditHandle>,
}

impl JobRegistry {
    pub fn new(audit: Option<AuditHandle>) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            active: AtomicBool::new(false),
            audit,
        }
    }

    /// Register a job without starting it. Replaces (and stops) any job of
    /// the same kind.
    pub fn add_job(&self, kind: JobKind, interval: Duration, action: JobAction) {
        let mut jobs = self.lock();
        if let Some(mut previous) = jobs.insert(kind, JobEntry::new(interval, action)) {
            debug!(job = %kind, "Replacing existing job");
            previous.stop();
        }
        update_job_gauge(&jobs);
    }

    /// Create and start a job unless one of this kind already exists.
    ///
    /// `make_action` is only called when the job is created. The job starts
    /// immediately if the registry is active, otherwise on the next
    /// [`JobRegistry::start`]. Returns true if the job was created.
    pub fn ensure_running<F>(&self, kind: JobKind, interval: Duration, make_action: F) -> bool
    where
        F: FnOnce() -> JobAction,
    {
        let mut jobs = self.lock();
        if jobs.contains_key(&kind) {
            return false;
        }

        let mut entry = JobEntry::new(interval, make_action());
        if self.active.load(Ordering::Acquire) {
            self.spawn_timer(kind, &mut entry);
        }
        jobs.insert(kind, entry);
        update_job_gauge(&jobs);
        true
    }

    /// Stop and unregister a job. Removing an absent job is a no-op.
    ///
    /// A tick already in flight runs to completion.
    pub fn remove_job(&self, kind: &JobKind) -> bool {
        let mut jobs = self.lock();
        let removed = match jobs.remove(kind) {
            Some(mut entry) => {
                entry.stop();
                true
            }
            None => false,
        };
        update_job_gauge(&jobs);
        removed
    }

    pub fn contains(&self, kind: &JobKind) -> bool {
        self.lock().contains_key(kind)
    }

    pub fn is_job_running(&self, kind: &JobKind) -> bool {
        self.lock().get(kind).is_some_and(JobEntry::is_running)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Snapshot of every registered job, monitor first, then ingestion jobs
    /// by game id.
    pub fn list_jobs(&self) -> Vec<JobInfo> {
        let jobs = self.lock();
        let mut infos: Vec<JobInfo> = jobs
            .iter()
            .map(|(kind, entry)| JobInfo {
                name: kind.to_string(),
                kind: *kind,
                running: entry.is_running(),
                interval_ms: entry.interval.as_millis() as u64,
                next_fire_time: *lock_ignoring_poison(&entry.next_fire),
            })
            .collect();

        infos.sort_by_key(|info| match info.kind {
            JobKind::Monitor => (0, 0),
            JobKind::Ingest { game_id } => (1, game_id),
        });
        infos
    }

    /// Ids of games with a registered ingestion job.
    pub fn ingest_game_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .lock()
            .keys()
            .filter_map(|kind| match kind {
                JobKind::Ingest { game_id } => Some(*game_id),
                JobKind::Monitor => None,
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Start every registered job that is not already running.
    pub fn start(&self) {
        let mut jobs = self.lock();
        self.active.store(true, Ordering::Release);

        for (kind, entry) in jobs.iter_mut() {
            if !entry.is_running() {
                self.spawn_timer(*kind, entry);
            }
        }
        info!("Started {} job(s)", jobs.len());
    }

    /// Stop every job's timer. Jobs stay registered and in-flight ticks are
    /// not awaited.
    pub fn stop(&self) {
        let mut jobs = self.lock();
        self.active.store(false, Ordering::Release);

        for entry in jobs.values_mut() {
            entry.stop();
        }
        info!("Stopped {} job(s)", jobs.len());
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobKind, JobEntry>> {
        lock_ignoring_poison(&self.jobs)
    }

    fn spawn_timer(&self, kind: JobKind, entry: &mut JobEntry) {
        let interval = entry.interval;
        let action = Arc::clone(&entry.action);
        let busy = Arc::clone(&entry.busy);
        let next_fire = Arc::clone(&entry.next_fire);
        let audit = self.audit.clone();

        debug!(job = %kind, interval_ms = interval.as_millis() as u64, "Starting job");

        entry.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                *lock_ignoring_poison(&next_fire) = chrono::Duration::from_std(interval)
                    .ok()
                    .map(|d| Utc::now() + d);

                ticker.tick().await;

                if busy.swap(true, Ordering::AcqRel) {
                    debug!(job = %kind, "Previous tick still running, skipping");
                    metrics::JOB_TICKS_SKIPPED
                        .with_label_values(&[kind.label()])
                        .inc();
                    continue;
                }

                let tick = tokio::spawn(action());
                let busy = Arc::clone(&busy);
                let audit = audit.clone();
                tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = tick.await;
                    busy.store(false, Ordering::Release);
                    metrics::JOB_TICK_DURATION
                        .with_label_values(&[kind.label()])
                        .observe(started.elapsed().as_secs_f64());
                    report_outcome(kind, outcome, &audit).await;
                });
            }
        }));
    }
}

impl Drop for JobRegistry {
    fn drop(&mut self) {
        for entry in self.lock().values_mut() {
            entry.stop();
        }
    }
}

async fn report_outcome(
    kind: JobKind,
    outcome: Result<Result<(), TickError>, JoinError>,
    audit: &Option<AuditHandle>,
) {
    match outcome {
        Ok(Ok(())) => {
            metrics::JOB_TICKS
                .with_label_values(&[kind.label(), "ok"])
                .inc();
        }
        Ok(Err(e)) => {
            warn!(job = %kind, error_kind = e.kind(), "Job tick failed: {}", e);
            metrics::JOB_TICKS
                .with_label_values(&[kind.label(), e.kind()])
                .inc();
            emit_opt(audit, kind.failure_event(&e)).await;
        }
        Err(e) if e.is_cancelled() => {
            debug!(job = %kind, "Job tick cancelled");
        }
        Err(e) => {
            error!(job = %kind, "Job tick panicked: {}", e);
            metrics::JOB_TICKS
                .with_label_values(&[kind.label(), "panic"])
                .inc();
        }
    }
}

fn update_job_gauge(jobs: &HashMap<JobKind, JobEntry>) {
    let count = jobs
        .keys()
        .filter(|kind| matches!(kind, JobKind::Ingest { .. }))
        .count();
    metrics::ACTIVE_INGEST_JOBS.set(count as i64);
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
