//! # Sync Engine
//!
//! Keeps a local store and a remote store converged by running
//! reconciliation passes on a fixed schedule, or on demand.
//!
//! ## Engine Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncEngine Architecture                          │
//! │                                                                         │
//! │   start() ──► scheduler task ──tick──┐                                  │
//! │   stop()  ──► shutdown_tx            │                                  │
//! │                                      ▼                                  │
//! │   force_sync() ─────────────► join_or_launch()                          │
//! │                                      │                                  │
//! │                   ┌──────────────────┴───────────────┐                  │
//! │                   ▼                                  ▼                  │
//! │         pass in flight: join it           none: spawn pass task         │
//! │         (watch receiver)                  publish receiver in slot      │
//! │                   │                                  │                  │
//! │                   └──────────────┬───────────────────┘                  │
//! │                                  ▼                                      │
//! │            wait for Some(outcome) ◄── pass task: reconcile_all,         │
//! │                                       update SyncRecord, clear slot,    │
//! │                                       send outcome                      │
//! │                                                                         │
//! │  STATUS EVENTS:                                                         │
//! │  emit_status(&SyncRecord)   after start/stop and every pass             │
//! │  emit_error(message, retryable)   after a failed pass                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Single-Flight
//! At most one pass runs per engine. A tick or `force_sync()` arriving while
//! a pass is in flight waits for that pass and returns its outcome. The pass
//! runs in its own task, so a caller dropping its future never cuts a pass
//! short.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use emporium_core::{SyncCounts, SyncRecord, SyncState};
use emporium_db::StoreHandle;

use crate::config::SyncSettings;
use crate::error::{SyncError, SyncResult};
use crate::reconcile::reconcile_all;

/// Outcome of one reconciliation pass, shared by every caller that waited.
pub type PassOutcome = SyncResult<SyncCounts>;

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Trait for observing the engine (status page, logs, tests).
pub trait SyncEventEmitter: Send + Sync {
    /// Emits a sync status change event.
    fn emit_status(&self, record: &SyncRecord);

    /// Emits a sync error event.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_status(&self, _record: &SyncRecord) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}

// =============================================================================
// Sync Engine
// =============================================================================

/// The running scheduler: its shutdown channel and task.
struct Scheduler {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

struct Inner {
    local: StoreHandle,
    remote: StoreHandle,
    interval: Duration,
    op_timeout: Duration,

    /// Written only by `start`, `stop` and the pass task.
    record: RwLock<SyncRecord>,

    scheduler: tokio::sync::Mutex<Option<Scheduler>>,

    /// Receiver of the pass in flight, if any.
    inflight: Mutex<Option<watch::Receiver<Option<PassOutcome>>>>,

    passes_started: AtomicU64,

    emitter: Arc<dyn SyncEventEmitter>,
}

/// Handle to a sync engine. Cheap to clone; clones share one engine.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<Inner>,
}

impl SyncEngine {
    /// Creates an idle engine between `local` and `remote`.
    pub fn new(settings: &SyncSettings, local: StoreHandle, remote: StoreHandle) -> Self {
        Self::with_emitter(settings, local, remote, Arc::new(NoOpEmitter))
    }

    /// Creates an idle engine with a custom event emitter.
    pub fn with_emitter(
        settings: &SyncSettings,
        local: StoreHandle,
        remote: StoreHandle,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> Self {
        Self::assemble(settings.interval(), settings.op_timeout(), local, remote, emitter)
    }

    fn assemble(
        interval: Duration,
        op_timeout: Duration,
        local: StoreHandle,
        remote: StoreHandle,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> Self {
        SyncEngine {
            inner: Arc::new(Inner {
                local,
                remote,
                interval,
                op_timeout,
                record: RwLock::new(SyncRecord::default()),
                scheduler: tokio::sync::Mutex::new(None),
                inflight: Mutex::new(None),
                passes_started: AtomicU64::new(0),
                emitter,
            }),
        }
    }

    /// Snapshot of the sync record.
    pub async fn status(&self) -> SyncRecord {
        self.inner.record.read().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.inner.record.read().await.is_running()
    }

    /// Number of passes launched since the engine was built. Joined
    /// callers do not count.
    pub fn passes_started(&self) -> u64 {
        self.inner.passes_started.load(Ordering::SeqCst)
    }

    /// Starts the schedule. The first pass runs right away.
    ///
    /// ## Returns
    /// * `true` - Idle/Stopped → Running
    /// * `false` - Already running; nothing changed
    pub async fn start(&self) -> bool {
        let mut scheduler = self.inner.scheduler.lock().await;
        if scheduler.is_some() {
            debug!("Sync engine already running");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(schedule(
            Arc::downgrade(&self.inner),
            self.inner.interval,
            shutdown_rx,
        ));
        *scheduler = Some(Scheduler { shutdown_tx, task });

        self.inner.set_state(SyncState::Running).await;
        info!(
            interval_secs = self.inner.interval.as_secs(),
            "Sync engine started"
        );
        true
    }

    /// Stops the schedule. Returns once any pass in flight has finished.
    ///
    /// ## Returns
    /// * `true` - Running → Stopped
    /// * `false` - Not running; nothing changed
    pub async fn stop(&self) -> bool {
        let mut scheduler = self.inner.scheduler.lock().await;
        let Some(Scheduler { shutdown_tx, task }) = scheduler.take() else {
            debug!("Sync engine not running");
            return false;
        };

        info!("Stopping sync engine");
        let _ = shutdown_tx.send(()).await;
        if let Err(e) = task.await {
            error!(error = %e, "Sync scheduler task failed");
        }

        // A forced pass may still be running
        if let Some(mut rx) = self.inner.current_pass() {
            let _ = rx.wait_for(Option::is_some).await;
        }

        self.inner.set_state(SyncState::Stopped).await;
        info!("Sync engine stopped");
        true
    }

    /// Runs one pass now, or joins the pass already running. The scheduler
    /// state is left as it is.
    pub async fn force_sync(&self) -> PassOutcome {
        info!("Forced sync requested");
        self.inner.run_pass().await
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("local", &self.inner.local.kind())
            .field("remote", &self.inner.remote.kind())
            .field("interval", &self.inner.interval)
            .finish()
    }
}

impl Inner {
    async fn set_state(&self, state: SyncState) {
        let snapshot = {
            let mut record = self.record.write().await;
            record.state = state;
            record.clone()
        };
        self.emitter.emit_status(&snapshot);
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<watch::Receiver<Option<PassOutcome>>>> {
        // The guarded value stays consistent even if a holder panicked
        self.inflight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_pass(&self) -> Option<watch::Receiver<Option<PassOutcome>>> {
        self.slot().clone()
    }

    /// Joins the pass in flight, or spawns a new one.
    fn join_or_launch(self: &Arc<Self>) -> watch::Receiver<Option<PassOutcome>> {
        let mut slot = self.slot();
        if let Some(rx) = slot.as_ref() {
            debug!("Joining pass in flight");
            return rx.clone();
        }

        let (tx, rx) = watch::channel(None);
        *slot = Some(rx.clone());
        drop(slot);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = inner.execute_pass().await;
            *inner.slot() = None;
            tx.send_replace(Some(outcome));
        });

        rx
    }

    async fn run_pass(self: &Arc<Self>) -> PassOutcome {
        let mut rx = self.join_or_launch();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or(Err(SyncError::PassAbandoned))
    }

    async fn execute_pass(&self) -> PassOutcome {
        let pass = self.passes_started.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut record = self.record.write().await;
            record.pass_in_progress = true;
            record.last_attempt = Some(emporium_core::now());
        }
        info!(pass, "Reconciliation pass started");

        let outcome = reconcile_all(self.local.as_ref(), self.remote.as_ref(), self.op_timeout).await;

        let snapshot = {
            let mut record = self.record.write().await;
            record.pass_in_progress = false;
            record.passes += 1;
            match &outcome {
                Ok(counts) => {
                    record.last_success = Some(emporium_core::now());
                    record.last_error = None;
                    record.last_counts = Some(*counts);
                    info!(
                        pass,
                        pushed = counts.pushed,
                        pulled = counts.pulled,
                        conflicts = counts.conflicts,
                        "Reconciliation pass complete"
                    );
                }
                Err(e) => {
                    record.last_error = Some(e.to_string());
                    if e.is_retryable() {
                        warn!(pass, error = %e, "Reconciliation pass failed, retrying on next tick");
                    } else {
                        error!(pass, error = %e, "Reconciliation pass failed");
                    }
                }
            }
            record.clone()
        };

        if let Err(e) = &outcome {
            self.emitter.emit_error(&e.to_string(), e.is_retryable());
        }
        self.emitter.emit_status(&snapshot);

        outcome
    }
}

/// Scheduler loop. Holds only a weak reference, so dropping every engine
/// handle ends it at the next tick.
async fn schedule(inner: Weak<Inner>, period: Duration, mut shutdown_rx: mpsc::Receiver<()>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                debug!("Sync scheduler received shutdown");
                break;
            }

            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                // Errors are recorded by the pass itself
                let _ = inner.run_pass().await;
            }
        }
    }

    debug!("Sync scheduler stopped");
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating a SyncEngine with options.
pub struct SyncEngineBuilder {
    settings: SyncSettings,
    local: Option<StoreHandle>,
    remote: Option<StoreHandle>,
    op_timeout: Option<Duration>,
    emitter: Option<Arc<dyn SyncEventEmitter>>,
}

impl SyncEngineBuilder {
    /// Creates a new builder with the given settings.
    pub fn new(settings: SyncSettings) -> Self {
        SyncEngineBuilder {
            settings,
            local: None,
            remote: None,
            op_timeout: None,
            emitter: None,
        }
    }

    /// Sets the local store (the cache).
    pub fn with_local(mut self, store: StoreHandle) -> Self {
        self.local = Some(store);
        self
    }

    /// Sets the remote store.
    pub fn with_remote(mut self, store: StoreHandle) -> Self {
        self.remote = Some(store);
        self
    }

    /// Overrides the per-call timeout with sub-second precision.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = Some(timeout);
        self
    }

    /// Sets the event emitter.
    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Builds the SyncEngine.
    pub fn build(self) -> SyncResult<SyncEngine> {
        self.settings.validate()?;

        let local = self
            .local
            .ok_or_else(|| SyncError::InvalidConfig("Local store required".into()))?;
        let remote = self
            .remote
            .ok_or_else(|| SyncError::InvalidConfig("Remote store required".into()))?;
        let emitter = self.emitter.unwrap_or_else(|| Arc::new(NoOpEmitter));

        let op_timeout = self.op_timeout.unwrap_or_else(|| self.settings.op_timeout());

        Ok(SyncEngine::assemble(
            self.settings.interval(),
            op_timeout,
            local,
            remote,
            emitter,
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
