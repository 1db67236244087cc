//! The connection/poll state machine.
//!
//! Owns the single session state: endpoint reachability, the bound tab
//! session, and the last extracted snapshot. Reconciliation (coarse timer)
//! decides when to (re)connect or tear down; the poll task (fine timer, only
//! while bound) drives extraction and fan-out. Every poll result is gated on
//! a per-session generation counter, so nothing is ever published for a
//! session that has been superseded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use trackcast_core::config::MonitorConfig;
use trackcast_core::{LinkState, Result, Severity, Snapshot, Target};

use crate::extractor;
use crate::targets::{select_target, TargetSource};

/// A protocol session bound to one target: evaluate + close.
/// `close` must be idempotent and safe on a session whose transport died.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn evaluate(&self, expression: &str) -> Result<Value>;
    fn close(&self);
}

/// Opens protocol sessions against qualifying targets.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, target: &Target) -> Result<Arc<dyn PageSession>>;
}

/// Receives the lifecycle notifications the state machine emits.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Receives every extracted state, `None` meaning "no active media".
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: Option<&Snapshot>);
}

/// Default notifier: logs through tracing.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Ok => tracing::info!("{}", message),
            Severity::Warn => tracing::warn!("{}", message),
            Severity::Error => tracing::error!("{}", message),
        }
    }
}

struct BoundSession {
    target_id: String,
    session: Arc<dyn PageSession>,
    poll_task: Option<JoinHandle<()>>,
}

struct State {
    reachable: bool,
    bound: Option<BoundSession>,
    last_snapshot: Option<Snapshot>,
    /// Bumped on every teardown; poll results from older generations are
    /// dropped without side effects.
    generation: u64,
}

fn link_state_of(state: &State) -> LinkState {
    if !state.reachable {
        LinkState::Down
    } else if state.bound.is_some() {
        LinkState::UpBound
    } else {
        LinkState::UpNoTab
    }
}

struct Inner {
    targets: Arc<dyn TargetSource>,
    factory: Arc<dyn SessionFactory>,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn SnapshotSink>,
    origin: String,
    service_worker_path: String,
    poll_interval: Duration,
    state: Mutex<State>,
}

/// The core state machine. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        targets: Arc<dyn TargetSource>,
        factory: Arc<dyn SessionFactory>,
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn SnapshotSink>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                targets,
                factory,
                notifier,
                sink,
                origin: config.origin.clone(),
                service_worker_path: config.service_worker_path.clone(),
                poll_interval: config.poll_interval(),
                state: Mutex::new(State {
                    reachable: false,
                    bound: None,
                    last_snapshot: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// One reconciliation step: resolve endpoint reachability, tab presence,
    /// and session binding against what the endpoint currently reports.
    pub async fn reconcile(&self) {
        Inner::reconcile(&self.inner).await;
    }

    /// Final teardown, used on shutdown. Idempotent.
    pub async fn teardown(&self) {
        let mut state = self.inner.state.lock().await;
        Inner::teardown_locked(&mut state);
    }

    pub async fn link_state(&self) -> LinkState {
        let state = self.inner.state.lock().await;
        link_state_of(&state)
    }

    pub async fn last_snapshot(&self) -> Option<Snapshot> {
        self.inner.state.lock().await.last_snapshot.clone()
    }
}

impl Inner {
    async fn reconcile(inner: &Arc<Inner>) {
        let listing = inner.targets.list_targets().await;

        let mut state = inner.state.lock().await;
        let targets = match listing {
            Ok(targets) => targets,
            Err(e) => {
                // Only announce the transition, not every tick spent down.
                if state.reachable {
                    inner.notifier.notify("Browser closed", Severity::Warn);
                    debug!(error = %e, "debugging endpoint unreachable");
                }
                state.reachable = false;
                Self::teardown_locked(&mut state);
                return;
            }
        };
        state.reachable = true;

        let Some(target) = select_target(&targets, &inner.origin, &inner.service_worker_path)
        else {
            if state.bound.is_some() {
                inner.notifier.notify("Music tab closed", Severity::Warn);
            }
            Self::teardown_locked(&mut state);
            return;
        };

        // Already bound to this tab: the common case. Never re-open.
        if state
            .bound
            .as_ref()
            .is_some_and(|bound| bound.target_id == target.id)
        {
            return;
        }

        // New or different tab. The old session is fully torn down before the
        // new one is opened; holding the state lock across the open keeps the
        // two sessions from ever being considered bound at the same time.
        Self::teardown_locked(&mut state);

        let session = match inner.factory.open(target).await {
            Ok(session) => session,
            Err(e) => {
                inner
                    .notifier
                    .notify(&format!("CDP connect failed: {}", e), Severity::Error);
                return;
            }
        };

        let generation = state.generation;
        let poll_task = Self::spawn_poll_task(inner, Arc::clone(&session), generation);
        state.bound = Some(BoundSession {
            target_id: target.id.clone(),
            session,
            poll_task: Some(poll_task),
        });
        inner.notifier.notify("Music tab detected", Severity::Ok);
    }

    /// Unconditional teardown: cancel the poll task, release the session
    /// fire-and-forget, clear the last snapshot, and invalidate the
    /// generation. Safe to call when nothing is open.
    fn teardown_locked(state: &mut State) {
        state.generation += 1;
        if let Some(mut bound) = state.bound.take() {
            if let Some(task) = bound.poll_task.take() {
                task.abort();
            }
            bound.session.close();
        }
        state.last_snapshot = None;
    }

    fn spawn_poll_task(
        inner: &Arc<Inner>,
        session: Arc<dyn PageSession>,
        generation: u64,
    ) -> JoinHandle<()> {
        let inner = Arc::clone(inner);
        let interval = inner.poll_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The zeroth tick resolves immediately; polls start one period in.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let outcome = extractor::extract(session.as_ref()).await;
                if !inner.apply_poll(generation, outcome).await {
                    break;
                }
            }
        })
    }

    /// Apply one poll outcome. Returns false when the poll task should stop,
    /// either because its generation was superseded or the session was lost.
    async fn apply_poll(&self, generation: u64, outcome: Result<Option<Snapshot>>) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(
                generation,
                live = state.generation,
                "discarding poll result from superseded session"
            );
            return false;
        }

        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(error = %e, "poll evaluation failed");
                self.notifier.notify("Lost tab connection", Severity::Warn);
                Self::teardown_locked(&mut state);
                return false;
            }
        };

        match (&snapshot, &state.last_snapshot) {
            (Some(current), previous) => {
                let title_changed = previous
                    .as_ref()
                    .map(|p| p.title != current.title)
                    .unwrap_or(true);
                if title_changed {
                    self.notifier.notify(
                        &format!("Now playing: {}", current.title),
                        Severity::Info,
                    );
                }
                if let Some(previous) = previous {
                    if previous.paused != current.paused {
                        if current.paused {
                            self.notifier.notify("Paused", Severity::Warn);
                        } else {
                            self.notifier.notify("Resumed", Severity::Ok);
                        }
                    }
                }
            }
            (None, Some(_)) => {
                self.notifier.notify("Playback stopped", Severity::Warn);
            }
            (None, None) => {}
        }

        state.last_snapshot = snapshot;
        self.sink.publish(state.last_snapshot.as_ref());
        true
    }
}
