//! Reconciliation driver: ticks the session manager on a fixed interval
//! until shutdown, then runs one final teardown.

use std::time::Duration;

use tracing::info;

use trackcast_core::LinkState;

use crate::session::SessionManager;

pub struct MonitorService {
    manager: SessionManager,
    interval: Duration,
}

impl MonitorService {
    pub fn new(manager: SessionManager, interval: Duration) -> Self {
        Self { manager, interval }
    }

    pub async fn run_loop(self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "MonitorService started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_state = LinkState::Down;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.manager.reconcile().await;
                    let state = self.manager.link_state().await;
                    if state != last_state {
                        info!(%state, "link state changed");
                        last_state = state;
                    }
                }
                _ = shutdown.recv() => {
                    info!("MonitorService shutting down");
                    break;
                }
            }
        }

        self.manager.teardown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use trackcast_core::config::MonitorConfig;
    use trackcast_core::{Error, Result, Severity, Snapshot, Target};

    use crate::session::{Notifier, PageSession, SessionFactory, SnapshotSink};
    use crate::targets::TargetSource;

    struct CountingTargets {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TargetSource for CountingTargets {
        async fn list_targets(&self) -> Result<Vec<Target>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Unreachable("nothing listening".to_string()))
        }
    }

    struct NeverFactory;

    #[async_trait]
    impl SessionFactory for NeverFactory {
        async fn open(&self, _target: &Target) -> Result<Arc<dyn PageSession>> {
            Err(Error::Connect("unused".to_string()))
        }
    }

    struct NullSink;

    impl Notifier for NullSink {
        fn notify(&self, _message: &str, _severity: Severity) {}
    }

    impl SnapshotSink for NullSink {
        fn publish(&self, _snapshot: Option<&Snapshot>) {}
    }

    #[tokio::test]
    async fn test_run_loop_ticks_until_shutdown() {
        let targets = Arc::new(CountingTargets {
            calls: AtomicUsize::new(0),
        });
        let config = MonitorConfig {
            reconcile_interval_ms: 10,
            ..MonitorConfig::default()
        };
        let manager = SessionManager::new(
            targets.clone(),
            Arc::new(NeverFactory),
            Arc::new(NullSink),
            Arc::new(NullSink),
            &config,
        );
        let service = MonitorService::new(manager, config.reconcile_interval());

        let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
        let handle = tokio::spawn(service.run_loop(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let ticked = targets.calls.load(Ordering::SeqCst);
        assert!(ticked >= 2, "expected several reconciliations, got {}", ticked);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
