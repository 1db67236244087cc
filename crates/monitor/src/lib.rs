//! Browser link monitoring — endpoint discovery, tab binding, media polling.
//!
//! The session manager owns the reachability/tab/session lifecycle; the
//! service drives it on a fixed reconciliation timer. Everything the manager
//! touches externally (target listing, protocol sessions, notifications,
//! snapshot fan-out) goes through injected collaborators, so the state
//! machine is testable without a running browser.

pub mod cdp;
pub mod extractor;
pub mod service;
pub mod session;
pub mod targets;

pub use cdp::{CdpClient, CdpSessionFactory};
pub use service::MonitorService;
pub use session::{
    Notifier, PageSession, SessionFactory, SessionManager, SnapshotSink, TracingNotifier,
};
pub use targets::{select_target, HttpTargetSource, TargetSource};
