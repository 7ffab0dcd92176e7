//! Shared setup for the scheduler specs

pub use courier_adapters::{FakeSurface, FakeTransport, SharedIdentity, TransportError};
pub use courier_core::{
    AlertMessage, AppSignal, Clock, CustomEvent, EventRecord, FakeClock, Query, ReportBatch,
    SchedulerConfig, ServiceState, SessionRecord,
};
pub use courier_engine::{
    AlertQueue, EventsService, LifecycleService, OperationError, ServiceHub, SessionService,
};
pub use courier_storage::FileStore;
pub use std::sync::Arc;
pub use std::time::Duration;

use courier_adapters::RecordStore;
use tempfile::TempDir;

pub type Events = EventsService<FileStore<EventRecord>, SharedIdentity, FakeClock>;
pub type Sessions = SessionService<FileStore<SessionRecord>, SharedIdentity, FakeClock>;
pub type Alerts = AlertQueue<FakeSurface, FakeClock>;

/// Every service wired to one hub, over a temporary store directory
pub struct Scheduler {
    pub hub: ServiceHub,
    pub events: Arc<Events>,
    pub sessions: Sessions,
    pub alerts: Arc<Alerts>,
    pub transport: FakeTransport,
    pub surface: FakeSurface,
    pub identity: SharedIdentity,
    pub clock: FakeClock,
    pub dir: TempDir,
}

impl Scheduler {
    /// Started scheduler in test mode, registered as `reg-1`
    pub fn started() -> Self {
        Self::with_config(SchedulerConfig::for_tests())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new();
        let surface = FakeSurface::new();
        let identity = SharedIdentity::registered("reg-1");
        let clock = FakeClock::new();

        let events = Arc::new(EventsService::new(
            FileStore::open(dir.path()).unwrap(),
            transport.clone(),
            identity.clone(),
            clock.clone(),
            &config,
        ));
        let sessions = SessionService::new(
            FileStore::open(dir.path()).unwrap(),
            transport.clone(),
            identity.clone(),
            clock.clone(),
            &config,
        );
        let alerts = Arc::new(AlertQueue::new(surface.clone(), clock.clone(), true));

        let mut hub = ServiceHub::new();
        hub.register(events.clone());
        hub.register(Arc::new(sessions.clone()));
        hub.register(alerts.clone());
        hub.start_all();

        Self {
            hub,
            events,
            sessions,
            alerts,
            transport,
            surface,
            identity,
            clock,
            dir,
        }
    }

    /// Events still on disk, read through a fresh store
    pub async fn stored_events(&self) -> Vec<EventRecord> {
        let store: FileStore<EventRecord> = FileStore::open(self.dir.path()).unwrap();
        store.find(&Query::all()).await.unwrap()
    }

    pub async fn stored_sessions(&self) -> Vec<SessionRecord> {
        let store: FileStore<SessionRecord> = FileStore::open(self.dir.path()).unwrap();
        store.find(&Query::all()).await.unwrap()
    }

    pub async fn idle(&self) {
        self.events.pipeline().wait_idle().await;
        self.sessions.pipeline().wait_idle().await;
    }
}

/// Number of events carried by each delivered event batch
pub fn event_batch_sizes(transport: &FakeTransport) -> Vec<usize> {
    transport
        .delivered()
        .iter()
        .filter_map(|batch| match batch {
            ReportBatch::Events { events, .. } => Some(events.len()),
            ReportBatch::Sessions { .. } => None,
        })
        .collect()
}
