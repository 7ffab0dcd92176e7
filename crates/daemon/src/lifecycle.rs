// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host lifecycle: configuration, startup, shutdown.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use courier_adapters::{
    HeadlessSurface, HttpTransport, HttpTransportConfig, NoOpTransport, ReportTransport,
    SharedIdentity, StoreError, TracedStore, TracedTransport,
};
use courier_core::{
    AlertMessage, AppSignal, ConfigError, CustomEvent, EventRecord, SchedulerConfig,
    SessionRecord, SystemClock,
};
use courier_engine::{AlertQueue, EventsService, LifecycleService, ServiceHub, SessionService};
use courier_storage::FileStore;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::command::Command;

/// Event service over the file store
pub type HostEvents =
    EventsService<TracedStore<FileStore<EventRecord>, EventRecord>, SharedIdentity, SystemClock>;

/// Session service over the file store
pub type HostSessions = SessionService<
    TracedStore<FileStore<SessionRecord>, SessionRecord>,
    SharedIdentity,
    SystemClock,
>;

pub type HostAlerts = AlertQueue<HeadlessSurface, SystemClock>;

/// Host configuration, read from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub scheduler: SchedulerConfig,
    /// Where records are kept; defaults to the user's local data directory
    pub store_dir: Option<PathBuf>,
    /// Log file; logs go to stderr when unset
    pub log_path: Option<PathBuf>,
    /// Backend to report to; reports are dropped when unset
    pub transport: Option<TransportSettings>,
    pub registration_id: Option<String>,
    /// How long the headless surface keeps an alert up
    #[serde(with = "humantime_serde")]
    pub alert_display: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            store_dir: None,
            log_path: None,
            transport: None,
            registration_id: None,
            alert_display: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportSettings {
    pub base_url: String,
    pub application_code: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

impl HostConfig {
    pub fn from_toml(source: &str) -> Result<Self, LifecycleError> {
        let config: HostConfig = toml::from_str(source).map_err(ConfigError::from)?;
        config.scheduler.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Resolved store directory
    pub fn store_dir(&self) -> Result<PathBuf, LifecycleError> {
        match &self.store_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|dir| dir.join("courier"))
                .ok_or(LifecycleError::NoStateDir),
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running host: services, the hub that drives them, and its signal loop
pub struct Host {
    pub config: HostConfig,
    pub identity: SharedIdentity,
    pub events: Arc<HostEvents>,
    pub sessions: HostSessions,
    pub alerts: Arc<HostAlerts>,
    pub hub: ServiceHub,
    signals: mpsc::Sender<AppSignal>,
    stop: CancellationToken,
    signal_loop: JoinHandle<()>,
    pub start_time: Instant,
}

fn build_services<T: ReportTransport>(
    transport: T,
    config: &HostConfig,
    dir: &Path,
    identity: &SharedIdentity,
) -> Result<(HostEvents, HostSessions), LifecycleError> {
    let events = EventsService::new(
        TracedStore::new(FileStore::open(dir)?),
        transport.clone(),
        identity.clone(),
        SystemClock,
        &config.scheduler,
    );
    let sessions = SessionService::new(
        TracedStore::new(FileStore::open(dir)?),
        transport,
        identity.clone(),
        SystemClock,
        &config.scheduler,
    );
    Ok((events, sessions))
}

/// Start the host
pub async fn startup(config: HostConfig) -> Result<Host, LifecycleError> {
    let dir = config.store_dir()?;
    std::fs::create_dir_all(&dir)?;

    let identity = SharedIdentity::new();
    identity.set(config.registration_id.clone());

    let (events, sessions) = match &config.transport {
        Some(settings) => {
            info!(base_url = %settings.base_url, "reporting to backend");
            let transport = TracedTransport::new(HttpTransport::new(HttpTransportConfig {
                base_url: settings.base_url.clone(),
                application_code: settings.application_code.clone(),
                timeout: settings.timeout,
            }));
            build_services(transport, &config, &dir, &identity)?
        }
        None => {
            info!("no backend configured, reports are dropped");
            build_services(NoOpTransport::new(), &config, &dir, &identity)?
        }
    };
    let events = Arc::new(events);
    // A headless host has no background state; it is always foreground-active
    let alerts = Arc::new(AlertQueue::new(
        HeadlessSurface::new(config.alert_display),
        SystemClock,
        true,
    ));

    let mut hub = ServiceHub::new();
    hub.register(events.clone());
    hub.register(Arc::new(sessions.clone()));
    hub.register(alerts.clone());
    hub.start_all();

    let (signals, rx) = mpsc::channel(16);
    let stop = CancellationToken::new();
    let signal_loop = tokio::spawn({
        let hub = hub.clone();
        let stop = stop.clone();
        async move { hub.run(rx, stop).await }
    });

    info!(store = %dir.display(), test_mode = config.scheduler.test_mode, "host started");

    Ok(Host {
        config,
        identity,
        events,
        sessions,
        alerts,
        hub,
        signals,
        stop,
        signal_loop,
        start_time: Instant::now(),
    })
}

impl Host {
    /// Carry out one command, returning the reply line
    pub async fn execute(&self, command: Command) -> String {
        match command {
            Command::Signal(signal) => {
                if self.signals.send(signal).await.is_err() {
                    return "ERROR signal loop stopped".to_string();
                }
                "OK".to_string()
            }
            Command::Event { event, immediately } => self.submit_event(event, immediately).await,
            Command::Alert(message) => self.show_alert(message),
            Command::CancelAlerts => {
                self.alerts.cancel_all_alerts();
                "OK".to_string()
            }
            Command::Register(id) => {
                info!(registered = id.is_some(), "registration changed");
                self.identity.set(id);
                "OK".to_string()
            }
            Command::Flush => match self.events.flush() {
                Some(_) => "OK".to_string(),
                None => "BUSY".to_string(),
            },
            Command::Session => match self.sessions.current_session_id().await {
                Ok(Some(id)) => format!("SESSION {}", id),
                Ok(None) => "SESSION none".to_string(),
                Err(e) => format!("ERROR {}", e),
            },
            Command::Status => format!(
                "STATUS uptime={}s events={:?} sessions={:?} alerts={:?}",
                self.start_time.elapsed().as_secs(),
                self.events.state(),
                self.sessions.state(),
                self.alerts.state()
            ),
            Command::Quit => "BYE".to_string(),
        }
    }

    async fn submit_event(&self, event: CustomEvent, immediately: bool) -> String {
        match self.events.submit(event, immediately).await {
            Ok(()) => "OK".to_string(),
            Err(e) => format!("ERROR {}", e),
        }
    }

    fn show_alert(&self, message: AlertMessage) -> String {
        let id = message.id.clone();
        let handle = self.alerts.enqueue_alert(message);
        tokio::spawn(async move {
            handle.wait_finished().await;
            if let Some(Err(e)) = handle.outcome() {
                info!(alert = %id, error = %e, "alert ended without dismissal");
            }
        });
        "OK".to_string()
    }

    /// Stop the signal loop, then suspend every service and wait for its work
    pub async fn shutdown(self) {
        info!("Shutting down host...");
        self.stop.cancel();
        if let Err(e) = self.signal_loop.await {
            tracing::warn!(error = %e, "signal loop did not stop cleanly");
        }
        self.hub.shutdown().await;
        info!("Host shutdown complete");
    }
}

pub fn setup_logging(
    config: &HostConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_path) = &config.log_path else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = log_path.parent().ok_or(LifecycleError::NoStateDir)?;
    std::fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::never(
        dir,
        log_path.file_name().ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
