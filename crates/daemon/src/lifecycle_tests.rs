// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use courier_core::ServiceState;
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> HostConfig {
    HostConfig {
        scheduler: SchedulerConfig::for_tests(),
        store_dir: Some(dir.path().to_path_buf()),
        registration_id: Some("reg-1".to_string()),
        alert_display: Duration::from_millis(50),
        ..HostConfig::default()
    }
}

#[test]
fn parses_full_config() {
    let config = HostConfig::from_toml(
        r#"
        store_dir = "/var/lib/courier"
        registration_id = "reg-9"
        alert_display = "2s"

        [scheduler]
        session_timeout = "45s"
        test_mode = true

        [transport]
        base_url = "https://push.example.test"
        application_code = "app-code"
        "#,
    )
    .unwrap();

    assert_eq!(config.store_dir, Some(PathBuf::from("/var/lib/courier")));
    assert_eq!(config.alert_display, Duration::from_secs(2));
    assert_eq!(config.scheduler.session_timeout, Duration::from_secs(45));
    assert!(config.scheduler.test_mode);
    let transport = config.transport.unwrap();
    assert_eq!(transport.application_code, "app-code");
    assert_eq!(transport.timeout, Duration::from_secs(30));
}

#[test]
fn empty_config_uses_defaults() {
    let config = HostConfig::from_toml("").unwrap();

    assert!(config.transport.is_none());
    assert_eq!(config.alert_display, Duration::from_secs(5));
    assert_eq!(config.scheduler, SchedulerConfig::default());
}

#[test]
fn rejects_unknown_keys_and_invalid_scheduler() {
    assert!(matches!(
        HostConfig::from_toml("socket = \"/tmp/x\""),
        Err(LifecycleError::Config(_))
    ));
    assert!(matches!(
        HostConfig::from_toml("[scheduler]\nmax_batch_size = 0"),
        Err(LifecycleError::Config(ConfigError::Invalid(_)))
    ));
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = HostConfig::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(LifecycleError::Config(ConfigError::Io { .. }))));
}

#[tokio::test]
async fn startup_resumes_every_service() {
    let dir = TempDir::new().unwrap();
    let host = startup(test_config(&dir)).await.unwrap();

    assert_eq!(host.hub.services().len(), 3);
    for service in host.hub.services() {
        assert_eq!(service.state(), ServiceState::Resumed);
    }
    assert!(!host.sessions.timer_running());

    host.shutdown().await;
}

#[tokio::test]
async fn events_persist_to_the_store_dir() {
    let dir = TempDir::new().unwrap();
    let host = startup(test_config(&dir)).await.unwrap();

    let reply = host
        .execute(Command::Event {
            event: CustomEvent::new("purchase"),
            immediately: false,
        })
        .await;

    assert_eq!(reply, "OK");
    assert!(dir.path().join("events.jsonl").exists());
    host.shutdown().await;
}

#[tokio::test]
async fn unregistered_event_is_refused() {
    let dir = TempDir::new().unwrap();
    let host = startup(test_config(&dir)).await.unwrap();

    host.execute(Command::Register(None)).await;
    let reply = host
        .execute(Command::Event {
            event: CustomEvent::new("purchase"),
            immediately: true,
        })
        .await;

    assert!(reply.starts_with("ERROR"), "{}", reply);
    host.shutdown().await;
}

#[tokio::test]
async fn session_reply_reports_no_session_in_test_mode() {
    let dir = TempDir::new().unwrap();
    let host = startup(test_config(&dir)).await.unwrap();

    assert_eq!(host.execute(Command::Session).await, "SESSION none");
    host.shutdown().await;
}

#[tokio::test]
async fn shutdown_cancels_alerts_on_screen() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.alert_display = Duration::from_secs(3600);
    let host = startup(config).await.unwrap();

    assert_eq!(
        host.execute(Command::Alert(AlertMessage::native("m1", "hello")))
            .await,
        "OK"
    );
    let alerts = host.alerts.clone();

    tokio::time::timeout(Duration::from_secs(5), host.shutdown())
        .await
        .unwrap();
    assert!(alerts.queue().is_idle());
    assert_eq!(alerts.state(), ServiceState::Suspended);
}
