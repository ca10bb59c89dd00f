// printerd/tests/supervisor.rs
// Supervising loop: reconnects, retries and shutdown against simulated printers

use printer_client::{SimulatedDevice, SimulatedFactory};
use printerd::connection::Credentials;
use printerd::{ConnectionRegistry, Supervisor, SupervisorPolicy};
use shared::{ConnectionState, ConnectionType, PrinterConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

const WAIT_LIMIT: Duration = Duration::from_secs(5);

fn policy() -> SupervisorPolicy {
    SupervisorPolicy {
        reconnect_delay: Duration::from_millis(200),
        connect_timeout: Duration::from_secs(1),
    }
}

fn start(supervisor: &Arc<Supervisor>) -> (CancellationToken, JoinHandle<()>) {
    let token = CancellationToken::new();
    let handle = tokio::spawn(supervisor.clone().run(token.clone()));
    (token, handle)
}

async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT_LIMIT;
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        sleep(Duration::from_millis(2)).await;
    }
}

fn local_supervisor(factory: &SimulatedFactory) -> (Arc<Supervisor>, Arc<SimulatedDevice>) {
    let device = factory.insert_device(
        "10.0.0.5:9999",
        SimulatedDevice::new("ABC123", "printer-name").with_auth_token("secret"),
    );
    let supervisor = Arc::new(Supervisor::new(
        PrinterConfig::local("10.0.0.5", 9999),
        Credentials {
            username: "maker".to_string(),
            auth_token: "secret".to_string(),
        },
        Arc::new(factory.clone()),
        policy(),
    ));
    (supervisor, device)
}

#[tokio::test]
async fn test_reconnects_after_dropped_session() {
    let factory = SimulatedFactory::new();
    let (supervisor, device) = local_supervisor(&factory);
    let (token, handle) = start(&supervisor);

    eventually("first connect", || supervisor.is_connected()).await;
    assert_eq!(device.sessions_opened(), 1);

    assert!(device.drop_connection());
    eventually("disconnect noticed", || !supervisor.is_connected()).await;
    assert_eq!(
        supervisor.status().last_error.as_deref(),
        Some("connection lost")
    );

    eventually("reconnect", || supervisor.is_connected()).await;
    assert_eq!(device.sessions_opened(), 2);
    assert!(device.is_connected());
    assert!(supervisor.status().last_error.is_none());

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_keeps_retrying_while_unreachable() {
    let factory = SimulatedFactory::new();
    let (supervisor, device) = local_supervisor(&factory);
    let (token, handle) = start(&supervisor);

    eventually("first connect", || supervisor.is_connected()).await;
    let attempts_before = supervisor.status().attempts;

    device.set_reachable(false);
    eventually("several failed attempts", || {
        supervisor.status().attempts >= attempts_before + 2
    })
    .await;
    assert!(!supervisor.is_connected());
    assert_eq!(
        supervisor.status().last_error.as_deref(),
        Some("connection failed: connection refused")
    );

    device.set_reachable(true);
    eventually("reconnect once reachable", || supervisor.is_connected()).await;

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_removed_printer_is_retried_until_it_returns() {
    let factory = SimulatedFactory::new();
    let (supervisor, device) = local_supervisor(&factory);
    let (token, handle) = start(&supervisor);

    eventually("first connect", || supervisor.is_connected()).await;

    let removed = factory.remove_device("10.0.0.5:9999").unwrap();
    assert!(Arc::ptr_eq(&removed, &device));
    assert!(factory.is_empty());
    let attempts_before = supervisor.status().attempts;
    assert!(device.drop_connection());

    eventually("failed redials", || {
        supervisor.status().attempts >= attempts_before + 2
    })
    .await;
    assert!(!supervisor.is_connected());
    assert_eq!(
        supervisor.status().last_error.as_deref(),
        Some("connection failed: no route to 10.0.0.5:9999")
    );

    factory.insert_device(
        "10.0.0.5:9999",
        SimulatedDevice::new("ABC123", "printer-name").with_auth_token("secret"),
    );
    eventually("reconnect after return", || supervisor.is_connected()).await;

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_invalid_connection_type_retries_forever() {
    let factory = SimulatedFactory::new();
    let config = PrinterConfig {
        connection_type: ConnectionType::Unknown("usb".to_string()),
        id: "p1".to_string(),
        ip: String::new(),
        port: 0,
    };
    let supervisor = Arc::new(Supervisor::new(
        config,
        Credentials::default(),
        Arc::new(factory),
        SupervisorPolicy {
            reconnect_delay: Duration::from_millis(10),
            connect_timeout: Duration::from_secs(1),
        },
    ));
    let (token, handle) = start(&supervisor);

    eventually("repeated attempts", || supervisor.status().attempts >= 3).await;
    let status = supervisor.status();
    assert_eq!(status.state, ConnectionState::Disconnected);
    assert_eq!(
        status.last_error.as_deref(),
        Some(r#"invalid connection type "usb""#)
    );

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_printer_appearing_later_is_picked_up() {
    let factory = SimulatedFactory::new();
    let supervisor = Arc::new(Supervisor::new(
        PrinterConfig::remote("dev-7"),
        Credentials::default(),
        Arc::new(factory.clone()),
        SupervisorPolicy {
            reconnect_delay: Duration::from_millis(20),
            connect_timeout: Duration::from_secs(1),
        },
    ));
    let (token, handle) = start(&supervisor);

    eventually("failed attempt", || supervisor.status().attempts >= 1).await;
    assert!(!supervisor.is_connected());

    factory.insert_device("dev-7", SimulatedDevice::new("R7", "remote-seven"));
    eventually("remote connect", || supervisor.is_connected()).await;
    assert_eq!(supervisor.status().serial.as_deref(), Some("R7"));

    token.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_leaves_supervisor_disconnected() {
    let factory = SimulatedFactory::new();
    let (supervisor, _device) = local_supervisor(&factory);
    let (token, handle) = start(&supervisor);

    eventually("first connect", || supervisor.is_connected()).await;

    token.cancel();
    tokio::time::timeout(WAIT_LIMIT, handle)
        .await
        .expect("supervisor did not stop")
        .unwrap();
    assert!(!supervisor.is_connected());
    assert!(supervisor.status().connected_since.is_none());
}

#[tokio::test]
async fn test_registry_hides_printer_while_reconnecting() {
    let factory = SimulatedFactory::new();
    let device = factory.insert_device("10.0.0.5:9999", SimulatedDevice::new("ABC123", "printer-name"));

    let mut config = printerd::Config::default();
    config.reconnect_delay_secs = 1;
    config.printers.push(PrinterConfig::local("10.0.0.5", 9999));
    let registry = ConnectionRegistry::from_config(&config, Arc::new(factory.clone()));

    let mut tasks = printerd::BackgroundTasks::new();
    registry.spawn_all(&mut tasks);

    eventually("visible", || registry.find("ABC123").is_some()).await;

    device.drop_connection();
    eventually("hidden", || registry.find("ABC123").is_none()).await;
    assert!(registry.connected_printers().is_empty());

    eventually("visible again", || registry.find("printer-name").is_some()).await;

    tasks.shutdown().await;
}
