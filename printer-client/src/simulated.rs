//! In-memory printers
//!
//! A [`SimulatedDevice`] stands in for a physical printer: it accepts
//! sessions, tracks its current job and records every command it receives.
//! Devices are registered with a [`SimulatedFactory`] under the key a
//! session would dial (`ip:port` for direct sessions, the device id for
//! relay sessions), so a device can appear, vanish or drop its session
//! while a client is retrying.

use crate::client::{ClientFactory, DisconnectCallback, PrintSource, PrinterClient};
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use shared::{Job, JobStep, Printer, PrinterConfig, PrinterMetadata};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// A print file received by a simulated device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPrint {
    pub filename: String,
    pub size: u64,
    pub data: Vec<u8>,
}

struct Session {
    id: u64,
    on_disconnect: Option<DisconnectCallback>,
}

struct DeviceState {
    printer: Printer,
    reachable: bool,
    /// Token the handshake must present (any token when unset)
    auth_token: Option<String>,
    command_error: Option<String>,
    camera_error: Option<String>,
    camera_frame: Option<Vec<u8>>,
    command_delay: Duration,
    prints: Vec<ReceivedPrint>,
    commands: Vec<String>,
    session: Option<Session>,
    sessions_opened: u64,
    next_job_id: u32,
}

/// A printer that lives in memory
pub struct SimulatedDevice {
    state: Mutex<DeviceState>,
}

impl SimulatedDevice {
    /// Idle two-extruder printer
    pub fn new(serial: impl Into<String>, machine_name: impl Into<String>) -> Self {
        Self::with_printer(Printer {
            serial: serial.into(),
            machine_name: machine_name.into(),
            machine_type: "simulated".to_string(),
            firmware_version: env!("CARGO_PKG_VERSION").to_string(),
            metadata: Some(PrinterMetadata {
                current_process: None,
                tool_count: 2,
            }),
        })
    }

    pub fn with_printer(printer: Printer) -> Self {
        Self {
            state: Mutex::new(DeviceState {
                printer,
                reachable: true,
                auth_token: None,
                command_error: None,
                camera_error: None,
                camera_frame: None,
                command_delay: Duration::ZERO,
                prints: Vec::new(),
                commands: Vec::new(),
                session: None,
                sessions_opened: 0,
                next_job_id: 1,
            }),
        }
    }

    /// Require `token` during authentication
    pub fn with_auth_token(self, token: impl Into<String>) -> Self {
        self.state.lock().auth_token = Some(token.into());
        self
    }

    // ========== Fault injection ==========

    /// Make the device (un)reachable; going unreachable drops the session
    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().reachable = reachable;
        if !reachable {
            self.drop_connection();
        }
    }

    /// Reject every command with `message` (or accept them again with `None`)
    pub fn fail_commands(&self, message: Option<&str>) {
        self.state.lock().command_error = message.map(str::to_string);
    }

    pub fn fail_camera(&self, message: Option<&str>) {
        self.state.lock().camera_error = message.map(str::to_string);
    }

    /// Delay applied before every command
    pub fn set_command_delay(&self, delay: Duration) {
        self.state.lock().command_delay = delay;
    }

    /// Drop the open session, firing its disconnect callback
    ///
    /// Returns false when no session was open.
    pub fn drop_connection(&self) -> bool {
        let session = self.state.lock().session.take();
        match session {
            Some(session) => {
                info!(session = session.id, "Simulated session dropped");
                if let Some(callback) = session.on_disconnect {
                    callback();
                }
                true
            }
            None => false,
        }
    }

    // ========== Device state ==========

    pub fn set_camera_frame(&self, frame: Vec<u8>) {
        self.state.lock().camera_frame = Some(frame);
    }

    pub fn set_metadata(&self, metadata: Option<PrinterMetadata>) {
        self.state.lock().printer.metadata = metadata;
    }

    /// Replace the current job (creating metadata if needed)
    pub fn set_job(&self, job: Option<Job>) {
        let mut state = self.state.lock();
        state
            .printer
            .metadata
            .get_or_insert_with(PrinterMetadata::default)
            .current_process = job;
    }

    pub fn printer(&self) -> Printer {
        self.state.lock().printer.clone()
    }

    /// Print files received so far
    pub fn prints(&self) -> Vec<ReceivedPrint> {
        self.state.lock().prints.clone()
    }

    /// Accepted commands, in order (e.g. `suspend`, `load_filament 1`)
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Number of sessions opened since creation
    pub fn sessions_opened(&self) -> u64 {
        self.state.lock().sessions_opened
    }

    // ========== Session plumbing ==========

    /// Open a session, replacing (and disconnecting) any previous one
    ///
    /// `callback` is only consumed on success.
    fn open_session(&self, callback: &mut Option<DisconnectCallback>) -> ClientResult<u64> {
        let (id, replaced) = {
            let mut state = self.state.lock();
            if !state.reachable {
                return Err(ClientError::Connection("connection refused".to_string()));
            }
            state.sessions_opened += 1;
            let id = state.sessions_opened;
            let replaced = state.session.replace(Session {
                id,
                on_disconnect: callback.take(),
            });
            (id, replaced)
        };
        debug!(session = id, "Simulated session opened");

        if let Some(callback) = replaced.and_then(|s| s.on_disconnect) {
            callback();
        }
        Ok(id)
    }

    fn is_session(&self, id: u64) -> bool {
        self.state
            .lock()
            .session
            .as_ref()
            .is_some_and(|s| s.id == id)
    }

    fn check_token(&self, token: &str) -> ClientResult<()> {
        match &self.state.lock().auth_token {
            Some(expected) if expected != token => {
                Err(ClientError::Authentication("invalid token".to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn delay(&self) {
        let delay = self.state.lock().command_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Apply a command unless commands are being rejected
    fn apply<F>(&self, command: String, f: F) -> ClientResult<()>
    where
        F: FnOnce(&mut DeviceState) -> ClientResult<()>,
    {
        let mut state = self.state.lock();
        if let Some(message) = &state.command_error {
            return Err(ClientError::Rejected(message.clone()));
        }
        f(&mut state)?;
        state.commands.push(command);
        Ok(())
    }
}

fn current_job(state: &mut DeviceState) -> ClientResult<&mut Job> {
    state
        .printer
        .metadata
        .as_mut()
        .and_then(|m| m.current_process.as_mut())
        .ok_or_else(|| ClientError::Rejected("no current job".to_string()))
}

fn check_tool(state: &DeviceState, tool_index: u32) -> ClientResult<()> {
    let tool_count = state.printer.metadata.as_ref().map_or(0, |m| m.tool_count);
    if tool_index >= tool_count {
        return Err(ClientError::Rejected(format!(
            "invalid tool index {}",
            tool_index
        )));
    }
    Ok(())
}

/// Flat grey PNG used when no frame has been set
fn placeholder_frame() -> ClientResult<Vec<u8>> {
    let frame = image::RgbImage::from_pixel(64, 48, image::Rgb([48, 48, 48]));
    let mut buf = Cursor::new(Vec::new());
    frame
        .write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| ClientError::Rejected(format!("camera error: {}", e)))?;
    Ok(buf.into_inner())
}

#[derive(Default)]
struct ClientLink {
    device: Option<Arc<SimulatedDevice>>,
    session: Option<u64>,
    authenticated: bool,
    on_disconnect: Option<DisconnectCallback>,
}

/// Session with a [`SimulatedDevice`]
pub struct SimulatedClient {
    devices: Arc<DashMap<String, Arc<SimulatedDevice>>>,
    link: Mutex<ClientLink>,
}

impl SimulatedClient {
    fn dial(&self, key: &str) -> ClientResult<Arc<SimulatedDevice>> {
        self.devices
            .get(key)
            .map(|d| d.value().clone())
            .ok_or_else(|| ClientError::Connection(format!("no route to {}", key)))
    }

    fn open(&self, device: Arc<SimulatedDevice>, authenticated: bool) -> ClientResult<()> {
        let mut link = self.link.lock();
        let session = device.open_session(&mut link.on_disconnect)?;
        link.device = Some(device);
        link.session = Some(session);
        link.authenticated = authenticated;
        Ok(())
    }

    /// Device behind the open, authenticated session
    fn connected(&self) -> ClientResult<Arc<SimulatedDevice>> {
        let link = self.link.lock();
        match (&link.device, link.session) {
            (Some(device), Some(session)) if link.authenticated && device.is_session(session) => {
                Ok(device.clone())
            }
            _ => Err(ClientError::NotConnected),
        }
    }
}

#[async_trait]
impl PrinterClient for SimulatedClient {
    async fn connect_local(&self, ip: &str, port: u16) -> ClientResult<()> {
        let device = self.dial(&format!("{}:{}", ip, port))?;
        self.open(device, false)
    }

    async fn connect_remote(&self, remote_id: &str, auth_token: &str) -> ClientResult<()> {
        let device = self.dial(remote_id)?;
        device.check_token(auth_token)?;
        self.open(device, true)
    }

    async fn authenticate(&self, auth_token: &str, username: &str) -> ClientResult<()> {
        let mut link = self.link.lock();
        let device = match (&link.device, link.session) {
            (Some(device), Some(session)) if device.is_session(session) => device.clone(),
            _ => return Err(ClientError::NotConnected),
        };
        device.check_token(auth_token)?;
        debug!(username, "Simulated session authenticated");
        link.authenticated = true;
        Ok(())
    }

    fn on_disconnect(&self, callback: DisconnectCallback) {
        self.link.lock().on_disconnect = Some(callback);
    }

    fn printer(&self) -> Printer {
        match &self.link.lock().device {
            Some(device) => device.printer(),
            None => Printer::default(),
        }
    }

    async fn camera_frame(&self) -> ClientResult<Vec<u8>> {
        let device = self.connected()?;
        device.delay().await;
        let frame = {
            let state = device.state.lock();
            if let Some(message) = &state.camera_error {
                return Err(ClientError::Rejected(message.clone()));
            }
            state.camera_frame.clone()
        };
        match frame {
            Some(frame) => Ok(frame),
            None => placeholder_frame(),
        }
    }

    async fn print(&self, filename: &str, mut data: PrintSource, size: u64) -> ClientResult<()> {
        let device = self.connected()?;
        device.delay().await;

        let mut buf = Vec::new();
        data.read_to_end(&mut buf).await?;
        if buf.len() as u64 != size {
            return Err(ClientError::Rejected(format!(
                "expected {} bytes, received {}",
                size,
                buf.len()
            )));
        }

        device.apply(format!("print {}", filename), |state| {
            let id = state.next_job_id;
            state.next_job_id += 1;
            state.prints.push(ReceivedPrint {
                filename: filename.to_string(),
                size,
                data: buf,
            });
            state
                .printer
                .metadata
                .get_or_insert_with(PrinterMetadata::default)
                .current_process = Some(Job {
                id,
                name: filename.to_string(),
                step: JobStep::Printing,
                progress: 0,
                elapsed_time: 0,
                time_estimation: 0,
                can_cancel: true,
            });
            Ok(())
        })
    }

    async fn suspend(&self) -> ClientResult<()> {
        let device = self.connected()?;
        device.delay().await;
        device.apply("suspend".to_string(), |state| {
            let job = current_job(state)?;
            if job.step != JobStep::Printing {
                return Err(ClientError::Rejected("job is not printing".to_string()));
            }
            job.step = JobStep::Suspended;
            Ok(())
        })
    }

    async fn resume(&self) -> ClientResult<()> {
        let device = self.connected()?;
        device.delay().await;
        device.apply("resume".to_string(), |state| {
            let job = current_job(state)?;
            if job.step != JobStep::Suspended {
                return Err(ClientError::Rejected("job is not suspended".to_string()));
            }
            job.step = JobStep::Printing;
            Ok(())
        })
    }

    async fn cancel(&self) -> ClientResult<()> {
        let device = self.connected()?;
        device.delay().await;
        device.apply("cancel".to_string(), |state| {
            let job = current_job(state)?;
            if !job.can_cancel {
                return Err(ClientError::Rejected("job cannot be cancelled".to_string()));
            }
            job.step = JobStep::Cancelled;
            Ok(())
        })
    }

    async fn load_filament(&self, tool_index: u32) -> ClientResult<()> {
        let device = self.connected()?;
        device.delay().await;
        device.apply(format!("load_filament {}", tool_index), |state| {
            check_tool(state, tool_index)
        })
    }

    async fn unload_filament(&self, tool_index: u32) -> ClientResult<()> {
        let device = self.connected()?;
        device.delay().await;
        device.apply(format!("unload_filament {}", tool_index), |state| {
            check_tool(state, tool_index)
        })
    }
}

/// Creates [`SimulatedClient`]s that dial registered devices
#[derive(Clone, Default)]
pub struct SimulatedFactory {
    devices: Arc<DashMap<String, Arc<SimulatedDevice>>>,
}

impl SimulatedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `device` under `key` (`ip:port` or remote id)
    pub fn insert_device(&self, key: impl Into<String>, device: SimulatedDevice) -> Arc<SimulatedDevice> {
        let device = Arc::new(device);
        self.devices.insert(key.into(), device.clone());
        device
    }

    pub fn remove_device(&self, key: &str) -> Option<Arc<SimulatedDevice>> {
        self.devices.remove(key).map(|(_, device)| device)
    }

    pub fn device(&self, key: &str) -> Option<Arc<SimulatedDevice>> {
        self.devices.get(key).map(|d| d.value().clone())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl ClientFactory for SimulatedFactory {
    fn driver(&self) -> &'static str {
        "simulated"
    }

    fn create(&self, config: &PrinterConfig) -> Arc<dyn PrinterClient> {
        debug!(printer = %config.key(), "Creating simulated client");
        Arc::new(SimulatedClient {
            devices: self.devices.clone(),
            link: Mutex::new(ClientLink::default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn factory_with_device() -> (SimulatedFactory, Arc<SimulatedDevice>) {
        let factory = SimulatedFactory::new();
        let device = factory.insert_device(
            "10.0.0.5:9999",
            SimulatedDevice::new("ABC123", "printer-name").with_auth_token("secret"),
        );
        (factory, device)
    }

    async fn connected_client(factory: &SimulatedFactory) -> Arc<dyn PrinterClient> {
        let client = factory.create(&PrinterConfig::local("10.0.0.5", 9999));
        client.connect_local("10.0.0.5", 9999).await.unwrap();
        client.authenticate("secret", "tester").await.unwrap();
        client
    }

    fn printing_job() -> Job {
        Job {
            id: 7,
            name: "benchy.makerbot".to_string(),
            step: JobStep::Printing,
            progress: 40,
            elapsed_time: 120,
            time_estimation: 900,
            can_cancel: true,
        }
    }

    #[tokio::test]
    async fn test_local_connect_requires_authentication() {
        let (factory, device) = factory_with_device();
        let client = factory.create(&PrinterConfig::local("10.0.0.5", 9999));

        client.connect_local("10.0.0.5", 9999).await.unwrap();
        assert!(device.is_connected());
        assert!(matches!(client.suspend().await, Err(ClientError::NotConnected)));

        let err = client.authenticate("wrong", "tester").await.unwrap_err();
        assert!(matches!(err, ClientError::Authentication(_)));

        client.authenticate("secret", "tester").await.unwrap();
        assert_eq!(client.printer().serial, "ABC123");
    }

    #[tokio::test]
    async fn test_unknown_address_fails() {
        let (factory, _device) = factory_with_device();
        let client = factory.create(&PrinterConfig::local("10.0.0.6", 9999));
        let err = client.connect_local("10.0.0.6", 9999).await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
    }

    #[tokio::test]
    async fn test_unreachable_device_refuses() {
        let (factory, device) = factory_with_device();
        device.set_reachable(false);
        let client = factory.create(&PrinterConfig::local("10.0.0.5", 9999));
        assert!(client.connect_local("10.0.0.5", 9999).await.is_err());
        assert_eq!(device.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_remote_connect() {
        let factory = SimulatedFactory::new();
        let device = factory.insert_device("dev-1", SimulatedDevice::new("R1", "remote-one"));
        let client = factory.create(&PrinterConfig::remote("dev-1"));

        client.connect_remote("dev-1", "token").await.unwrap();
        client.load_filament(0).await.unwrap();
        assert_eq!(device.commands(), vec!["load_filament 0".to_string()]);
    }

    #[tokio::test]
    async fn test_disconnect_callback_fires_once() {
        let (factory, device) = factory_with_device();
        let client = factory.create(&PrinterConfig::local("10.0.0.5", 9999));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        client.on_disconnect(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        client.connect_local("10.0.0.5", 9999).await.unwrap();
        client.authenticate("secret", "tester").await.unwrap();

        assert!(device.drop_connection());
        assert!(!device.drop_connection());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(matches!(client.resume().await, Err(ClientError::NotConnected)));
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let (factory, device) = factory_with_device();
        let client = connected_client(&factory).await;
        device.set_job(Some(printing_job()));

        client.suspend().await.unwrap();
        assert_eq!(client.printer().current_job().map(|j| j.step), Some(JobStep::Suspended));
        assert_eq!(client.suspend().await.unwrap_err().to_string(), "job is not printing");

        client.resume().await.unwrap();
        client.cancel().await.unwrap();
        assert_eq!(client.printer().current_job().map(|j| j.step), Some(JobStep::Cancelled));
        assert_eq!(device.commands(), vec!["suspend", "resume", "cancel"]);
    }

    #[tokio::test]
    async fn test_rejected_command_keeps_message() {
        let (factory, device) = factory_with_device();
        let client = connected_client(&factory).await;
        device.set_job(Some(printing_job()));
        device.fail_commands(Some("jammed"));

        let err = client.suspend().await.unwrap_err();
        assert_eq!(err.to_string(), "jammed");
        assert!(device.commands().is_empty());
    }

    #[tokio::test]
    async fn test_filament_tool_index_checked() {
        let (factory, _device) = factory_with_device();
        let client = connected_client(&factory).await;

        client.unload_filament(1).await.unwrap();
        let err = client.load_filament(2).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid tool index 2");
    }

    #[tokio::test]
    async fn test_print_records_file_and_starts_job() {
        let (factory, device) = factory_with_device();
        let client = connected_client(&factory).await;

        let data = b"0123456789".to_vec();
        client
            .print("part.makerbot", Box::new(Cursor::new(data.clone())), 10)
            .await
            .unwrap();

        let prints = device.prints();
        assert_eq!(prints.len(), 1);
        assert_eq!(prints[0].filename, "part.makerbot");
        assert_eq!(prints[0].size, 10);
        assert_eq!(prints[0].data, data);

        let job = client.printer().current_job().cloned().unwrap();
        assert_eq!(job.name, "part.makerbot");
        assert_eq!(job.step, JobStep::Printing);
    }

    #[tokio::test]
    async fn test_print_size_mismatch() {
        let (factory, device) = factory_with_device();
        let client = connected_client(&factory).await;

        let err = client
            .print("short.makerbot", Box::new(Cursor::new(b"abc".to_vec())), 10)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "expected 10 bytes, received 3");
        assert!(device.prints().is_empty());
    }

    #[tokio::test]
    async fn test_camera_frames() {
        let (factory, device) = factory_with_device();
        let client = connected_client(&factory).await;

        let frame = client.camera_frame().await.unwrap();
        assert_eq!(image::guess_format(&frame).unwrap(), image::ImageFormat::Png);

        device.set_camera_frame(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(client.camera_frame().await.unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);

        device.fail_camera(Some("camera offline"));
        assert_eq!(client.camera_frame().await.unwrap_err().to_string(), "camera offline");
    }

    #[tokio::test]
    async fn test_new_session_disconnects_previous() {
        let (factory, device) = factory_with_device();
        let first = factory.create(&PrinterConfig::local("10.0.0.5", 9999));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        first.on_disconnect(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        first.connect_local("10.0.0.5", 9999).await.unwrap();

        let _second = connected_client(&factory).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(device.sessions_opened(), 2);
    }
}
