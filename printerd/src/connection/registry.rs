//! Connection registry
//!
//! The fixed set of supervisors, built once at startup. Lookups only see
//! connected supervisors, so an unreachable printer is indistinguishable
//! from an unconfigured one.

use super::supervisor::{Credentials, Supervisor, SupervisorPolicy};
use crate::core::{BackgroundTasks, Config};
use printer_client::{ClientFactory, PrinterClient};
use shared::{ConnectionStatus, Printer};
use std::sync::Arc;

/// A resolved, connected printer
///
/// Holds the client that was live at lookup time, so a handler keeps
/// talking to the same session even if the supervisor reconnects.
#[derive(Clone)]
pub struct LiveConnection {
    pub supervisor: Arc<Supervisor>,
    pub client: Arc<dyn PrinterClient>,
    /// Printer state reported at lookup time
    pub printer: Printer,
}

/// All supervisors, in configuration order
pub struct ConnectionRegistry {
    supervisors: Vec<Arc<Supervisor>>,
}

impl ConnectionRegistry {
    pub fn new(supervisors: Vec<Arc<Supervisor>>) -> Self {
        Self { supervisors }
    }

    /// One supervisor per configured printer
    pub fn from_config(config: &Config, factory: Arc<dyn ClientFactory>) -> Self {
        let credentials = Credentials {
            username: config.username.clone(),
            auth_token: config.auth_token.clone(),
        };
        let policy = SupervisorPolicy {
            reconnect_delay: config.reconnect_delay(),
            connect_timeout: config.connect_timeout(),
        };

        let supervisors = config
            .printers
            .iter()
            .map(|printer| {
                Arc::new(Supervisor::new(
                    printer.clone(),
                    credentials.clone(),
                    factory.clone(),
                    policy,
                ))
            })
            .collect();
        Self::new(supervisors)
    }

    pub fn supervisors(&self) -> &[Arc<Supervisor>] {
        &self.supervisors
    }

    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }

    fn live(&self) -> impl Iterator<Item = LiveConnection> + '_ {
        self.supervisors.iter().filter_map(|supervisor| {
            supervisor.client().map(|client| LiveConnection {
                printer: client.printer(),
                supervisor: supervisor.clone(),
                client,
            })
        })
    }

    /// Reported state of every connected printer, in registry order
    pub fn connected_printers(&self) -> Vec<Printer> {
        self.live().map(|c| c.printer).collect()
    }

    pub fn connected_count(&self) -> usize {
        self.supervisors.iter().filter(|s| s.is_connected()).count()
    }

    /// Connected printer whose serial equals `query` or whose machine name
    /// equals it ignoring case
    ///
    /// Scans every entry; when several match, the last one in registry order
    /// wins.
    pub fn find(&self, query: &str) -> Option<LiveConnection> {
        self.live().filter(|c| c.printer.matches(query)).last()
    }

    /// Connected printer with exactly this serial (last match wins)
    pub fn by_serial(&self, serial: &str) -> Option<LiveConnection> {
        self.live().filter(|c| c.printer.serial == serial).last()
    }

    /// Status of every supervisor, connected or not
    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        self.supervisors.iter().map(|s| s.status()).collect()
    }

    /// Start one supervising task per printer
    pub fn spawn_all(&self, tasks: &mut BackgroundTasks) {
        for supervisor in &self.supervisors {
            let shutdown = tasks.shutdown_token();
            tasks.spawn(
                format!("supervisor:{}", supervisor.key()),
                supervisor.clone().run(shutdown),
            );
        }
    }
}
