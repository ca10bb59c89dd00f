//! Printer client drivers

use crate::core::{Config, ConfigError};
use printer_client::{ClientFactory, SimulatedDevice, SimulatedFactory};
use std::sync::Arc;

/// Client factory for `config.driver`
///
/// `simulated` registers one in-memory device per configured printer, so
/// the daemon can run without hardware.
pub fn build_factory(config: &Config) -> Result<Arc<dyn ClientFactory>, ConfigError> {
    match config.driver.as_str() {
        "simulated" => {
            let factory = SimulatedFactory::new();
            for (index, printer) in config.printers.iter().enumerate() {
                let n = index + 1;
                factory.insert_device(
                    printer.key(),
                    SimulatedDevice::new(format!("SIM{:05}", n), format!("simulated-{}", n)),
                );
            }
            tracing::info!(devices = factory.len(), "Using simulated printer driver");
            Ok(Arc::new(factory))
        }
        other => Err(ConfigError::UnknownDriver(other.to_string())),
    }
}
