//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise the config's `debug` flag picks the
//! default filter.

use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";
const DEBUG_FILTER: &str = "info,printerd=debug,printer_client=debug";

/// Default filter directives for the given verbosity
pub fn default_filter(debug: bool) -> &'static str {
    if debug { DEBUG_FILTER } else { DEFAULT_FILTER }
}

/// Initialize the logger
///
/// With `log_dir`, output goes to a daily rolling file (`printerd.log.YYYY-MM-DD`)
/// instead of stdout.
pub fn init_logger(debug: bool, log_dir: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(debug);

    if let Some(dir) = log_dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(dir, "printerd.log");
                subscriber.with_writer(file_appender).with_ansi(false).init();
                return;
            }
            Err(e) => eprintln!("cannot create log dir {}: {}", dir.display(), e),
        }
    }

    subscriber.init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "info");
        assert!(default_filter(true).contains("printerd=debug"));
        assert!(EnvFilter::try_new(default_filter(true)).is_ok());
    }
}
