//! Daemon configuration
//!
//! Two layers:
//!
//! - [`LaunchOptions`]: where the config file lives and how to bind, read
//!   from the environment (after `.env` is loaded)
//! - [`Config`]: the persisted JSON file
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | PRINTERD_CONFIG | $HOME/.printerd/config.json | config file path |
//! | PRINTERD_FORCE_LISTEN | false | remove a stale UNIX socket before binding |
//!
//! Without a home directory the config file defaults to
//! `/etc/printerd/config.json`.

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use shared::PrinterConfig;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SYSTEM_CONFIG_PATH: &str = "/etc/printerd/config.json";

/// Options taken from the process environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub config_path: PathBuf,
    pub force_listen: bool,
}

impl LaunchOptions {
    /// Read launch options from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read launch options through `lookup` (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = lookup("PRINTERD_CONFIG")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| match lookup("HOME").filter(|h| !h.is_empty()) {
                Some(home) => Path::new(&home).join(".printerd").join("config.json"),
                None => PathBuf::from(SYSTEM_CONFIG_PATH),
            });

        let force_listen = lookup("PRINTERD_FORCE_LISTEN")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            config_path,
            force_listen,
        }
    }
}

/// Persisted daemon configuration
///
/// Missing fields take their defaults, so a config file only needs the
/// settings it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verbose diagnostics and the `/_/stats` endpoint
    pub debug: bool,
    /// Reject every mutating API call
    pub read_only: bool,
    /// Account name sent during the local handshake
    pub username: String,
    /// Account token for local authentication and remote sessions
    pub auth_token: String,

    pub listen_socket: bool,
    pub listen_socket_path: PathBuf,
    pub listen_tcp: bool,
    pub listen_tcp_address: String,

    /// Printer client implementation
    pub driver: String,
    pub reconnect_delay_secs: u64,
    pub connect_timeout_secs: u64,
    pub operation_timeout_secs: u64,
    /// Upper bound on a print upload request body
    pub max_upload_bytes: usize,
    /// Daily rolling log files are written here when set
    pub log_dir: Option<PathBuf>,

    pub printers: Vec<PrinterConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            read_only: false,
            username: String::new(),
            auth_token: String::new(),
            listen_socket: true,
            listen_socket_path: PathBuf::from("/var/run/printerd.sock"),
            listen_tcp: false,
            listen_tcp_address: "127.0.0.1:6969".to_string(),
            driver: "simulated".to_string(),
            reconnect_delay_secs: 10,
            connect_timeout_secs: 10,
            operation_timeout_secs: 10,
            max_upload_bytes: 50 * 1024 * 1024,
            log_dir: None,
            printers: Vec::new(),
        }
    }
}

impl Config {
    /// Load the config file, writing a default one if it does not exist
    ///
    /// A file that exists but does not parse is an error; it is never
    /// overwritten.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        let config = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str::<Config>(&raw).map_err(|source| {
                ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Config::default();
                config.write_new(path)?;
                tracing::info!(path = %path.display(), "Wrote default config file");
                config
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Create `path` (and its directory) holding this config, mode 0600
    fn write_new(&self, path: &Path) -> Result<(), ConfigError> {
        use std::io::Write;

        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let body = serde_json::to_vec_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = options.open(path).map_err(io_err)?;
        file.write_all(&body).map_err(io_err)?;
        file.write_all(b"\n").map_err(io_err)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.listen_socket && !self.listen_tcp {
            return Err(ConfigError::NoListener);
        }
        if self.listen_tcp && self.listen_tcp_address.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidAddress(self.listen_tcp_address.clone()));
        }
        if self.reconnect_delay_secs == 0 {
            return Err(ConfigError::Zero("reconnect_delay_secs"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Zero("connect_timeout_secs"));
        }
        if self.operation_timeout_secs == 0 {
            return Err(ConfigError::Zero("operation_timeout_secs"));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Zero("max_upload_bytes"));
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ConnectionType;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_launch_options_defaults() {
        let opts = LaunchOptions::from_lookup(lookup(&[("HOME", "/home/maker")]));
        assert_eq!(
            opts.config_path,
            PathBuf::from("/home/maker/.printerd/config.json")
        );
        assert!(!opts.force_listen);

        let opts = LaunchOptions::from_lookup(lookup(&[]));
        assert_eq!(opts.config_path, PathBuf::from(SYSTEM_CONFIG_PATH));
    }

    #[test]
    fn test_launch_options_overrides() {
        let opts = LaunchOptions::from_lookup(lookup(&[
            ("PRINTERD_CONFIG", "/tmp/p.json"),
            ("PRINTERD_FORCE_LISTEN", "TRUE"),
        ]));
        assert_eq!(opts.config_path, PathBuf::from("/tmp/p.json"));
        assert!(opts.force_listen);
    }

    #[test]
    fn test_missing_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        // Second load reads the file back
        assert_eq!(Config::load_or_init(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "read_only": true,
                "auth_token": "tok",
                "printers": [
                    {"connection_type": "local", "ip": "10.0.0.5", "port": 9999},
                    {"connection_type": "remote", "id": "dev-1"}
                ]
            }"#,
        )
        .unwrap();

        let config = Config::load_or_init(&path).unwrap();
        assert!(config.read_only);
        assert_eq!(config.auth_token, "tok");
        assert_eq!(config.reconnect_delay(), Duration::from_secs(10));
        assert_eq!(config.max_upload_bytes, 52_428_800);
        assert_eq!(config.printers.len(), 2);
        assert_eq!(config.printers[1].connection_type, ConnectionType::Remote);
    }

    #[test]
    fn test_malformed_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_or_init(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.listen_socket = false;
        assert!(matches!(config.validate(), Err(ConfigError::NoListener)));

        config.listen_tcp = true;
        config.listen_tcp_address = ":6969".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAddress(_))));

        config.listen_tcp_address = "0.0.0.0:6969".to_string();
        config.reconnect_delay_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Zero("reconnect_delay_secs"))
        ));

        config.reconnect_delay_secs = 10;
        config.operation_timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Zero("operation_timeout_secs"))
        ));
    }
}
