//! printerd - printer connection supervisor and HTTP control plane
//!
//! # Module layout
//!
//! ```text
//! printerd/src/
//! ├── core/          # config, state, server, background tasks, errors
//! ├── connection/    # supervisors, registry, client drivers
//! ├── api/           # HTTP routes and handlers
//! ├── services/      # router assembly
//! └── utils/         # logging
//! ```

pub mod api;
pub mod connection;
pub mod core;
pub mod services;
pub mod utils;

// Re-export public types
pub use connection::{ConnectionRegistry, LiveConnection, Supervisor, SupervisorPolicy, build_factory};
pub use core::{BackgroundTasks, Config, ConfigError, LaunchOptions, Server, ServerError, ServerState};
pub use services::{build_app, build_router};

// Re-export logger functions
pub use utils::logger::init_logger;
