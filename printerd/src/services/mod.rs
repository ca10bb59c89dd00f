//! Services
//!
//! - [`http`] - router assembly and request logging

pub mod http;

pub use http::{build_app, build_router};
