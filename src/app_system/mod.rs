//! Platform startup, configuration, telemetry and shutdown.

pub mod config;
pub mod platform;
pub mod telemetry;

pub use config::*;
pub use platform::*;
pub use telemetry::*;
