//! ForgeHub platform library: achievement engine plus the service-level
//! configuration, telemetry, and error surface shared by the binaries.

pub mod achievements;
pub mod config;
pub mod error;
pub mod telemetry;
