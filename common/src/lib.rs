//! Shared model for the `lanwake` workspace.
//!
//! * [`device`]: device identity and liveness status.
//! * [`config`]: the JSON configuration file and runtime settings.
//! * [`network`]: hardware address handling.
//! * [`error`]: error types shared across crates.

pub mod config;
pub mod device;
pub mod error;
pub mod network;
