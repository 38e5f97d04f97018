use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A string that does not describe a 6-octet hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hardware address: {0:?}")]
pub struct MacParseError(pub String);

#[derive(Debug, Error)]
pub enum TransmitError {
    /// Rejected locally; nothing was sent.
    #[error("invalid hardware address: {0:?}")]
    InvalidAddress(String),
    #[error("failed to open broadcast socket: {0}")]
    Socket(#[source] io::Error),
    #[error("failed to send magic packet: {0}")]
    Send(#[source] io::Error),
}

impl From<MacParseError> for TransmitError {
    fn from(err: MacParseError) -> Self {
        Self::InvalidAddress(err.0)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("device {name:?}: {source}")]
    InvalidDevice {
        name: String,
        #[source]
        source: MacParseError,
    },
}
