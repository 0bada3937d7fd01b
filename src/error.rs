//! Error types for pingscan.
//!
//! Uses `thiserror` for ergonomic error definitions. Per-host probe failures
//! are values carried in outcomes, never errors that abort a sweep.

use crate::types::AddressError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning CIDRs or interfaces into a host list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostListError {
    #[error("Invalid CIDR provided: {raw}")]
    InvalidCidr { raw: String },

    #[error("{raw} expands to {count} hosts (max: {max})")]
    TooManyHosts { raw: String, count: usize, max: usize },

    #[error(transparent)]
    Range(#[from] AddressError),
}

/// Why a single probe failed for a reason other than a timeout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("failed to send echo request: {0}")]
    Send(String),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidFormat(e.to_string())
    }
}

/// Errors surfaced by the command layer before or while starting a sweep.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    HostList(#[from] HostListError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open ICMP socket: {0}")]
    Socket(#[from] std::io::Error),
}

/// Result type alias for host-list construction.
pub type HostListResult<T> = Result<T, HostListError>;

/// Result type alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for command execution.
pub type CliResult<T> = Result<T, CliError>;
