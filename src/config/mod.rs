//! Configuration management for pingscan.
//!
//! Settings come from an optional JSON file in the XDG config directory,
//! then environment variables and command-line flags on top.

mod settings;

pub use settings::{AppSettings, Overrides, Paths};
