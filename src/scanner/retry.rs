//! Per-sweep escalation tracking.

use crate::types::Address;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Whether a host has used up its one longer-timeout retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Escalation {
    #[default]
    NotEscalated,
    Escalated,
}

/// Escalation state for every host touched by one sweep.
///
/// Only the task that currently owns a host writes its entry; the mutex
/// just makes the map itself safe to share between those tasks.
#[derive(Debug, Default)]
pub struct RetryState {
    hosts: Mutex<HashMap<Address, Escalation>>,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `host`.
    pub fn get(&self, host: Address) -> Escalation {
        self.lock().get(&host).copied().unwrap_or_default()
    }

    /// Mark `host` escalated. Returns `false` if it already was.
    pub fn escalate(&self, host: Address) -> bool {
        let mut hosts = self.lock();
        let state = hosts.entry(host).or_default();
        if *state == Escalation::Escalated {
            return false;
        }
        *state = Escalation::Escalated;
        true
    }

    /// Number of hosts escalated so far.
    pub fn escalated_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|s| **s == Escalation::Escalated)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Address, Escalation>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
