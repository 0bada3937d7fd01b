//! Per-address ownership for a sweep.
//!
//! A host list may name the same address more than once. Each occurrence
//! claims the address when it is admitted and waits for the previous
//! claimant to finish before probing, so at most one task owns an address
//! at any moment. Claim order is fixed at admission, which keeps repeated
//! occurrences in list order.

use crate::types::Address;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type Owners = HashMap<Address, (usize, oneshot::Receiver<()>)>;

/// Tracks which task currently owns each address.
///
/// Only addresses with a live claim have an entry.
#[derive(Debug, Default)]
pub struct HostClaims {
    owners: Mutex<Owners>,
    next_ticket: AtomicUsize,
}

/// One task's hold on an address.
#[derive(Debug)]
pub struct Claim {
    host: Address,
    ticket: usize,
    previous: Option<oneshot::Receiver<()>>,
    done: oneshot::Sender<()>,
}

impl Claim {
    /// The claimed address.
    pub fn host(&self) -> Address {
        self.host
    }

    /// Wait until the previous owner of the address, if any, has finished.
    pub async fn ready(&mut self) {
        if let Some(previous) = self.previous.as_mut() {
            // A dropped sender also means the previous owner is gone.
            let _ = previous.await;
            self.previous = None;
        }
    }
}

impl HostClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue behind whatever task last claimed `host`.
    ///
    /// Must be called in admission order; it never blocks.
    pub fn claim(&self, host: Address) -> Claim {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (done, receiver) = oneshot::channel();
        let previous = self
            .lock()
            .insert(host, (ticket, receiver))
            .map(|(_, receiver)| receiver);

        Claim {
            host,
            ticket,
            previous,
            done,
        }
    }

    /// Give up `claim`, letting the next claimant of its address proceed.
    pub fn release(&self, claim: Claim) {
        let mut owners = self.lock();
        if owners
            .get(&claim.host)
            .is_some_and(|(ticket, _)| *ticket == claim.ticket)
        {
            owners.remove(&claim.host);
        }
        drop(owners);
        let _ = claim.done.send(());
    }

    fn lock(&self) -> MutexGuard<'_, Owners> {
        self.owners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
