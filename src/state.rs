//! Shared runtime state.
//!
//! The engine itself is stateless; the only cross-request state the service
//! holds is the per-organization mutation lock table. Admin-set mutations
//! serialize per organization so two read-modify-write cycles can never
//! silently overwrite each other; read-only authorization takes no locks.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-organization mutation locks, keyed by organization id.
#[derive(Clone, Default)]
pub struct OrgLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl OrgLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the mutation lock for one organization.
    ///
    /// The guard owns the lock; hold it across the whole
    /// read-validate-write cycle.
    pub async fn acquire(&self, organization_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let entry = self
                .locks
                .entry(organization_id)
                .or_insert_with(|| Arc::new(Mutex::new(())));
            entry.value().clone()
        };
        lock.lock_owned().await
    }
}
