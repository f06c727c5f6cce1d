//! Execution-extension coordinator
//!
//! Owns the single process-wide grant and serializes the
//! begin / update / end lifecycle over a `KeepAlive` adapter:
//!
//! ```text
//! Absent --begin--> Active --update--> Active --end--> Absent
//!                   Active --revoke--> Absent
//! ```
//!
//! `begin` while Active and `end` / `revoke` while Absent are no-ops for
//! grant ownership. Adapter failures never reach the caller; they are
//! logged and leave the state untouched.

use crate::grant::{ExecutionGrant, GrantId, GrantIdAllocator, GrantState};
use crate::keepalive::KeepAlive;
use crate::progress::{OverflowPolicy, ProgressState};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Lifecycle counters
#[derive(Debug, Clone, Default, PartialEq, Eq, uniffi::Record)]
pub struct CoordinatorStats {
    pub grants_acquired: u64,
    pub grants_released: u64,
    pub grants_revoked: u64,
    pub refreshes: u64,
    pub acquire_failures: u64,
}

impl CoordinatorStats {
    /// Grants acquired and not yet released or revoked
    pub fn outstanding(&self) -> u64 {
        self.grants_acquired
            .saturating_sub(self.grants_released + self.grants_revoked)
    }
}

/// Point-in-time view of the lifecycle
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct LifecycleSnapshot {
    pub active: bool,
    pub grant_id: Option<u64>,
    /// Last progress surfaced to the keep-alive adapter
    pub progress: Option<ProgressState>,
}

#[derive(Debug, Default)]
struct Lifecycle {
    grant: GrantState,
    surfaced: Option<ProgressState>,
}

struct CoordinatorInner {
    keep_alive: Arc<dyn KeepAlive>,
    policy: OverflowPolicy,
    ids: GrantIdAllocator,
    lifecycle: Mutex<Lifecycle>,
    stats: Mutex<CoordinatorStats>,
}

impl CoordinatorInner {
    fn revoke(&self, grant_id: GrantId) -> bool {
        let mut lifecycle = self.lifecycle.lock();

        let grant = match lifecycle.grant {
            GrantState::Active(grant) if grant.id == grant_id => grant,
            _ => {
                tracing::debug!("Ignoring revocation of stale {}", grant_id);
                return false;
            }
        };

        // The OS still expects the task to be ended from its expiration handler
        if let Err(e) = self.keep_alive.release(&grant.token) {
            tracing::warn!("Release of revoked {} failed: {}", grant_id, e);
        }

        *lifecycle = Lifecycle::default();
        self.stats.lock().grants_revoked += 1;

        tracing::warn!(
            "{} revoked by the OS ({} keep-alive)",
            grant_id,
            self.keep_alive.name()
        );
        true
    }
}

/// Capability to revoke one specific grant, handed to the keep-alive adapter.
///
/// Holds only a weak reference, so an outstanding OS callback never keeps
/// the coordinator alive.
#[derive(Clone)]
pub struct Revocation {
    inner: Weak<CoordinatorInner>,
    grant_id: GrantId,
}

impl Revocation {
    pub fn grant_id(&self) -> GrantId {
        self.grant_id
    }

    /// Revoke the grant. `false` if it was already released, revoked or
    /// replaced, or the coordinator is gone.
    pub fn revoke(&self) -> bool {
        match self.inner.upgrade() {
            Some(inner) => inner.revoke(self.grant_id),
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(grant_id: GrantId) -> Self {
        Self {
            inner: Weak::new(),
            grant_id,
        }
    }
}

impl std::fmt::Debug for Revocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Revocation")
            .field("grant_id", &self.grant_id)
            .finish()
    }
}

/// Begin / update / end lifecycle over one keep-alive adapter
#[derive(Clone)]
pub struct ExecutionCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl ExecutionCoordinator {
    pub fn new(keep_alive: Arc<dyn KeepAlive>) -> Self {
        Self::with_policy(keep_alive, OverflowPolicy::default())
    }

    pub fn with_policy(keep_alive: Arc<dyn KeepAlive>, policy: OverflowPolicy) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                keep_alive,
                policy,
                ids: GrantIdAllocator::new(),
                lifecycle: Mutex::new(Lifecycle::default()),
                stats: Mutex::new(CoordinatorStats::default()),
            }),
        }
    }

    /// Acquire the grant if none is held and surface `progress`.
    ///
    /// While a grant is held this behaves like `update`.
    pub fn begin(&self, total: u32, completed: u32) {
        let progress = ProgressState::new(total, completed).normalized(self.inner.policy);
        let mut lifecycle = self.inner.lifecycle.lock();

        if lifecycle.grant.is_active() {
            tracing::debug!("begin while active, refreshing to {}", progress);
            self.refresh_locked(&mut lifecycle, progress);
            return;
        }

        let grant_id = self.inner.ids.allocate();
        let revocation = Revocation {
            inner: Arc::downgrade(&self.inner),
            grant_id,
        };

        match self.inner.keep_alive.acquire(&progress, revocation) {
            Ok(token) => {
                lifecycle.grant = GrantState::Active(ExecutionGrant {
                    id: grant_id,
                    token,
                });
                lifecycle.surfaced = Some(progress);
                self.inner.stats.lock().grants_acquired += 1;
                tracing::info!(
                    "{} acquired ({} keep-alive), progress {}",
                    grant_id,
                    self.inner.keep_alive.name(),
                    progress
                );
            }
            Err(e) => {
                self.inner.stats.lock().acquire_failures += 1;
                tracing::warn!("Execution grant not acquired: {}", e);
            }
        }
    }

    /// Refresh the surfaced progress. Never acquires a grant.
    ///
    /// Without a grant the refresh is still forwarded to the adapter; a
    /// later `end` clears whatever it surfaced.
    pub fn update(&self, total: u32, completed: u32) {
        let progress = ProgressState::new(total, completed).normalized(self.inner.policy);
        let mut lifecycle = self.inner.lifecycle.lock();

        if !lifecycle.grant.is_active() {
            tracing::debug!("update without an active grant, progress {}", progress);
        }
        self.refresh_locked(&mut lifecycle, progress);
    }

    /// Release the grant if held and tear down the surface
    pub fn end(&self) {
        let mut lifecycle = self.inner.lifecycle.lock();

        let grant = match lifecycle.grant {
            GrantState::Active(grant) => grant,
            GrantState::Absent => {
                if lifecycle.surfaced.is_some() {
                    match self.inner.keep_alive.clear() {
                        Ok(()) => lifecycle.surfaced = None,
                        Err(e) => tracing::warn!("Clearing ungranted surface failed: {}", e),
                    }
                }
                tracing::debug!("end without an active grant");
                return;
            }
        };

        if let Err(e) = self.inner.keep_alive.release(&grant.token) {
            tracing::warn!("Release of {} failed: {}", grant.id, e);
        }

        *lifecycle = Lifecycle::default();
        self.inner.stats.lock().grants_released += 1;
        tracing::info!("{} released", grant.id);
    }

    /// OS-driven revocation of `grant_id`; stale ids are ignored
    pub fn revoke(&self, grant_id: GrantId) -> bool {
        self.inner.revoke(grant_id)
    }

    pub fn is_active(&self) -> bool {
        self.inner.lifecycle.lock().grant.is_active()
    }

    pub fn active_grant(&self) -> Option<ExecutionGrant> {
        self.inner.lifecycle.lock().grant.grant().copied()
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        let lifecycle = self.inner.lifecycle.lock();
        LifecycleSnapshot {
            active: lifecycle.grant.is_active(),
            grant_id: lifecycle.grant.grant().map(|g| g.id.as_u64()),
            progress: lifecycle.surfaced,
        }
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.inner.stats.lock().clone()
    }

    fn refresh_locked(&self, lifecycle: &mut Lifecycle, progress: ProgressState) {
        if lifecycle.surfaced == Some(progress) {
            return;
        }

        match self.inner.keep_alive.refresh(&progress) {
            Ok(()) => {
                lifecycle.surfaced = Some(progress);
                self.inner.stats.lock().refreshes += 1;
            }
            Err(e) => tracing::warn!("Progress refresh failed: {}", e),
        }
    }
}
