//! Execution grant bookkeeping
//!
//! A grant is the OS permission to keep running while the batch is in
//! progress. The coordinator owns at most one at a time.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one acquired grant, unique per coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrantId(u64);

impl GrantId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grant-{}", self.0)
    }
}

/// Monotonic `GrantId` source
#[derive(Debug)]
pub(crate) struct GrantIdAllocator {
    next: AtomicU64,
}

impl GrantIdAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn allocate(&self) -> GrantId {
        GrantId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// What the platform handed back when the grant was acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantToken {
    /// Foreground service asserted with this notification posted
    Foreground { notification_id: u32 },
    /// Background task identifier issued by the OS
    BackgroundTask { task_id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionGrant {
    pub id: GrantId,
    pub token: GrantToken,
}

/// Grant ownership state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrantState {
    #[default]
    Absent,
    Active(ExecutionGrant),
}

impl GrantState {
    pub fn is_active(&self) -> bool {
        matches!(self, GrantState::Active(_))
    }

    pub fn grant(&self) -> Option<&ExecutionGrant> {
        match self {
            GrantState::Active(grant) => Some(grant),
            GrantState::Absent => None,
        }
    }
}

impl std::fmt::Display for GrantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantState::Absent => write!(f, "Absent"),
            GrantState::Active(grant) => write!(f, "Active({})", grant.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_monotonic() {
        let allocator = GrantIdAllocator::new();
        let first = allocator.allocate();
        let second = allocator.allocate();
        assert!(second > first);
        assert_eq!(first.as_u64(), 1);
    }

    #[test]
    fn test_state_accessors() {
        let state = GrantState::default();
        assert!(!state.is_active());
        assert!(state.grant().is_none());

        let grant = ExecutionGrant {
            id: GrantId::from_raw(3),
            token: GrantToken::BackgroundTask { task_id: 9 },
        };
        let state = GrantState::Active(grant);
        assert!(state.is_active());
        assert_eq!(state.grant(), Some(&grant));
        assert_eq!(state.to_string(), "Active(grant-3)");
    }
}
