//! Keep-alive adapters
//!
//! A keep-alive adapter turns the coordinator's acquire / refresh / release
//! requests into calls on one platform host:
//! - `notification`: Android foreground service with a progress notification
//! - `timed_grant`: iOS background task with an expiration handler

pub mod notification;
pub mod timed_grant;

pub use notification::NotificationKeepAlive;
pub use timed_grant::{ExpirationToken, TimedGrantKeepAlive};

use crate::coordinator::Revocation;
use crate::grant::GrantToken;
use crate::progress::ProgressState;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq, uniffi::Error)]
#[uniffi(flat_error)]
pub enum KeepAliveError {
    #[error("Host refused {0}")]
    HostRefused(String),
    #[error("Execution grant unavailable")]
    GrantUnavailable,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<crate::settings::SettingsError> for KeepAliveError {
    fn from(err: crate::settings::SettingsError) -> Self {
        KeepAliveError::InvalidConfig(err.to_string())
    }
}

/// Platform capability driven by the coordinator
pub trait KeepAlive: Send + Sync {
    /// Short adapter name for logs
    fn name(&self) -> &'static str;

    /// Obtain an execution grant and show the initial progress.
    ///
    /// `revocation` lets the adapter hand the OS a way to revoke the grant
    /// later; adapters whose grants never expire may drop it.
    fn acquire(
        &self,
        progress: &ProgressState,
        revocation: Revocation,
    ) -> Result<GrantToken, KeepAliveError>;

    /// Refresh the surfaced progress in place
    fn refresh(&self, progress: &ProgressState) -> Result<(), KeepAliveError>;

    /// Give the grant back and tear down the surface
    fn release(&self, token: &GrantToken) -> Result<(), KeepAliveError>;

    /// Tear down a surface that was refreshed while no grant was held
    fn clear(&self) -> Result<(), KeepAliveError>;
}
