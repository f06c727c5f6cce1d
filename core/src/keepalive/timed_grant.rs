//! Timed-grant keep-alive (iOS background task)
//!
//! Purely extends execution time, nothing is displayed. The OS may revoke
//! the grant at any moment through the expiration handler; the host forwards
//! that to the `ExpirationToken` registered with the task.

use super::{KeepAlive, KeepAliveError};
use crate::coordinator::Revocation;
use crate::grant::GrantToken;
use crate::host::{BackgroundTaskHost, INVALID_TASK_ID};
use crate::progress::ProgressState;
use crate::settings::BatchSettings;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handed to the host with every background task request. Fires at most once.
#[derive(uniffi::Object)]
pub struct ExpirationToken {
    revocation: Revocation,
    fired: AtomicBool,
}

impl ExpirationToken {
    pub(crate) fn new(revocation: Revocation) -> Self {
        Self {
            revocation,
            fired: AtomicBool::new(false),
        }
    }
}

#[uniffi::export]
impl ExpirationToken {
    /// Called from the OS expiration handler. Returns `true` if this call
    /// revoked the live grant.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            tracing::debug!("Expiration for {} already fired", self.revocation.grant_id());
            return false;
        }
        self.revocation.revoke()
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub fn grant_id(&self) -> u64 {
        self.revocation.grant_id().as_u64()
    }
}

pub struct TimedGrantKeepAlive {
    host: Arc<dyn BackgroundTaskHost>,
    task_name: String,
    last_progress: Mutex<Option<ProgressState>>,
}

impl TimedGrantKeepAlive {
    pub fn new(
        host: Arc<dyn BackgroundTaskHost>,
        settings: &BatchSettings,
    ) -> Result<Self, KeepAliveError> {
        settings.validate()?;

        Ok(Self {
            host,
            task_name: settings.background_task_name.clone(),
            last_progress: Mutex::new(None),
        })
    }

    /// Last progress reported while the grant was held (diagnostics only)
    pub fn last_progress(&self) -> Option<ProgressState> {
        *self.last_progress.lock()
    }
}

impl KeepAlive for TimedGrantKeepAlive {
    fn name(&self) -> &'static str {
        "timed_grant"
    }

    fn acquire(
        &self,
        progress: &ProgressState,
        revocation: Revocation,
    ) -> Result<GrantToken, KeepAliveError> {
        let token = Arc::new(ExpirationToken::new(revocation));
        let task_id = self
            .host
            .begin_background_task(self.task_name.clone(), token);

        if task_id == INVALID_TASK_ID {
            return Err(KeepAliveError::GrantUnavailable);
        }

        *self.last_progress.lock() = Some(*progress);
        Ok(GrantToken::BackgroundTask { task_id })
    }

    fn refresh(&self, progress: &ProgressState) -> Result<(), KeepAliveError> {
        *self.last_progress.lock() = Some(*progress);
        tracing::trace!("Background task progress {}", progress);
        Ok(())
    }

    fn release(&self, token: &GrantToken) -> Result<(), KeepAliveError> {
        match *token {
            GrantToken::BackgroundTask { task_id } => {
                self.host.end_background_task(task_id);
                *self.last_progress.lock() = None;
                Ok(())
            }
            GrantToken::Foreground { .. } => Err(KeepAliveError::HostRefused(
                "end_background_task for a foreground grant".to_string(),
            )),
        }
    }

    fn clear(&self) -> Result<(), KeepAliveError> {
        // Nothing is displayed without a task
        *self.last_progress.lock() = None;
        Ok(())
    }
}
