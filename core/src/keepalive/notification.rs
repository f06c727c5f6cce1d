//! Persistent-notification keep-alive (Android foreground service)
//!
//! One notification, one fixed id. The first acquire registers the channel
//! and posts the notification through `start_foreground`; refreshes replace
//! it in place with `notify`; release leaves the foreground state.

use super::{KeepAlive, KeepAliveError};
use crate::coordinator::Revocation;
use crate::grant::GrantToken;
use crate::host::{NotificationChannel, NotificationContent, NotificationHost};
use crate::progress::ProgressState;
use crate::settings::BatchSettings;
use parking_lot::Mutex;
use std::sync::Arc;

pub struct NotificationKeepAlive {
    host: Arc<dyn NotificationHost>,
    settings: BatchSettings,
    channel_registered: Mutex<bool>,
}

impl NotificationKeepAlive {
    pub fn new(
        host: Arc<dyn NotificationHost>,
        settings: BatchSettings,
    ) -> Result<Self, KeepAliveError> {
        settings.validate()?;

        Ok(Self {
            host,
            settings,
            channel_registered: Mutex::new(false),
        })
    }

    pub fn channel(&self) -> NotificationChannel {
        NotificationChannel {
            id: self.settings.notification_channel_id.clone(),
            name: self.settings.notification_channel_name.clone(),
            importance: self.settings.channel_importance,
        }
    }

    /// Build the notification for `progress`
    pub fn render(&self, progress: &ProgressState) -> NotificationContent {
        NotificationContent {
            channel_id: self.settings.notification_channel_id.clone(),
            title: self.settings.product_name.clone(),
            body: progress.status_text(),
            progress: progress.indicator(),
            ongoing: true,
            only_alert_once: true,
        }
    }

    pub fn notification_id(&self) -> u32 {
        self.settings.notification_id
    }

    /// Register the channel once; a refused registration is retried on the
    /// next acquire.
    fn ensure_channel(&self) -> Result<(), KeepAliveError> {
        let mut registered = self.channel_registered.lock();
        if *registered {
            return Ok(());
        }

        if !self.host.create_channel(self.channel()) {
            return Err(KeepAliveError::HostRefused("create_channel".to_string()));
        }

        *registered = true;
        tracing::debug!(
            "Notification channel {} registered",
            self.settings.notification_channel_id
        );
        Ok(())
    }
}

impl KeepAlive for NotificationKeepAlive {
    fn name(&self) -> &'static str {
        "notification"
    }

    fn acquire(
        &self,
        progress: &ProgressState,
        _revocation: Revocation,
    ) -> Result<GrantToken, KeepAliveError> {
        self.ensure_channel()?;

        let id = self.notification_id();
        if !self.host.start_foreground(id, self.render(progress)) {
            return Err(KeepAliveError::HostRefused("start_foreground".to_string()));
        }

        Ok(GrantToken::Foreground {
            notification_id: id,
        })
    }

    fn refresh(&self, progress: &ProgressState) -> Result<(), KeepAliveError> {
        // A refresh can arrive before any acquire
        self.ensure_channel()?;

        if !self.host.notify(self.notification_id(), self.render(progress)) {
            return Err(KeepAliveError::HostRefused("notify".to_string()));
        }
        Ok(())
    }

    fn release(&self, token: &GrantToken) -> Result<(), KeepAliveError> {
        let id = match *token {
            GrantToken::Foreground { notification_id } => notification_id,
            GrantToken::BackgroundTask { .. } => self.notification_id(),
        };

        if !self.host.stop_foreground(id) {
            return Err(KeepAliveError::HostRefused("stop_foreground".to_string()));
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), KeepAliveError> {
        if !self.host.stop_foreground(self.notification_id()) {
            return Err(KeepAliveError::HostRefused("stop_foreground".to_string()));
        }
        Ok(())
    }
}
