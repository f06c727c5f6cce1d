// Host callback interfaces
//
// Implemented in Kotlin / Swift and handed to the core through UniFFI.
// Each method mirrors exactly one OS call so the native side stays a thin
// shim; all lifecycle decisions live in the coordinator.

use crate::keepalive::timed_grant::ExpirationToken;
use crate::progress::ProgressIndicator;
use crate::settings::ChannelImportance;
use std::sync::Arc;

/// Task id the host returns when the OS refused a background task
pub const INVALID_TASK_ID: u64 = 0;

/// Notification channel registration
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: ChannelImportance,
}

/// Full render of the status notification
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NotificationContent {
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub progress: ProgressIndicator,
    /// Not swipe-dismissible
    pub ongoing: bool,
    /// No sound / vibration on refresh
    pub only_alert_once: bool,
}

/// Android side: foreground service + persistent notification.
///
/// Every method returns `false` when the OS call failed or threw.
#[uniffi::export(with_foreign)]
pub trait NotificationHost: Send + Sync {
    /// Register the notification channel. Safe to call more than once.
    fn create_channel(&self, channel: NotificationChannel) -> bool;

    /// Post the notification and enter the foreground state
    fn start_foreground(&self, notification_id: u32, content: NotificationContent) -> bool;

    /// Replace the content of an already posted notification
    fn notify(&self, notification_id: u32, content: NotificationContent) -> bool;

    /// Leave the foreground state, remove the notification and stop the service
    fn stop_foreground(&self, notification_id: u32) -> bool;
}

/// iOS side: `UIApplication.beginBackgroundTask` / `endBackgroundTask`.
#[uniffi::export(with_foreign)]
pub trait BackgroundTaskHost: Send + Sync {
    /// Request a background task. The host must call `expiration.fire()` from
    /// the OS expiration handler, and must not call it before returning.
    ///
    /// Returns `INVALID_TASK_ID` when the OS refused.
    fn begin_background_task(&self, name: String, expiration: Arc<ExpirationToken>) -> u64;

    fn end_background_task(&self, task_id: u64);
}
