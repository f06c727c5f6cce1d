// ImageFlow: batch keep-alive core
//
// Keeps a long image batch alive while the app is backgrounded: one
// coordinator, two platform keep-alive adapters (Android foreground
// notification, iOS timed background task) and the method-call bridge the
// application layer talks to.

pub mod bridge;
pub mod coordinator;
pub mod grant;
pub mod host;
pub mod keepalive;
pub mod progress;
pub mod settings;

// Mobile bridge module
pub mod mobile_bridge;

pub use bridge::{BatchMethod, MethodCall, MethodChannel, MethodReply, PlatformType};
pub use coordinator::{CoordinatorStats, ExecutionCoordinator, LifecycleSnapshot, Revocation};
pub use grant::{ExecutionGrant, GrantId, GrantState, GrantToken};
pub use host::{
    BackgroundTaskHost, NotificationChannel, NotificationContent, NotificationHost,
    INVALID_TASK_ID,
};
pub use keepalive::{
    ExpirationToken, KeepAlive, KeepAliveError, NotificationKeepAlive, TimedGrantKeepAlive,
};
pub use progress::{OverflowPolicy, ProgressIndicator, ProgressState};
pub use settings::{BatchSettings, ChannelImportance, SettingsError};

// Mobile bridge exports for UniFFI
pub use mobile_bridge::*;

uniffi::setup_scaffolding!();

/// Initialize tracing (idempotent). Honors `RUST_LOG`, defaults to `info`.
#[uniffi::export]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Default settings, for platform code that only wants to tweak a field
#[uniffi::export]
pub fn default_batch_settings() -> BatchSettings {
    BatchSettings::default()
}

/// Status text for a progress pair: "Processing {completed} of {total}"
#[uniffi::export]
pub fn progress_status_text(total: u32, completed: u32) -> String {
    ProgressState::new(total, completed).status_text()
}
