// Mobile bridge object for UniFFI bindings
//
// `BatchBackground` is what the Kotlin / Swift side instantiates once per
// process. It wires the platform host into a keep-alive adapter, the
// coordinator and the method channel, and exposes both the direct
// begin/update/end calls and the encoded method-channel entry point.

use crate::bridge::{MethodChannel, PlatformType};
use crate::coordinator::{CoordinatorStats, ExecutionCoordinator, LifecycleSnapshot};
use crate::host::{BackgroundTaskHost, NotificationHost};
use crate::keepalive::{KeepAliveError, NotificationKeepAlive, TimedGrantKeepAlive};
use crate::settings::BatchSettings;
use std::sync::Arc;

#[derive(uniffi::Object)]
pub struct BatchBackground {
    settings: BatchSettings,
    channel: MethodChannel,
}

impl BatchBackground {
    fn assemble(
        coordinator: ExecutionCoordinator,
        platform: PlatformType,
        settings: BatchSettings,
    ) -> Self {
        let channel = MethodChannel::new(settings.method_channel.clone(), platform, coordinator);
        tracing::info!(
            "Batch keep-alive ready on channel '{}' ({})",
            settings.method_channel,
            platform
        );
        Self { settings, channel }
    }

    pub fn coordinator(&self) -> &ExecutionCoordinator {
        self.channel.coordinator()
    }

    pub fn channel(&self) -> &MethodChannel {
        &self.channel
    }
}

#[uniffi::export]
impl BatchBackground {
    /// Android: foreground service with a progress notification
    #[uniffi::constructor]
    pub fn for_notifications(
        host: Arc<dyn NotificationHost>,
        settings: BatchSettings,
    ) -> Result<Arc<Self>, KeepAliveError> {
        crate::init_logging();

        let keep_alive = NotificationKeepAlive::new(host, settings.clone())?;
        let coordinator =
            ExecutionCoordinator::with_policy(Arc::new(keep_alive), settings.overflow_policy);

        Ok(Arc::new(Self::assemble(
            coordinator,
            PlatformType::Android,
            settings,
        )))
    }

    /// iOS: timed background task
    #[uniffi::constructor]
    pub fn for_background_tasks(
        host: Arc<dyn BackgroundTaskHost>,
        settings: BatchSettings,
    ) -> Result<Arc<Self>, KeepAliveError> {
        crate::init_logging();

        let keep_alive = TimedGrantKeepAlive::new(host, &settings)?;
        let coordinator =
            ExecutionCoordinator::with_policy(Arc::new(keep_alive), settings.overflow_policy);

        Ok(Arc::new(Self::assemble(
            coordinator,
            PlatformType::IOS,
            settings,
        )))
    }

    pub fn begin(&self, total: u32, completed: u32) {
        self.coordinator().begin(total, completed);
    }

    pub fn update(&self, total: u32, completed: u32) {
        self.coordinator().update(total, completed);
    }

    pub fn end(&self) {
        self.coordinator().end();
    }

    pub fn is_active(&self) -> bool {
        self.coordinator().is_active()
    }

    pub fn snapshot(&self) -> LifecycleSnapshot {
        self.coordinator().snapshot()
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.coordinator().stats()
    }

    pub fn platform(&self) -> PlatformType {
        self.channel.platform()
    }

    pub fn settings(&self) -> BatchSettings {
        self.settings.clone()
    }

    pub fn method_channel_name(&self) -> String {
        self.channel.name().to_string()
    }

    /// Handle one JSON-encoded method call and return the encoded reply.
    /// An empty reply means "not implemented".
    pub fn handle_method_call(&self, call: Vec<u8>) -> Vec<u8> {
        self.channel.handle_encoded(&call)
    }
}
