// Recording hosts shared by the integration tests

#![allow(dead_code)]

use imageflow_core::{
    BackgroundTaskHost, ExpirationToken, NotificationChannel, NotificationContent,
    NotificationHost, INVALID_TASK_ID,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    ChannelCreated(NotificationChannel),
    Posted(u32, NotificationContent),
    Refreshed(u32, NotificationContent),
    Cleared(u32),
}

/// Notification host that records every call and always succeeds
#[derive(Default)]
pub struct RecordingNotificationHost {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotificationHost {
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().clone()
    }

    pub fn posted(&self) -> usize {
        self.count(|e| matches!(e, NotificationEvent::Posted(..)))
    }

    pub fn refreshed(&self) -> usize {
        self.count(|e| matches!(e, NotificationEvent::Refreshed(..)))
    }

    pub fn cleared(&self) -> usize {
        self.count(|e| matches!(e, NotificationEvent::Cleared(_)))
    }

    fn count(&self, pred: impl Fn(&NotificationEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(*e)).count()
    }
}

impl NotificationHost for RecordingNotificationHost {
    fn create_channel(&self, channel: NotificationChannel) -> bool {
        self.events
            .lock()
            .push(NotificationEvent::ChannelCreated(channel));
        true
    }

    fn start_foreground(&self, notification_id: u32, content: NotificationContent) -> bool {
        self.events
            .lock()
            .push(NotificationEvent::Posted(notification_id, content));
        true
    }

    fn notify(&self, notification_id: u32, content: NotificationContent) -> bool {
        self.events
            .lock()
            .push(NotificationEvent::Refreshed(notification_id, content));
        true
    }

    fn stop_foreground(&self, notification_id: u32) -> bool {
        self.events
            .lock()
            .push(NotificationEvent::Cleared(notification_id));
        true
    }
}

/// Background task host whose expiration is triggered by the test
#[derive(Default)]
pub struct ManualTaskHost {
    next_id: Mutex<u64>,
    refuse: Mutex<bool>,
    pending: Mutex<Vec<(u64, Arc<ExpirationToken>)>>,
    began: Mutex<Vec<u64>>,
    ended: Mutex<Vec<u64>>,
}

impl ManualTaskHost {
    pub fn refuse_grants(&self, refuse: bool) {
        *self.refuse.lock() = refuse;
    }

    pub fn began(&self) -> Vec<u64> {
        self.began.lock().clone()
    }

    pub fn ended(&self) -> Vec<u64> {
        self.ended.lock().clone()
    }

    /// Simulate the OS expiration handler for every outstanding task
    pub fn expire_all(&self) -> usize {
        // Fire outside the lock: firing ends the task through this host
        let pending: Vec<_> = self.pending.lock().drain(..).collect();
        pending.iter().filter(|(_, token)| token.fire()).count()
    }

    pub fn tokens(&self) -> Vec<Arc<ExpirationToken>> {
        self.pending
            .lock()
            .iter()
            .map(|(_, token)| token.clone())
            .collect()
    }
}

impl BackgroundTaskHost for ManualTaskHost {
    fn begin_background_task(&self, _name: String, expiration: Arc<ExpirationToken>) -> u64 {
        if *self.refuse.lock() {
            return INVALID_TASK_ID;
        }

        let mut next_id = self.next_id.lock();
        *next_id += 1;
        let id = *next_id;

        self.began.lock().push(id);
        self.pending.lock().push((id, expiration));
        id
    }

    fn end_background_task(&self, task_id: u64) {
        self.ended.lock().push(task_id);
    }
}
