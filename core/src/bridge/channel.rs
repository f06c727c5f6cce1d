//! Method channel dispatch
//!
//! Maps the application layer's method names onto the coordinator. Each
//! platform answers only its own method set; everything else is
//! "not implemented", exactly as the native channel handlers do.

use super::codec::{self, MethodCall, MethodReply};
use crate::coordinator::ExecutionCoordinator;
use serde_json::Value;
use thiserror::Error;

pub const ARG_TOTAL: &str = "total";
pub const ARG_COMPLETED: &str = "completed";

/// Which native handler the channel stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum PlatformType {
    /// Foreground service methods, acknowledged with `null`
    Android,
    /// Background task methods, acknowledged with `true`
    IOS,
}

impl std::fmt::Display for PlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformType::Android => write!(f, "Android"),
            PlatformType::IOS => write!(f, "iOS"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMethod {
    StartForeground,
    UpdateForeground,
    StopForeground,
    BeginBackgroundTask,
    EndBackgroundTask,
}

impl BatchMethod {
    pub const ALL: [BatchMethod; 5] = [
        BatchMethod::StartForeground,
        BatchMethod::UpdateForeground,
        BatchMethod::StopForeground,
        BatchMethod::BeginBackgroundTask,
        BatchMethod::EndBackgroundTask,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BatchMethod::StartForeground => "startForeground",
            BatchMethod::UpdateForeground => "updateForeground",
            BatchMethod::StopForeground => "stopForeground",
            BatchMethod::BeginBackgroundTask => "beginBackgroundTask",
            BatchMethod::EndBackgroundTask => "endBackgroundTask",
        }
    }

    pub fn platform(&self) -> PlatformType {
        match self {
            BatchMethod::StartForeground
            | BatchMethod::UpdateForeground
            | BatchMethod::StopForeground => PlatformType::Android,
            BatchMethod::BeginBackgroundTask | BatchMethod::EndBackgroundTask => {
                PlatformType::IOS
            }
        }
    }

    fn acknowledgement(&self) -> Value {
        match self.platform() {
            PlatformType::Android => Value::Null,
            PlatformType::IOS => Value::Bool(true),
        }
    }
}

impl std::fmt::Display for BatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
}

impl BridgeError {
    /// Error code placed in the reply envelope
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::InvalidArgument { .. } => "INVALID_ARGUMENT",
        }
    }
}

/// Read an integer argument.
///
/// Missing or null reads as 0, negatives clamp to 0 and values past `u32::MAX`
/// saturate. Non-integers are rejected. Arguments that are not a map read as
/// empty.
pub fn int_argument(args: &Value, name: &str) -> Result<u32, BridgeError> {
    let value = match args {
        Value::Object(map) => map.get(name),
        _ => None,
    };

    let invalid = |reason: String| BridgeError::InvalidArgument {
        name: name.to_string(),
        reason,
    };

    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(i.clamp(0, u32::MAX as i64) as u32)
            } else if n.as_u64().is_some() {
                Ok(u32::MAX)
            } else {
                Err(invalid(format!("expected an integer, got {}", n)))
            }
        }
        Some(other) => Err(invalid(format!("expected an integer, got {}", other))),
    }
}

fn progress_arguments(args: &Value) -> Result<(u32, u32), BridgeError> {
    Ok((
        int_argument(args, ARG_TOTAL)?,
        int_argument(args, ARG_COMPLETED)?,
    ))
}

/// Named method channel bound to one coordinator
pub struct MethodChannel {
    name: String,
    platform: PlatformType,
    coordinator: ExecutionCoordinator,
}

impl MethodChannel {
    pub fn new(
        name: impl Into<String>,
        platform: PlatformType,
        coordinator: ExecutionCoordinator,
    ) -> Self {
        Self {
            name: name.into(),
            platform,
            coordinator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn platform(&self) -> PlatformType {
        self.platform
    }

    pub fn coordinator(&self) -> &ExecutionCoordinator {
        &self.coordinator
    }

    /// Handle one decoded call
    pub fn handle(&self, call: &MethodCall) -> MethodReply {
        let method = match BatchMethod::from_name(&call.method) {
            Some(method) if method.platform() == self.platform => method,
            _ => {
                tracing::debug!(
                    "{}: method '{}' not implemented on {}",
                    self.name,
                    call.method,
                    self.platform
                );
                return MethodReply::NotImplemented;
            }
        };

        match self.dispatch(method, &call.args) {
            Ok(result) => MethodReply::Success(result),
            Err(e) => {
                tracing::warn!("{}: {} rejected: {}", self.name, method, e);
                MethodReply::error(e.code(), e.to_string())
            }
        }
    }

    /// Decode, handle and encode one call
    pub fn handle_encoded(&self, bytes: &[u8]) -> Vec<u8> {
        let reply = match codec::decode_method_call(bytes) {
            Ok(call) => self.handle(&call),
            Err(e) => {
                tracing::warn!("{}: undecodable call: {}", self.name, e);
                MethodReply::error("MALFORMED_CALL", e.to_string())
            }
        };

        codec::encode_reply(&reply).unwrap_or_else(|e| {
            tracing::error!("{}: reply encoding failed: {}", self.name, e);
            Vec::new()
        })
    }

    fn dispatch(&self, method: BatchMethod, args: &Value) -> Result<Value, BridgeError> {
        match method {
            BatchMethod::StartForeground | BatchMethod::BeginBackgroundTask => {
                let (total, completed) = progress_arguments(args)?;
                self.coordinator.begin(total, completed);
            }
            BatchMethod::UpdateForeground => {
                let (total, completed) = progress_arguments(args)?;
                self.coordinator.update(total, completed);
            }
            BatchMethod::StopForeground | BatchMethod::EndBackgroundTask => {
                self.coordinator.end();
            }
        }

        Ok(method.acknowledgement())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Revocation;
    use crate::grant::GrantToken;
    use crate::keepalive::{KeepAlive, KeepAliveError};
    use crate::progress::ProgressState;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingKeepAlive {
        acquired: Mutex<Vec<ProgressState>>,
        refreshed: Mutex<Vec<ProgressState>>,
        released: Mutex<u32>,
    }

    impl KeepAlive for CountingKeepAlive {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn acquire(
            &self,
            progress: &ProgressState,
            _revocation: Revocation,
        ) -> Result<GrantToken, KeepAliveError> {
            self.acquired.lock().push(*progress);
            Ok(GrantToken::Foreground { notification_id: 1 })
        }

        fn refresh(&self, progress: &ProgressState) -> Result<(), KeepAliveError> {
            self.refreshed.lock().push(*progress);
            Ok(())
        }

        fn release(&self, _token: &GrantToken) -> Result<(), KeepAliveError> {
            *self.released.lock() += 1;
            Ok(())
        }

        fn clear(&self) -> Result<(), KeepAliveError> {
            Ok(())
        }
    }

    fn channel(platform: PlatformType) -> (MethodChannel, Arc<CountingKeepAlive>) {
        let keep_alive = Arc::new(CountingKeepAlive::default());
        let coordinator = ExecutionCoordinator::new(keep_alive.clone());
        (
            MethodChannel::new("batch_background", platform, coordinator),
            keep_alive,
        )
    }

    #[test]
    fn test_method_names() {
        for method in BatchMethod::ALL {
            assert_eq!(BatchMethod::from_name(method.name()), Some(method));
        }
        assert_eq!(BatchMethod::from_name("startforeground"), None);
    }

    #[test]
    fn test_int_argument_decoding() {
        let args = json!({
            "total": 10,
            "negative": -4,
            "huge": 10_000_000_000u64,
            "float": 2.5,
            "text": "7",
            "null": null,
        });

        assert_eq!(int_argument(&args, "total"), Ok(10));
        assert_eq!(int_argument(&args, "missing"), Ok(0));
        assert_eq!(int_argument(&args, "null"), Ok(0));
        assert_eq!(int_argument(&args, "negative"), Ok(0));
        assert_eq!(int_argument(&args, "huge"), Ok(u32::MAX));
        assert!(int_argument(&args, "float").is_err());
        assert!(int_argument(&args, "text").is_err());

        assert_eq!(int_argument(&Value::Null, "total"), Ok(0));
        assert_eq!(int_argument(&json!([1, 2]), "total"), Ok(0));
    }

    #[test]
    fn test_android_lifecycle_over_channel() {
        let (channel, keep_alive) = channel(PlatformType::Android);

        let reply = channel.handle(&MethodCall::new(
            "startForeground",
            json!({"total": 10, "completed": 0}),
        ));
        assert_eq!(reply, MethodReply::Success(Value::Null));

        channel.handle(&MethodCall::new(
            "updateForeground",
            json!({"total": 10, "completed": 4}),
        ));
        let reply = channel.handle(&MethodCall::bare("stopForeground"));
        assert_eq!(reply, MethodReply::Success(Value::Null));

        assert_eq!(*keep_alive.acquired.lock(), vec![ProgressState::new(10, 0)]);
        assert_eq!(*keep_alive.refreshed.lock(), vec![ProgressState::new(10, 4)]);
        assert_eq!(*keep_alive.released.lock(), 1);
    }

    #[test]
    fn test_ios_acknowledges_with_true() {
        let (channel, keep_alive) = channel(PlatformType::IOS);

        let reply = channel.handle(&MethodCall::bare("beginBackgroundTask"));
        assert_eq!(reply, MethodReply::Success(Value::Bool(true)));
        assert_eq!(*keep_alive.acquired.lock(), vec![ProgressState::new(0, 0)]);

        let reply = channel.handle(&MethodCall::bare("endBackgroundTask"));
        assert_eq!(reply, MethodReply::Success(Value::Bool(true)));

        // Ending again still reports success
        let reply = channel.handle(&MethodCall::bare("endBackgroundTask"));
        assert_eq!(reply, MethodReply::Success(Value::Bool(true)));
        assert_eq!(*keep_alive.released.lock(), 1);
    }

    #[test]
    fn test_unknown_and_foreign_methods_not_implemented() {
        let (android, _) = channel(PlatformType::Android);
        assert_eq!(
            android.handle(&MethodCall::bare("processImages")),
            MethodReply::NotImplemented
        );
        assert_eq!(
            android.handle(&MethodCall::bare("beginBackgroundTask")),
            MethodReply::NotImplemented
        );

        let (ios, keep_alive) = channel(PlatformType::IOS);
        assert_eq!(
            ios.handle(&MethodCall::bare("updateForeground")),
            MethodReply::NotImplemented
        );
        assert!(keep_alive.refreshed.lock().is_empty());
    }

    #[test]
    fn test_invalid_argument_reply() {
        let (channel, keep_alive) = channel(PlatformType::Android);

        let reply = channel.handle(&MethodCall::new(
            "startForeground",
            json!({"total": "ten"}),
        ));
        match reply {
            MethodReply::Error { code, .. } => assert_eq!(code, "INVALID_ARGUMENT"),
            other => panic!("unexpected reply {:?}", other),
        }
        assert!(keep_alive.acquired.lock().is_empty());
    }

    #[test]
    fn test_handle_encoded() {
        let (channel, _) = channel(PlatformType::Android);

        let reply = channel.handle_encoded(
            br#"{"method": "startForeground", "args": {"total": 2, "completed": 1}}"#,
        );
        assert_eq!(reply, b"[null]".to_vec());

        let reply = channel.handle_encoded(br#"{"method": "nope"}"#);
        assert!(reply.is_empty());

        let reply = channel.handle_encoded(b"garbage");
        let decoded = codec::decode_reply(&reply).unwrap();
        assert!(matches!(
            decoded,
            MethodReply::Error { ref code, .. } if code == "MALFORMED_CALL"
        ));
    }
}
