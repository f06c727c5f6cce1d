//! Method-call bridge between the application layer and the coordinator
//!
//! - `codec`: JSON call / reply envelopes
//! - `channel`: method name dispatch and argument decoding

pub mod channel;
pub mod codec;

pub use channel::{BatchMethod, BridgeError, MethodChannel, PlatformType};
pub use codec::{CodecError, MethodCall, MethodReply};
