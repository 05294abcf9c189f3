pub mod codec;
pub mod subscription;

#[cfg(feature = "ble")]
pub mod adapter;

#[cfg(feature = "ble")]
pub use adapter::BleLink;
pub use codec::{decode_payload, Channel, DecodeError};
pub use subscription::{FieldUpdate, Notification, ReadingAssembler, Subscription};
