pub mod client;

pub use client::{DeviceClient, RawResponse};
