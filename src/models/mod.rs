pub mod posture;
pub mod reading;
pub mod record;

pub use posture::{Assessment, PostureLabel};
pub use reading::{Baseline, DevicePayload, DeviceSample, Reading};
pub use record::{LabelRecord, LogRecord};
