pub mod controller;
pub mod forwarder;
pub mod loop_worker;
pub mod session;

pub use controller::RelayController;
pub use forwarder::BackendForwarder;
pub use loop_worker::{RelayEvent, RelayTargets, READ_FAILED_ALERT};
pub use session::{MonitorSession, SessionSnapshot};
