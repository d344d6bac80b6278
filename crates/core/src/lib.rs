pub mod error;
pub mod event;
pub mod listener;
pub mod state;

pub use error::{CliResult, KeeperError, Result};
pub use event::{BatteryEvent, EventKind};
pub use listener::{CallbackResult, Listeners};
pub use state::{
    validate_threshold, BatteryInfo, BatteryStatus, PowerState, THRESHOLD_MAX, THRESHOLD_MIN,
};
