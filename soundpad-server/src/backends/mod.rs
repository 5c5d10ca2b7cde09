pub mod dummy;
pub mod jack;

use std::time::Duration;

/// How long to wait for the processor to silence its outputs.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(1);
