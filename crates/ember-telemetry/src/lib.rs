mod logging;
pub mod mock;
mod usage;

pub use logging::init_logging;
pub use usage::{
    DauStat, HttpPingSender, PingCadence, PingError, PingSender, UsagePing, UsageTracker,
    DAU_STAT_KEY,
};
