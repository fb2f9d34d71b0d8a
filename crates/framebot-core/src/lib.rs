pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{reached, Clock, ClockMode, ClockOverride, TIME_EPSILON};
pub use config::FramebotConfig;
pub use error::{FramebotError, Result};
pub use types::*;
