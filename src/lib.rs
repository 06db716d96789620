#![no_std]
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

mod diagnostics;
mod driver;
mod error;
mod frame;
mod sensor;
mod timing;
mod tracker;
mod utils;

pub use diagnostics::Diagnostics;
pub use driver::{As5045, Config};
pub use error::Error;
pub use frame::{COUNTS_PER_REVOLUTION, FRAME_BITS, Frame, extract_position};
pub use sensor::RotarySensor;
pub use timing::{
    Clock, DEFAULT_CLOCK_HALF_PERIOD_NS, SpinDelay, VELOCITY_FALLBACK_INTERVAL_S,
    VELOCITY_MAX_INTERVAL_US,
};
pub use tracker::{AngleTracker, Direction};
pub use utils::verify_parity;
