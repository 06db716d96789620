//! Bus timing and time sources

use embedded_hal::delay::DelayNs;

/// Default dwell between two clock edges (500 kHz SSI clock)
///
/// The datasheet asks for at least 500 ns per clock half-period and between
/// chip-select falling and the first clock edge.
pub const DEFAULT_CLOCK_HALF_PERIOD_NS: u32 = 1_000;

/// Settle time after parking the bus during [`crate::As5045::init`]
pub const INIT_SETTLE_US: u32 = 2;

/// Longest sampling interval accepted for velocity differentiation, in µs
pub const VELOCITY_MAX_INTERVAL_US: i32 = 500_000;

/// Interval substituted when the measured one is non-positive or too long
pub const VELOCITY_FALLBACK_INTERVAL_S: f32 = 1e-3;

/// Monotonic microsecond time source
///
/// The counter is allowed to wrap around `u32::MAX`; intervals are taken
/// with wrapping arithmetic.
pub trait Clock {
    /// Current time in microseconds
    fn now_micros(&mut self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now_micros(&mut self) -> u32 {
        (**self).now_micros()
    }
}

/// Portable busy-wait delay
///
/// Spins for at least the requested duration as long as one loop iteration
/// takes at least one core clock cycle, which holds on every target. It
/// overshoots on cores that need several cycles per iteration; use a
/// hardware timer based [`DelayNs`] where tighter bounds matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpinDelay {
    core_clock_hz: u32,
}

impl SpinDelay {
    /// Create a delay calibrated for a core running at `core_clock_hz`
    #[must_use]
    pub const fn new(core_clock_hz: u32) -> Self {
        Self { core_clock_hz }
    }

    /// Core clock frequency this delay was built for
    #[must_use]
    pub const fn core_clock_hz(&self) -> u32 {
        self.core_clock_hz
    }

    /// Number of spin iterations needed to cover `ns`, rounded up
    #[must_use]
    pub const fn iterations(&self, ns: u32) -> u64 {
        (ns as u64 * self.core_clock_hz as u64).div_ceil(1_000_000_000)
    }
}

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut remaining = self.iterations(ns);
        while core::hint::black_box(remaining) > 0 {
            core::hint::spin_loop();
            remaining -= 1;
        }
    }
}

/// Sampling interval in seconds between two clock readings
///
/// Falls back to [`VELOCITY_FALLBACK_INTERVAL_S`] when the clock did not
/// advance, went backwards or the caller stalled for longer than
/// [`VELOCITY_MAX_INTERVAL_US`].
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
pub fn sample_interval_s(previous_us: u32, now_us: u32) -> f32 {
    let elapsed_us = now_us.wrapping_sub(previous_us) as i32;

    if elapsed_us <= 0 || elapsed_us > VELOCITY_MAX_INTERVAL_US {
        #[cfg(feature = "defmt")]
        defmt::trace!(
            "Velocity interval {} us out of range, using fallback",
            elapsed_us
        );
        return VELOCITY_FALLBACK_INTERVAL_S;
    }

    elapsed_us as f32 * 1e-6
}
