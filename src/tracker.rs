//! Multi-turn angle tracking and velocity estimation
//!
//! [`AngleTracker`] turns a stream of bounded raw counts into an unbounded
//! angle. It never touches the bus, so it can be fed from any source of
//! counts and timestamps.

use core::f32::consts::TAU;

use crate::timing;

/// Declared positive rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Increasing raw counts read as positive angles
    #[default]
    Cw,
    /// Increasing raw counts read as negative angles
    Ccw,
}

impl Direction {
    /// Sign applied to angles and velocities
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Direction::Cw => 1.0,
            Direction::Ccw => -1.0,
        }
    }
}

/// Continuous angle state built from consecutive raw counts
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AngleTracker {
    cpr: u16,
    direction: Direction,
    previous_raw: u16,
    // signed multiple of 2π
    full_turn_offset: f32,
    zero_offset: i32,
    previous_angle: f32,
    previous_timestamp: u32,
}

impl AngleTracker {
    /// Create a tracker for a sensor with `cpr` counts per revolution
    ///
    /// The tracker starts from a zero baseline; call [`Self::seed`] with a
    /// first sample before relying on wrap detection.
    ///
    /// # Panics
    ///
    /// Panics if `cpr` is zero.
    #[must_use]
    pub fn new(cpr: u16, direction: Direction) -> Self {
        assert!(cpr > 0, "counts per revolution must be non-zero");
        Self {
            cpr,
            direction,
            previous_raw: 0,
            full_turn_offset: 0.0,
            zero_offset: 0,
            previous_angle: 0.0,
            previous_timestamp: 0,
        }
    }

    /// Reset all tracking state around a first raw sample taken at `now_us`
    pub fn seed(&mut self, raw: u16, now_us: u32) {
        debug_assert!(raw < self.cpr);
        self.previous_raw = raw;
        self.full_turn_offset = 0.0;
        self.zero_offset = 0;
        self.previous_angle = 0.0;
        self.previous_timestamp = now_us;
    }

    /// Feed one raw sample and return the continuous angle in radians
    ///
    /// A jump larger than 80% of a revolution between two samples is taken
    /// as a wrap through zero and moves the full turn offset by one turn.
    pub fn update(&mut self, raw: u16) -> f32 {
        debug_assert!(raw < self.cpr);
        let delta = i32::from(raw) - i32::from(self.previous_raw);

        if self.is_wrap(delta) {
            if delta > 0 {
                self.full_turn_offset -= TAU;
            } else {
                self.full_turn_offset += TAU;
            }

            #[cfg(feature = "defmt")]
            defmt::debug!(
                "Wrap {} -> {}, full turn offset {}",
                self.previous_raw,
                raw,
                self.full_turn_offset
            );
        }

        self.previous_raw = raw;

        // Not folded back into [0, cpr): a calibrated zero shifts the
        // single-turn range instead.
        let adjusted = i32::from(raw) - self.zero_offset;
        self.direction.sign() * (self.full_turn_offset + self.fraction(adjusted) * TAU)
    }

    /// Feed one raw sample taken at `now_us` and return the angular velocity
    /// in radians per second
    ///
    /// Advances the same history as [`Self::update`].
    pub fn velocity(&mut self, now_us: u32, raw: u16) -> f32 {
        let interval_s = timing::sample_interval_s(self.previous_timestamp, now_us);

        let angle = self.update(raw);
        let velocity = (angle - self.previous_angle) / interval_s;

        self.previous_angle = angle;
        self.previous_timestamp = now_us;
        velocity
    }

    /// Declare the position of `raw` as zero
    ///
    /// Feeds `raw` through [`Self::update`] first and returns the negated
    /// angle that was removed.
    pub fn calibrate_relative_zero(&mut self, raw: u16) -> f32 {
        let offset = -self.update(raw);
        self.zero_offset = i32::from(self.previous_raw);
        self.full_turn_offset = 0.0;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Relative zero at raw {}, removed {} rad",
            self.zero_offset,
            offset
        );

        offset
    }

    /// Return to the sensor's own absolute zero
    ///
    /// Returns the calibrated zero that was dropped, negated, in radians.
    pub fn calibrate_absolute_zero(&mut self) -> f32 {
        let rotation = -self.zero_offset;
        self.zero_offset = 0;
        self.full_turn_offset = 0.0;

        #[cfg(feature = "defmt")]
        defmt::debug!("Absolute zero restored, shift {} counts", rotation);

        self.fraction(rotation) * TAU
    }

    /// Counts per revolution
    #[must_use]
    pub fn cpr(&self) -> u16 {
        self.cpr
    }

    /// Declared positive rotation direction
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Last raw count fed into the tracker
    #[must_use]
    pub fn previous_raw(&self) -> u16 {
        self.previous_raw
    }

    /// Accumulated completed revolutions, in radians
    #[must_use]
    pub fn full_turn_offset(&self) -> f32 {
        self.full_turn_offset
    }

    /// Raw count subtracted before conversion to radians
    #[must_use]
    pub fn zero_offset(&self) -> i32 {
        self.zero_offset
    }

    /// Angle recorded by the last [`Self::velocity`] call
    #[must_use]
    pub fn previous_angle(&self) -> f32 {
        self.previous_angle
    }

    /// Timestamp recorded by the last [`Self::velocity`] call or seed
    #[must_use]
    pub fn previous_timestamp(&self) -> u32 {
        self.previous_timestamp
    }

    fn is_wrap(&self, delta: i32) -> bool {
        // |delta| > 0.8 * cpr
        delta.unsigned_abs() * 5 > u32::from(self.cpr) * 4
    }

    #[allow(clippy::cast_precision_loss)]
    fn fraction(&self, counts: i32) -> f32 {
        counts as f32 / f32::from(self.cpr)
    }
}
