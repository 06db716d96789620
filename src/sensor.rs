//! Capability contract expected by motor control loops

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{As5045, Error, timing::Clock};

/// Rotary position sensor as seen by a control loop
///
/// Angles are in radians and unbounded; velocities in radians per second.
pub trait RotarySensor {
    type Error;

    /// Prepare the sensor and take the first sample
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be reached
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Current continuous angle
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be reached
    fn angle(&mut self) -> Result<f32, Self::Error>;

    /// Current angular velocity
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be reached
    fn velocity(&mut self) -> Result<f32, Self::Error>;

    /// Make the current position the zero angle, returning the negated
    /// angle removed
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be reached
    fn calibrate_relative_zero(&mut self) -> Result<f32, Self::Error>;

    /// Return to the sensor's absolute zero, returning the negated offset
    /// removed
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be reached
    fn calibrate_absolute_zero(&mut self) -> Result<f32, Self::Error>;

    /// Whether the sensor knows an absolute zero position
    fn has_absolute_zero(&self) -> bool;

    /// Whether a homing pass is needed to find that zero
    fn needs_absolute_zero_search(&self) -> bool;
}

impl<CS, CLK, DATA, D, C, E> RotarySensor for As5045<CS, CLK, DATA, D, C>
where
    CS: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    DATA: InputPin<Error = E>,
    D: DelayNs,
    C: Clock,
{
    type Error = Error<E>;

    fn init(&mut self) -> Result<(), Self::Error> {
        As5045::init(self)
    }

    fn angle(&mut self) -> Result<f32, Self::Error> {
        As5045::angle(self)
    }

    fn velocity(&mut self) -> Result<f32, Self::Error> {
        As5045::velocity(self)
    }

    fn calibrate_relative_zero(&mut self) -> Result<f32, Self::Error> {
        As5045::calibrate_relative_zero(self)
    }

    fn calibrate_absolute_zero(&mut self) -> Result<f32, Self::Error> {
        Ok(As5045::calibrate_absolute_zero(self))
    }

    fn has_absolute_zero(&self) -> bool {
        As5045::has_absolute_zero(self)
    }

    fn needs_absolute_zero_search(&self) -> bool {
        As5045::needs_absolute_zero_search(self)
    }
}
