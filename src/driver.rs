//! Bit-banged SSI driver for the AS5045 magnetic position sensor

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::{
    diagnostics::Diagnostics,
    error::Error,
    frame::{self, COUNTS_PER_REVOLUTION, FRAME_BITS, Frame},
    timing::{self, Clock},
    tracker::{AngleTracker, Direction},
    utils,
};

/// Driver settings fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Rotation direction reported as positive
    pub direction: Direction,
    /// Dwell after every chip-select and clock edge, in nanoseconds
    pub clock_half_period_ns: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            direction: Direction::Cw,
            clock_half_period_ns: timing::DEFAULT_CLOCK_HALF_PERIOD_NS,
        }
    }
}

/// AS5045 driver instance (blocking)
///
/// Owns the chip-select and clock outputs, the data input, a busy-wait
/// delay for bit timing and a microsecond clock for velocity estimation.
/// All calls must come from a single polling loop: the tracker relies on
/// seeing every sample in order.
#[derive(Debug)]
pub struct As5045<CS, CLK, DATA, D, C> {
    cs: CS,
    clk: CLK,
    data: DATA,
    delay: D,
    clock: C,
    half_period_ns: u32,
    tracker: AngleTracker,
    bus_active: bool,
}

impl<CS, CLK, DATA, D, C, E> As5045<CS, CLK, DATA, D, C>
where
    CS: OutputPin<Error = E>,
    CLK: OutputPin<Error = E>,
    DATA: InputPin<Error = E>,
    D: DelayNs,
    C: Clock,
{
    /// Create a new AS5045 driver instance
    ///
    /// `cs` and `clk` must already be configured as outputs and `data` as an
    /// input. Nothing is driven until [`Self::init`].
    pub fn new(cs: CS, clk: CLK, data: DATA, delay: D, clock: C, config: Config) -> Self {
        Self {
            cs,
            clk,
            data,
            delay,
            clock,
            half_period_ns: config.clock_half_period_ns,
            tracker: AngleTracker::new(COUNTS_PER_REVOLUTION, config.direction),
            bus_active: false,
        }
    }

    /// Release the lines, consuming the driver
    ///
    /// Returns `(cs, clk, data)` so they can be switched to high impedance.
    pub fn release(self) -> (CS, CLK, DATA) {
        (self.cs, self.clk, self.data)
    }

    /// Park the bus and seed angle tracking from a first sample
    ///
    /// Clears the full turn and zero offsets and restarts the velocity
    /// baseline at the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if driving or sampling a line fails
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.park()?;
        self.bus_active = true;
        self.delay.delay_us(timing::INIT_SETTLE_US);

        let raw = self.raw_count()?;
        let now = self.clock.now_micros();
        self.tracker.seed(raw, now);

        #[cfg(feature = "defmt")]
        defmt::debug!("AS5045 initialised at raw {} (t = {} us)", raw, now);

        Ok(())
    }

    /// Run one SSI transaction and return the full 18-bit frame
    ///
    /// Chip-select is asserted (low), the clock is dropped, then every bit is
    /// sampled after a rising clock edge, MSB first. The frame is not
    /// checked; see [`Self::checked_frame`].
    ///
    /// # Errors
    ///
    /// Returns an error if driving or sampling a line fails
    pub fn read_frame(&mut self) -> Result<Frame, Error<E>> {
        let half_period = self.half_period_ns;
        self.bus_active = true;

        self.cs.set_low().map_err(Error::Pin)?;
        self.delay.delay_ns(half_period);
        self.clk.set_low().map_err(Error::Pin)?;
        self.delay.delay_ns(half_period);

        let mut raw = 0u32;
        for _ in 0..FRAME_BITS {
            self.clk.set_high().map_err(Error::Pin)?;
            self.delay.delay_ns(half_period);
            let bit = self.data.is_high().map_err(Error::Pin)?;
            raw = (raw << 1) | u32::from(bit);
            self.clk.set_low().map_err(Error::Pin)?;
            self.delay.delay_ns(half_period);
        }

        self.clk.set_high().map_err(Error::Pin)?;
        self.delay.delay_ns(half_period);
        self.cs.set_high().map_err(Error::Pin)?;

        #[cfg(feature = "defmt")]
        defmt::trace!("Received frame: 0x{:05X}", raw);

        Ok(Frame::new(raw))
    }

    /// Get the 12-bit absolute position
    ///
    /// Value ranges from 0 to 4095 (0° to 359.912°)
    /// Use [`COUNTS_PER_REVOLUTION`] for conversion calculations
    ///
    /// # Errors
    ///
    /// Returns an error if driving or sampling a line fails
    pub fn raw_count(&mut self) -> Result<u16, Error<E>> {
        self.read_frame().map(frame::extract_position)
    }

    /// Read a frame and reject it on bad parity or unusable status
    ///
    /// The sample is refused while offset compensation has not finished or a
    /// CORDIC overflow is flagged. Angle tracking does not go through this
    /// path.
    ///
    /// # Errors
    ///
    /// Returns an error if a line fails, parity check fails, or the status
    /// bits mark the position as invalid
    pub fn checked_frame(&mut self) -> Result<Frame, Error<E>> {
        let frame = self.read_frame()?;

        if !utils::verify_parity(frame.raw()) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Parity error in frame: 0x{:05X}", frame.raw());
            return Err(Error::ParityError);
        }

        let diagnostics = frame.diagnostics();
        if !diagnostics.offset_comp_finished() || diagnostics.cordic_overflow() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Sensor status rejects frame: {}", diagnostics);
            return Err(Error::SensorError);
        }

        Ok(frame)
    }

    /// Read the status bits trailing the position
    ///
    /// # Errors
    ///
    /// Returns an error if driving or sampling a line fails
    pub fn diagnostics(&mut self) -> Result<Diagnostics, Error<E>> {
        self.read_frame().map(|frame| frame.diagnostics())
    }

    /// Get the continuous shaft angle in radians
    ///
    /// Unbounded: every wrap through zero adds or removes one full turn.
    ///
    /// # Errors
    ///
    /// Returns an error if driving or sampling a line fails
    pub fn angle(&mut self) -> Result<f32, Error<E>> {
        let raw = self.raw_count()?;
        Ok(self.tracker.update(raw))
    }

    /// Get the shaft velocity in radians per second
    ///
    /// Differentiates against the angle and time of the previous call.
    /// Takes one sample, so it also advances [`Self::angle`]'s history.
    ///
    /// # Errors
    ///
    /// Returns an error if driving or sampling a line fails
    pub fn velocity(&mut self) -> Result<f32, Error<E>> {
        let now = self.clock.now_micros();
        let raw = self.raw_count()?;
        Ok(self.tracker.velocity(now, raw))
    }

    /// Set the current shaft position as zero
    ///
    /// Returns the angle in radians that was removed, negated.
    ///
    /// # Errors
    ///
    /// Returns an error if driving or sampling a line fails
    pub fn calibrate_relative_zero(&mut self) -> Result<f32, Error<E>> {
        let raw = self.raw_count()?;
        Ok(self.tracker.calibrate_relative_zero(raw))
    }

    /// Go back to the sensor's built-in absolute zero
    ///
    /// Returns the dropped relative zero in radians, negated. Does not touch
    /// the bus.
    pub fn calibrate_absolute_zero(&mut self) -> f32 {
        self.tracker.calibrate_absolute_zero()
    }

    /// The AS5045 reports an absolute position on every read
    #[must_use]
    pub const fn has_absolute_zero(&self) -> bool {
        true
    }

    /// No homing pass is needed to find the absolute zero
    #[must_use]
    pub const fn needs_absolute_zero_search(&self) -> bool {
        false
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.tracker.direction()
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.tracker.set_direction(direction);
    }

    /// Angle tracking state
    #[must_use]
    pub fn tracker(&self) -> &AngleTracker {
        &self.tracker
    }

    /// Deselect the sensor and leave the clock idle high
    ///
    /// Does nothing if the bus is already parked by a previous call.
    ///
    /// # Errors
    ///
    /// Returns an error if driving a line fails
    pub fn close(&mut self) -> Result<(), Error<E>> {
        if !self.bus_active {
            return Ok(());
        }

        self.park()?;
        self.bus_active = false;

        #[cfg(feature = "defmt")]
        defmt::debug!("AS5045 bus closed");

        Ok(())
    }

    fn park(&mut self) -> Result<(), Error<E>> {
        self.cs.set_high().map_err(Error::Pin)?;
        self.clk.set_high().map_err(Error::Pin)
    }
}
