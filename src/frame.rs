//! SSI frame layout for the AS5045.
//!
//! One read transaction shifts out 18 bits, MSB first:
//!
//! | bits  | field                                  |
//! |-------|----------------------------------------|
//! | 17..6 | absolute position, 12 bits             |
//! | 5     | OCF, offset compensation finished      |
//! | 4     | COF, CORDIC overflow                   |
//! | 3     | LIN, linearity alarm                   |
//! | 2     | MagINC, magnitude increase             |
//! | 1     | MagDEC, magnitude decrease             |
//! | 0     | even parity                            |

use crate::diagnostics::Diagnostics;

/// Number of clock cycles in one SSI transaction
pub const FRAME_BITS: u8 = 18;

/// Mask covering every bit of a frame
pub const FRAME_MASK: u32 = (1 << FRAME_BITS) - 1;

/// Counts per revolution (12-bit: 0-4095, representing 0-360°)
pub const COUNTS_PER_REVOLUTION: u16 = 1 << POSITION_BITS;

const POSITION_BITS: u8 = 12;
const STATUS_BITS: u8 = FRAME_BITS - POSITION_BITS;
const STATUS_MASK: u32 = (1 << STATUS_BITS) - 1;

bitfield::bitfield! {
    /// Raw 18-bit word read from the sensor
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Frame(u32);
    impl Debug;
    u16;
    /// Absolute angular position
    pub position, _: 17, 6;
    /// Offset compensation finished
    pub ocf, _: 5;
    /// CORDIC overflow: position data is invalid while set
    pub cof, _: 4;
    /// Linearity alarm: magnetic field outside the linear range
    pub lin, _: 3;
    /// Magnitude increase: magnet pushed towards the IC
    pub mag_inc, _: 2;
    /// Magnitude decrease: magnet pulled away from the IC
    pub mag_dec, _: 1;
    /// Even parity over the preceding 17 bits
    pub parity, _: 0;
}

impl Frame {
    /// Wrap a word shifted in from the bus, dropping anything above bit 17
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw & FRAME_MASK)
    }

    /// The frame as clocked out of the sensor
    #[must_use]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Status bits (OCF through MagDEC) decoded as diagnostics
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(((self.0 & STATUS_MASK) >> 1) as u8)
    }
}

impl From<u32> for Frame {
    fn from(raw: u32) -> Self {
        Self::new(raw)
    }
}

/// Position field of a frame, always in `[0, COUNTS_PER_REVOLUTION)`
#[must_use]
#[inline]
pub fn extract_position(frame: Frame) -> u16 {
    frame.position()
}
