//! Status flags trailing the position field of an AS5045 frame

/// Status bits OCF, COF, LIN, MagINC and MagDEC, in that order from bit 4
/// down to bit 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    raw: u8,
}

impl Diagnostics {
    /// Create diagnostics from the five raw status bits
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self { raw: raw & 0x1F }
    }

    /// Get the raw status bits
    #[must_use]
    pub const fn raw(&self) -> u8 {
        self.raw
    }

    /// OCF: Offset compensation finished
    ///
    /// Set once the offset compensation algorithm has finished after
    /// power-up. Position data read before that is not reliable
    #[must_use]
    pub const fn offset_comp_finished(&self) -> bool {
        self.raw & 0x10 != 0
    }

    /// COF: CORDIC overflow
    ///
    /// When this bit is set, the position data is invalid
    #[must_use]
    pub const fn cordic_overflow(&self) -> bool {
        self.raw & 0x08 != 0
    }

    /// LIN: Linearity alarm
    ///
    /// The magnet is misaligned or out of range and the position may be
    /// inaccurate
    #[must_use]
    pub const fn linearity_alarm(&self) -> bool {
        self.raw & 0x04 != 0
    }

    /// MagINC: magnet moving towards the IC
    #[must_use]
    pub const fn magnitude_increase(&self) -> bool {
        self.raw & 0x02 != 0
    }

    /// MagDEC: magnet moving away from the IC
    #[must_use]
    pub const fn magnitude_decrease(&self) -> bool {
        self.raw & 0x01 != 0
    }

    /// Check if the magnetic field strength is within acceptable range
    ///
    /// MagINC and MagDEC both set means the field is out of range
    #[must_use]
    pub const fn magnetic_field_ok(&self) -> bool {
        !(self.magnitude_increase() && self.magnitude_decrease())
    }

    /// Check if data is valid
    ///
    /// Returns `true` once offset compensation has finished, there is no
    /// CORDIC overflow and the magnetic field is within acceptable range
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.offset_comp_finished() && !self.cordic_overflow() && self.magnetic_field_ok()
    }
}

impl From<u8> for Diagnostics {
    fn from(raw: u8) -> Self {
        Self::new(raw)
    }
}
