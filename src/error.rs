/// Error type for AS5045 operations
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A chip-select, clock or data line failed
    Pin(E),
    /// Parity error in received frame
    ParityError,
    /// Status bits report an unusable sample (offset compensation pending or
    /// CORDIC overflow)
    SensorError,
}
