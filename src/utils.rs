use crate::frame::FRAME_MASK;

/// Verify even parity of an 18-bit SSI frame
///
/// The last bit clocked out makes the total count of ones even.
pub fn verify_parity(frame: u32) -> bool {
    (frame & FRAME_MASK).count_ones().is_multiple_of(2)
}
