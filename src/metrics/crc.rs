//! TFRecord checksum: CRC-32C (Castagnoli) with a rotate-and-add mask

const MASK_DELTA: u32 = 0xA282_EAD8;

/// Checksum as stored in TFRecord framing
pub fn masked_crc32c(data: &[u8]) -> u32 {
    crc32c::crc32c(data).rotate_right(15).wrapping_add(MASK_DELTA)
}
