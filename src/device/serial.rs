//! PS/2 movement report to Microsoft serial mouse format.
//!
//! Serial mouse bytes are 7 bits wide, bit 6 marks the first byte of a
//! report. Movement is 8 bits there against 9 bits on PS/2, so the least
//! significant movement bit is dropped. Middle button, overflow flags and
//! the wheel byte have no serial counterpart.

use super::raw::PacketFlags;

/// Sync bit of the first serial byte.
const SERIAL_SYNC: u8 = 0b0100_0000;
/// Bit 7 is sent as 1 so 8N1 output looks like 7N2 to the receiver.
const SERIAL_FILL: u8 = 0b1000_0000;

/// Translate a 3-byte PS/2 report. `None` if the first byte does not
/// have the always-one bit set, which is the only check possible.
pub fn to_serial(report: &[u8; 3]) -> Option<[u8; 3]> {
    let flags = PacketFlags::from_bits_truncate(report[0]);
    if !flags.contains(PacketFlags::ALWAYS_ONE) {
        return None;
    }

    let [first, x, y] = *report;

    let mut serial = [SERIAL_FILL | SERIAL_SYNC, SERIAL_FILL, SERIAL_FILL];

    // Buttons.
    serial[0] |= (first & 0x01) << 5;
    serial[0] |= (first & 0x02) << 3;

    // Top two bits of each 8-bit movement value.
    serial[0] |= (first & 0x20) >> 2;
    serial[0] |= (y & 0x80) >> 5;
    serial[0] |= (first & 0x10) >> 3;
    serial[0] |= (x & 0x80) >> 7;

    // Remaining six bits.
    serial[1] |= (x & 0x7E) >> 1;
    serial[2] |= (y & 0x7E) >> 1;

    Some(serial)
}
