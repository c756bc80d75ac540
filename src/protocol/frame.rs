//! Bit arithmetic of one 8-bit odd-parity frame.

use crate::bus::raw::FrameBits;

/// Shift register, remaining-bit counter and running parity of the byte
/// being received or transmitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Frame {
    pub shift: u8,
    pub remaining: u8,
    /// XOR of the data bits seen so far, `0` or `1`.
    pub parity: u8,
}

impl Frame {
    pub const fn receive() -> Self {
        Self {
            shift: 0,
            remaining: FrameBits::DATA_BITS,
            parity: 0,
        }
    }

    pub const fn transmit(byte: u8) -> Self {
        Self {
            shift: byte,
            remaining: FrameBits::DATA_BITS,
            parity: 0,
        }
    }

    /// Shift in one data bit, least significant bit first. Returns `true`
    /// after the eighth bit.
    pub fn receive_bit(&mut self, bit: bool) -> bool {
        self.shift = (self.shift >> 1) | if bit { 0x80 } else { 0 };
        self.parity ^= bit as u8;
        self.count_bit()
    }

    /// Odd parity: the parity bit XOR all data bits must be 1.
    pub fn parity_ok(&self, parity_bit: bool) -> bool {
        (self.parity ^ parity_bit as u8) != 0
    }

    /// Shift out the next data bit, least significant bit first.
    /// Returns the bit and `true` after the eighth bit.
    pub fn transmit_bit(&mut self) -> (bool, bool) {
        let bit = self.shift & 0x01 != 0;
        self.shift >>= 1;
        self.parity ^= bit as u8;
        (bit, self.count_bit())
    }

    /// Parity bit making the transmitted frame odd.
    pub fn parity_bit(&self) -> bool {
        self.parity == 0
    }

    /// Received byte, valid once all data bits are in.
    pub fn byte(&self) -> u8 {
        self.shift
    }

    fn count_bit(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }
}
