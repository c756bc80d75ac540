use bitflags::bitflags;

bitflags! {
    /// Set of PS/2 signal lines.
    ///
    /// Used both to select lines to drive and to report which lines
    /// sample high.
    pub struct Lines: u8 {
        const CLOCK = 0b0000_0001;
        const DATA = 0b0000_0010;
    }
}

/// How the host drives a line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Drive {
    /// Input mode. The bus pull-up takes the line high unless the
    /// device pulls it low.
    Release,
    Low,
    High,
}

impl Drive {
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Drive::High
        } else {
            Drive::Low
        }
    }
}

/// Bit values of the 11-bit PS/2 frame.
#[derive(Debug)]
pub struct FrameBits;

impl FrameBits {
    pub const START: bool = false;
    pub const STOP: bool = true;
    /// Device pulls data low to acknowledge a host-to-device frame.
    pub const ACK: bool = false;
    pub const DATA_BITS: u8 = 8;
}
