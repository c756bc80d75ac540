//! Mouse movement reports.

use arraydeque::{ArrayDeque, Saturating};

use super::raw::{Buttons, PacketFlags};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReportFormat {
    /// 3 bytes: flags, X, Y.
    Standard,
    /// 4 bytes, the last one is wheel movement. Mouse ID 3.
    Wheel,
}

impl ReportFormat {
    pub fn len(self) -> usize {
        match self {
            ReportFormat::Standard => 3,
            ReportFormat::Wheel => 4,
        }
    }
}

/// One complete report as received.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Packet {
    bytes: [u8; 4],
    format: ReportFormat,
}

impl Packet {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.format.len()]
    }

    /// The first three bytes, which all formats share.
    pub fn standard(&self) -> [u8; 3] {
        [self.bytes[0], self.bytes[1], self.bytes[2]]
    }

    pub fn report(&self) -> MouseReport {
        let flags = PacketFlags::from_bits_truncate(self.bytes[0]);

        let movement = |value: u8, negative: bool| {
            i16::from(value) - if negative { 0x100 } else { 0 }
        };

        MouseReport {
            buttons: Buttons::from_bits_truncate(self.bytes[0]),
            dx: movement(self.bytes[1], flags.contains(PacketFlags::X_SIGN)),
            dy: movement(self.bytes[2], flags.contains(PacketFlags::Y_SIGN)),
            wheel: match self.format {
                ReportFormat::Standard => 0,
                ReportFormat::Wheel => self.bytes[3] as i8,
            },
            x_overflow: flags.contains(PacketFlags::X_OVERFLOW),
            y_overflow: flags.contains(PacketFlags::Y_OVERFLOW),
        }
    }
}

/// Decoded movement report. Positive `dy` is up.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MouseReport {
    pub buttons: Buttons,
    pub dx: i16,
    pub dy: i16,
    pub wheel: i8,
    pub x_overflow: bool,
    pub y_overflow: bool,
}

/// Collects received bytes into reports.
///
/// Bytes are dropped until one looks like a first report byte (bit 3
/// set), which resynchronises after a lost byte.
#[derive(Debug)]
pub struct PacketReader {
    bytes: ArrayDeque<[u8; 4], Saturating>,
    format: ReportFormat,
}

impl PacketReader {
    pub fn new(format: ReportFormat) -> Self {
        Self {
            bytes: ArrayDeque::new(),
            format,
        }
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    pub fn set_format(&mut self, format: ReportFormat) {
        self.format = format;
        self.bytes.clear();
    }

    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Returns a packet when `byte` completes one.
    pub fn feed(&mut self, byte: u8) -> Option<Packet> {
        if self.bytes.is_empty()
            && !PacketFlags::from_bits_truncate(byte).contains(PacketFlags::ALWAYS_ONE)
        {
            return None;
        }

        if self.bytes.push_back(byte).is_err() {
            self.bytes.clear();
            return None;
        }

        if self.bytes.len() < self.format.len() {
            return None;
        }

        let mut bytes = [0; 4];
        for slot in bytes.iter_mut() {
            match self.bytes.pop_front() {
                Some(byte) => *slot = byte,
                None => break,
            }
        }

        Some(Packet {
            bytes,
            format: self.format,
        })
    }
}
