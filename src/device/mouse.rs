//! PS/2 mouse session: reset, configuration and identification.
//!
//! Built only on the foreground API of the port. Command exchanges are
//! paced with fixed delays instead of waiting on each response.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use super::{
    raw::{Buttons, FromDevice, MouseCommand, MouseId},
    report::{Packet, PacketReader, ReportFormat},
};
use crate::{bus::io::Ps2IO, protocol::Host};

/// Time for the mouse to answer a command.
const RESPONSE_DELAY_MS: u32 = 22;
const FLUSH_FAST_MS: u32 = 0;
const FLUSH_MEDIUM_MS: u32 = 22;
const FLUSH_SLOW_MS: u32 = 100;
/// Self test after reset takes up to 500 ms on some mice.
const RESET_POLL_MS: u32 = 250;
const RESET_POLLS: u8 = 8;
const RESET_SETTLE_MS: u32 = 100;
/// Poll period of the busy wait while a byte is sent.
const SEND_POLL_US: u32 = 10;

/// Sample rate knock which switches wheel mice to 4-byte reports.
#[rustfmt::skip]
const WHEEL_KNOCK: [u8; 6] = [
    MouseCommand::SET_SAMPLE_RATE, 200,
    MouseCommand::SET_SAMPLE_RATE, 100,
    MouseCommand::SET_SAMPLE_RATE, 80,
];

/// Counts per millimetre.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Resolution {
    One = 0,
    Two = 1,
    Four = 2,
    Eight = 3,
}

#[derive(Debug, Copy, Clone)]
pub struct InitOptions {
    /// Try to enable the wheel.
    pub wheel: bool,
    /// Reset is repeated until the mouse answers or this many tries fail.
    pub reset_attempts: u8,
    pub resolution: Resolution,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            wheel: true,
            reset_attempts: 5,
            resolution: Resolution::Four,
        }
    }
}

/// What `Mouse::init` found out.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MouseInfo {
    pub id: u8,
    pub format: ReportFormat,
    /// Buttons held down during initialization.
    pub buttons: Buttons,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MouseError {
    NoResponse,
    UnexpectedResponse(u8),
}

impl fmt::Display for MouseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MouseError::NoResponse => write!(f, "mouse did not respond"),
            MouseError::UnexpectedResponse(byte) => write!(f, "unexpected response {:#04x}", byte),
        }
    }
}

#[derive(Debug)]
pub struct Mouse<'a, IO, D, const N: usize> {
    host: Host<'a, N>,
    io: IO,
    delay: D,
}

impl<'a, IO: Ps2IO, D: DelayNs, const N: usize> Mouse<'a, IO, D, N> {
    pub fn new(host: Host<'a, N>, io: IO, delay: D) -> Self {
        Self { host, io, delay }
    }

    pub fn exit(self) -> (Host<'a, N>, IO, D) {
        (self.host, self.io, self.delay)
    }

    /// Reset and configure the mouse, then enable data reporting.
    pub fn init(&mut self, options: InitOptions) -> Result<MouseInfo, MouseError> {
        self.host.enable_reception(&mut self.io, true);

        let mut attempts = 0;
        while let Err(e) = self.reset() {
            attempts += 1;
            warn!("ps2 mouse: reset attempt {} failed: {}", attempts, e);
            if attempts >= options.reset_attempts {
                return Err(e);
            }
        }

        self.command(MouseCommand::DISABLE_DATA_REPORTING, true);
        self.command(MouseCommand::SET_DEFAULTS, true);
        self.command(MouseCommand::SET_SCALING_1_1, true);
        self.command(MouseCommand::SET_RESOLUTION, true);
        self.command(options.resolution as u8, true);

        let buttons = match self.status() {
            Ok(status) => Buttons::from_bits_truncate(status[0]),
            Err(e) => {
                warn!("ps2 mouse: status request failed: {}", e);
                Buttons::empty()
            }
        };

        self.flush(FLUSH_MEDIUM_MS);

        let mut id = MouseId::STANDARD;
        if options.wheel {
            for &byte in WHEEL_KNOCK.iter() {
                self.send(byte);
            }
            self.flush(FLUSH_MEDIUM_MS);

            match self.read_id() {
                Ok(value) => id = value,
                Err(e) => warn!("ps2 mouse: read ID failed: {}", e),
            }
        }

        let format = match id {
            MouseId::WHEEL | MouseId::FIVE_BUTTON => ReportFormat::Wheel,
            _ => ReportFormat::Standard,
        };

        self.command(MouseCommand::ENABLE_DATA_REPORTING, true);
        self.flush(FLUSH_SLOW_MS);

        debug!("ps2 mouse: ready, id {:#04x}, {:?} reports", id, format);

        Ok(MouseInfo { id, format, buttons })
    }

    /// Reset the mouse and wait for its self test to finish.
    pub fn reset(&mut self) -> Result<(), MouseError> {
        self.flush(FLUSH_FAST_MS);

        self.send(MouseCommand::DISABLE_DATA_REPORTING);
        self.flush(FLUSH_FAST_MS);

        for _ in 0..3 {
            self.send(MouseCommand::RESET);
        }

        for _ in 0..RESET_POLLS {
            self.delay.delay_ms(RESET_POLL_MS);

            if let Some(byte) = self.host.getbyte() {
                // Some mice answer the reset with a plain ACK.
                if byte == FromDevice::BAT_COMPLETION_CODE || byte == FromDevice::ACK {
                    // The rest is most likely the mouse ID.
                    self.delay.delay_ms(RESET_SETTLE_MS);
                    self.flush(FLUSH_FAST_MS);
                    return Ok(());
                }

                return Err(MouseError::UnexpectedResponse(byte));
            }
        }

        Err(MouseError::NoResponse)
    }

    /// Send a command byte. With `wait`, give the mouse time to answer and
    /// return the first byte received.
    pub fn command(&mut self, command: u8, wait: bool) -> Option<u8> {
        self.send(command);

        if wait {
            self.delay.delay_ms(RESPONSE_DELAY_MS);
            self.host.getbyte()
        } else {
            None
        }
    }

    /// Send a command which is answered with ACK and `reply.len()` bytes.
    pub fn query(&mut self, command: u8, reply: &mut [u8]) -> Result<(), MouseError> {
        self.send(command);
        self.delay.delay_ms(RESPONSE_DELAY_MS);

        match self.host.getbyte() {
            Some(FromDevice::ACK) => (),
            Some(byte) => return Err(MouseError::UnexpectedResponse(byte)),
            None => return Err(MouseError::NoResponse),
        }

        for slot in reply.iter_mut() {
            *slot = self.host.getbyte().ok_or(MouseError::NoResponse)?;
        }

        Ok(())
    }

    pub fn status(&mut self) -> Result<[u8; 3], MouseError> {
        let mut status = [0; 3];
        self.query(MouseCommand::STATUS_REQUEST, &mut status)?;
        Ok(status)
    }

    pub fn read_id(&mut self) -> Result<u8, MouseError> {
        let mut id = [0; 1];
        self.query(MouseCommand::READ_ID, &mut id)?;
        Ok(id[0])
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.command(MouseCommand::DISABLE_DATA_REPORTING, true);
        self.command(MouseCommand::SET_RESOLUTION, true);
        self.command(resolution as u8, true);
        self.command(MouseCommand::ENABLE_DATA_REPORTING, true);
    }

    /// Discard received bytes until nothing arrives for `pace_ms`.
    pub fn flush(&mut self, pace_ms: u32) {
        self.delay.delay_ms(pace_ms);
        loop {
            if let Some(byte) = self.host.getbyte() {
                trace!("ps2 mouse: flushed {:#04x}", byte);
            }
            self.delay.delay_ms(pace_ms);
            if !self.host.available() {
                break;
            }
        }
    }

    /// Feed received bytes to `reader` until a report is complete.
    pub fn poll_report(&mut self, reader: &mut PacketReader) -> Option<Packet> {
        while let Some(byte) = self.host.getbyte() {
            if let Some(packet) = reader.feed(byte) {
                return Some(packet);
            }
        }
        None
    }

    fn send(&mut self, byte: u8) {
        let delay = &mut self.delay;
        self.host
            .send_byte_with(&mut self.io, byte, |_| delay.delay_us(SEND_POLL_US));
    }
}
