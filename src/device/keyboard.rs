use pc_keyboard::{DecodedKey, Keyboard, KeyboardLayout, ScancodeSet};

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use core::fmt;

use super::raw::{FromDevice, FromKeyboard, KeyboardCommand, StatusIndicators};
use crate::{bus::io::Ps2IO, protocol::Host};

const SEND_POLL_US: u32 = 10;

/// Decodes scancodes received on the port.
pub struct KeyboardDriver<'a, IO, D, K: KeyboardLayout, S: ScancodeSet, const N: usize> {
    host: Host<'a, N>,
    io: IO,
    delay: D,
    keyboard: Keyboard<K, S>,
}

impl<IO, D, K: KeyboardLayout, S: ScancodeSet, const N: usize> fmt::Debug
    for KeyboardDriver<'_, IO, D, K, S, N>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "KeyboardDriver")
    }
}

impl<'a, IO: Ps2IO, D: DelayNs, K: KeyboardLayout, S: ScancodeSet, const N: usize>
    KeyboardDriver<'a, IO, D, K, S, N>
{
    pub fn new(host: Host<'a, N>, io: IO, delay: D, keyboard: Keyboard<K, S>) -> Self {
        KeyboardDriver { host, io, delay, keyboard }
    }

    /// Decode received bytes until one produces a key.
    pub fn poll_keyboard(&mut self) -> Option<DecodedKey> {
        while let Some(data) = self.host.getbyte() {
            if let Some(key) = self.handle_keyboard_data(data) {
                return Some(key);
            }
        }
        None
    }

    pub fn set_status_indicators(&mut self, indicators: StatusIndicators) {
        self.send(KeyboardCommand::SET_STATUS_INDICATORS);
        self.send(indicators.bits());
    }

    pub fn exit(self) -> (Host<'a, N>, IO, D) {
        (self.host, self.io, self.delay)
    }

    fn handle_keyboard_data(&mut self, data: u8) -> Option<DecodedKey> {
        match data {
            FromKeyboard::KEY_DETECTION_OVERRUN_SCANCODE_SET_2_AND_3 => {
                warn!("ps2 keyboard: key detection overrun");
                return None;
            }
            FromDevice::ERROR => {
                warn!("ps2 keyboard: self test failed");
                return None;
            }
            FromDevice::BAT_COMPLETION_CODE => {
                debug!("ps2 keyboard: self test passed");
                return None;
            }
            // Command responses are not scancodes.
            FromDevice::ACK | FromDevice::RESEND | FromKeyboard::ECHO => return None,
            _ => (),
        }

        match self.keyboard.add_byte(data) {
            Ok(event) => event.and_then(|event| self.keyboard.process_keyevent(event)),
            Err(e) => {
                warn!("ps2 keyboard: scancode {:#04x} rejected: {:?}", data, e);
                None
            }
        }
    }

    fn send(&mut self, byte: u8) {
        let delay = &mut self.delay;
        self.host
            .send_byte_with(&mut self.io, byte, |_| delay.delay_us(SEND_POLL_US));
    }
}
