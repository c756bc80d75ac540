use bitflags::bitflags;

/// Bytes sent by the device in response to any command.
#[derive(Debug)]
pub struct FromDevice;

impl FromDevice {
    pub const ACK: u8 = 0xFA;
    pub const RESEND: u8 = 0xFE;
    /// Self test failed, or a command was not understood.
    pub const ERROR: u8 = 0xFC;
    /// Self test passed, sent after power-up and reset.
    pub const BAT_COMPLETION_CODE: u8 = 0xAA;
}

#[derive(Debug)]
pub struct MouseCommand;

impl MouseCommand {
    pub const RESET: u8 = 0xFF;
    pub const SET_DEFAULTS: u8 = 0xF6;
    pub const DISABLE_DATA_REPORTING: u8 = 0xF5;
    pub const ENABLE_DATA_REPORTING: u8 = 0xF4;
    /// Followed by the rate in samples per second.
    pub const SET_SAMPLE_RATE: u8 = 0xF3;
    pub const READ_ID: u8 = 0xF2;
    /// Answered with three status bytes.
    pub const STATUS_REQUEST: u8 = 0xE9;
    /// Followed by a [`Resolution`](super::mouse::Resolution).
    pub const SET_RESOLUTION: u8 = 0xE8;
    pub const SET_SCALING_1_1: u8 = 0xE6;
}

#[derive(Debug)]
pub struct MouseId;

impl MouseId {
    pub const STANDARD: u8 = 0x00;
    pub const WHEEL: u8 = 0x03;
    pub const FIVE_BUTTON: u8 = 0x04;
}

bitflags! {
    /// First byte of a movement report, also the first status byte.
    pub struct PacketFlags: u8 {
        const Y_OVERFLOW = 0b1000_0000;
        const X_OVERFLOW = 0b0100_0000;
        const Y_SIGN = 0b0010_0000;
        const X_SIGN = 0b0001_0000;
        const ALWAYS_ONE = 0b0000_1000;
        const MIDDLE_BUTTON = 0b0000_0100;
        const RIGHT_BUTTON = 0b0000_0010;
        const LEFT_BUTTON = 0b0000_0001;
    }
}

bitflags! {
    pub struct Buttons: u8 {
        const MIDDLE = 0b0000_0100;
        const RIGHT = 0b0000_0010;
        const LEFT = 0b0000_0001;
    }
}

#[derive(Debug)]
pub struct KeyboardCommand;

impl KeyboardCommand {
    /// Followed by [`StatusIndicators`].
    pub const SET_STATUS_INDICATORS: u8 = 0xED;
}

bitflags! {
    pub struct StatusIndicators: u8 {
        const SCROLL_LOCK = 0b0000_0001;
        const NUM_LOCK = 0b0000_0010;
        const CAPS_LOCK = 0b0000_0100;
    }
}

#[derive(Debug)]
pub struct FromKeyboard;

impl FromKeyboard {
    /// Key buffer of the keyboard overflowed.
    pub const KEY_DETECTION_OVERRUN_SCANCODE_SET_2_AND_3: u8 = 0;
    pub const ECHO: u8 = 0xEE;
}
