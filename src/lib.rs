//! Interrupt driven PS/2 host for microcontrollers.
//!
//! The whole protocol runs from two interrupt sources: a falling edge
//! on the clock line and a periodic hardware timer. Foreground code only
//! reads received bytes and asks for bytes to be sent.
//!
//! ```text
//!   clock edge ISR ──► ClockEdge::on_falling_edge ─┐
//!                                                  ├─► shared state ◄── Host (foreground)
//!   timer ISR ───────► TimerTick::on_tick ─────────┘
//! ```
//!
//! # Reference material
//! * <https://www.burtonsys.com/ps2_chapweske.htm>
//! * <http://classiccomputers.info/down/IBM_PS2/documents/PS2_Hardware_Interface_Technical_Reference_May88.pdf>
//!     * PDF page 332

#![cfg_attr(not(test), no_std)]
#![forbid(missing_debug_implementations)]

pub mod bus;
pub mod device;
pub mod protocol;
pub mod timing;

pub use pc_keyboard;

pub use crate::bus::{
    io::{InterruptIO, LineIO, OpenDrainLines, Ps2IO, Ps2Pins},
    raw::{Drive, Lines},
};
pub use crate::protocol::{
    ClockEdge, Host, Ps2Port, TimerTick,
    buffer::ReceiveBuffer,
    state::ProtocolState,
};
pub use crate::timing::{Config, TimerClock, TimerSetting, Timing, TimingError};
