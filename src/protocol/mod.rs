//! PS/2 protocol engine.
//!
//! [`Ps2Port`] holds all state. [`Ps2Port::split`] hands out one handle
//! per execution context, and each handle only has the operations its
//! context is allowed to perform:
//!
//! * [`ClockEdge`]: call from the clock falling edge interrupt.
//! * [`TimerTick`]: call from the timer interrupt.
//! * [`Host`]: foreground API.
//!
//! The timer interrupt must not be preempted by the clock edge interrupt.
//! The clock edge handler may be preempted by the timer, so it can
//! re-enable interrupts early.
//!
//! No locks are taken and no atomic read-modify-write is needed, so the
//! engine runs on AVR and ARMv6-M. Each shared variable has one writer per
//! protocol state, and state changes made from interrupt context are
//! conditional on the state the handler observed: a handler never
//! overwrites a state which moved on since it looked.

pub mod buffer;
pub mod edge;
pub mod frame;
pub mod host;
pub mod state;
pub mod watchdog;

use core::sync::atomic::AtomicU8;

use crate::bus::{io::Ps2IO, lines::LineControl};
use crate::timing::Timing;

use self::{
    buffer::ReceiveBuffer,
    state::{FrameCell, StateCell},
};

pub use self::{edge::ClockEdge, host::Host, watchdog::TimerTick};

#[derive(Debug)]
pub(crate) struct Shared<const N: usize> {
    state: StateCell,
    /// Edge handler while clocking, timer handler when starting a
    /// transmission.
    frame: FrameCell,
    /// Byte to transmit. Written by the foreground before it enters
    /// `RequestingSend`, read by the timer handler.
    pending: AtomicU8,
    /// Count of clock edges which advanced a frame. Edge handler only.
    progress: AtomicU8,
    rx: ReceiveBuffer<N>,
    timing: Timing,
}

/// PS/2 port with a receive buffer of `N` slots.
///
/// Keep it somewhere which outlives the interrupt handlers, for example
/// in a `static` initialised once during boot.
#[derive(Debug)]
pub struct Ps2Port<const N: usize> {
    shared: Shared<N>,
}

impl<const N: usize> Ps2Port<N> {
    pub fn new(timing: Timing) -> Self {
        Self {
            shared: Shared {
                state: StateCell::new(),
                frame: FrameCell::new(),
                pending: AtomicU8::new(0),
                progress: AtomicU8::new(0),
                rx: ReceiveBuffer::new(),
                timing,
            },
        }
    }

    pub fn split(&mut self) -> (Host<'_, N>, ClockEdge<'_, N>, TimerTick<'_, N>) {
        let shared = &self.shared;
        (Host::new(shared), ClockEdge::new(shared), TimerTick::new(shared))
    }
}

/// Stop listening, hold clock low and let the timer finish recovery
/// after the recovery delay.
fn begin_recovery<IO: Ps2IO>(io: &mut IO, timing: &Timing) {
    io.clock_interrupt(false);
    io.inhibit();
    io.start_timer(timing.recovery);
}
