//! State shared between the interrupt handlers and the foreground.

use core::sync::atomic::{AtomicU8, Ordering};

use super::frame::Frame;

/// PS/2 protocol state.
///
/// The clock edge handler owns `Idle` (start bit) and the clocked-bit
/// states. The timer handler owns `Error`, `RequestingSend`,
/// `AwaitingIdle` and the watchdog on the clocked-bit states.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolState {
    Idle = 0,
    ReceivingData,
    ReceivingParity,
    ReceivingStop,
    RequestingSend,
    TransmittingData,
    TransmittingParity,
    TransmittingStop,
    AwaitingAck,
    AwaitingIdle,
    Error = 0xFF,
}

impl ProtocolState {
    fn from_raw(value: u8) -> Self {
        use ProtocolState::*;
        match value {
            0 => Idle,
            1 => ReceivingData,
            2 => ReceivingParity,
            3 => ReceivingStop,
            4 => RequestingSend,
            5 => TransmittingData,
            6 => TransmittingParity,
            7 => TransmittingStop,
            8 => AwaitingAck,
            9 => AwaitingIdle,
            _ => Error,
        }
    }

    /// States advanced by clock edges, and watched by the watchdog.
    pub fn is_clocked(self) -> bool {
        use ProtocolState::*;
        matches!(
            self,
            ReceivingData
                | ReceivingParity
                | ReceivingStop
                | TransmittingData
                | TransmittingParity
                | TransmittingStop
                | AwaitingAck
        )
    }
}

#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub const fn new() -> Self {
        StateCell(AtomicU8::new(ProtocolState::Idle as u8))
    }

    pub fn load(&self) -> ProtocolState {
        ProtocolState::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Unconditional write. Only for the foreground while no interrupt
    /// handler can act: reception disabled and timer stopped.
    pub fn force(&self, state: ProtocolState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move from `from` to `to`, unless another context changed the state
    /// since `from` was observed.
    ///
    /// Check and store are two accesses, not a compare-and-swap: AVR and
    /// ARMv6-M have no atomic read-modify-write. From the timer handler the
    /// pair can not be interleaved, because the edge handler never preempts
    /// it. The edge handler can be preempted between the two, but the only
    /// write the timer makes to a clocked state is the watchdog bark, which
    /// needs a whole bark limit of ticks without any edge. Should it land
    /// in that window anyway, recovery has already inhibited the bus and
    /// the watchdog fires again on the next bark limit.
    pub fn transition(&self, from: ProtocolState, to: ProtocolState) -> bool {
        if self.0.load(Ordering::Acquire) != from as u8 {
            return false;
        }
        self.0.store(to as u8, Ordering::Release);
        true
    }
}

/// In-flight frame, stored field by field.
///
/// Written by the edge handler while a frame is clocked and by the timer
/// handler when it starts a transmission. Ordering comes from the state
/// cell.
#[derive(Debug)]
pub(crate) struct FrameCell {
    shift: AtomicU8,
    remaining: AtomicU8,
    parity: AtomicU8,
}

impl FrameCell {
    pub const fn new() -> Self {
        Self {
            shift: AtomicU8::new(0),
            remaining: AtomicU8::new(0),
            parity: AtomicU8::new(0),
        }
    }

    pub fn load(&self) -> Frame {
        Frame {
            shift: self.shift.load(Ordering::Relaxed),
            remaining: self.remaining.load(Ordering::Relaxed),
            parity: self.parity.load(Ordering::Relaxed),
        }
    }

    pub fn store(&self, frame: Frame) {
        self.shift.store(frame.shift, Ordering::Relaxed);
        self.remaining.store(frame.remaining, Ordering::Relaxed);
        self.parity.store(frame.parity, Ordering::Relaxed);
    }
}
