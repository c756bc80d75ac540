//! Foreground API.

use core::sync::atomic::Ordering;

use log::{debug, trace};

use super::{state::ProtocolState, Shared};
use crate::bus::{io::Ps2IO, lines::LineControl};

/// Foreground handle: reception control, blocking send and the
/// receive buffer.
#[derive(Debug)]
pub struct Host<'a, const N: usize> {
    shared: &'a Shared<N>,
}

impl<'a, const N: usize> Host<'a, N> {
    pub(super) fn new(shared: &'a Shared<N>) -> Self {
        Self { shared }
    }

    /// Reset to `Idle` with an empty receive buffer. Reception stays
    /// disabled and the timer stopped.
    pub fn init<IO: Ps2IO>(&mut self, io: &mut IO) {
        io.stop_timer();
        self.enable_reception(io, false);
        self.shared.state.force(ProtocolState::Idle);
        self.shared.rx.clear();
        io.select_falling_edge();

        debug!("ps2: init, receive buffer holds {} bytes", self.shared.rx.capacity());
    }

    /// Enabling resets the state to `Idle`, so do not call it while a
    /// send is in progress.
    ///
    /// Disabling holds clock low, which stops the device from sending.
    pub fn enable_reception<IO: Ps2IO>(&mut self, io: &mut IO, enable: bool) {
        if enable {
            self.shared.state.force(ProtocolState::Idle);
            io.release_lines();
            io.clock_interrupt(true);
        } else {
            io.clock_interrupt(false);
            io.inhibit();
        }
    }

    /// `true` while a frame is being received or sent, or an error is
    /// being recovered from.
    pub fn busy(&self) -> bool {
        self.state() != ProtocolState::Idle
    }

    pub fn state(&self) -> ProtocolState {
        self.shared.state.load()
    }

    /// Send one byte, spinning until the bus is idle again.
    ///
    /// See [`Host::send_byte_with`].
    pub fn send_byte<IO: Ps2IO>(&mut self, io: &mut IO, byte: u8) {
        self.send_byte_with(io, byte, |_| core::hint::spin_loop())
    }

    /// Send one byte. `wait` is called with the observed state on every
    /// poll while the port is busy, before the send and until it is done.
    ///
    /// Returns once the state is back to `Idle`. A failed send (no
    /// clock, no ACK) also ends in `Idle` after recovery, so success is
    /// only visible from what the device answers. A send can not be
    /// cancelled; the watchdog bounds how long it takes.
    pub fn send_byte_with<IO: Ps2IO, F: FnMut(ProtocolState)>(
        &mut self,
        io: &mut IO,
        byte: u8,
        mut wait: F,
    ) {
        self.wait_idle(&mut wait);

        // First half of the request-to-send handshake: clock low.
        io.stop_timer();
        self.enable_reception(io, false);

        self.shared.pending.store(byte, Ordering::Relaxed);
        self.shared.state.force(ProtocolState::RequestingSend);
        io.start_timer(self.shared.timing.request_to_send);

        self.wait_idle(&mut wait);

        trace!("ps2: sent {:#04x}", byte);
    }

    fn wait_idle<F: FnMut(ProtocolState)>(&self, wait: &mut F) {
        loop {
            match self.state() {
                ProtocolState::Idle => break,
                state => wait(state),
            }
        }
    }

    pub fn available(&self) -> bool {
        self.shared.rx.available()
    }

    /// Oldest unread byte.
    pub fn getbyte(&mut self) -> Option<u8> {
        self.shared.rx.pop()
    }
}
