//! Clock edge handler: one step of the bit-level state machine per
//! falling clock edge.

use core::sync::atomic::Ordering;

use super::{begin_recovery, frame::Frame, state::ProtocolState, Shared};
use crate::bus::{io::Ps2IO, lines::LineControl, raw::FrameBits};

/// Handle for the clock falling edge interrupt.
#[derive(Debug)]
pub struct ClockEdge<'a, const N: usize> {
    shared: &'a Shared<N>,
}

impl<'a, const N: usize> ClockEdge<'a, N> {
    pub(super) fn new(shared: &'a Shared<N>) -> Self {
        Self { shared }
    }

    /// Call on every falling edge of the clock line.
    ///
    /// Data is sampled once, on entry. Receive shifts a bit in, transmit
    /// puts the next bit on the data line for the device to sample on
    /// the rising edge.
    pub fn on_falling_edge<IO: Ps2IO>(&mut self, io: &mut IO) {
        use ProtocolState::*;

        let data = io.data_high();
        let state = self.shared.state.load();

        match state {
            Idle => {
                if data == FrameBits::START {
                    self.shared.frame.store(Frame::receive());
                    if self.advance(Idle, ReceivingData) {
                        io.start_timer(self.shared.timing.watchdog);
                    }
                } else {
                    self.fail(Idle);
                }
            }
            ReceivingData => {
                let mut frame = self.shared.frame.load();
                let done = frame.receive_bit(data);
                self.shared.frame.store(frame);
                self.advance(ReceivingData, if done { ReceivingParity } else { ReceivingData });
            }
            ReceivingParity => {
                if self.shared.frame.load().parity_ok(data) {
                    self.advance(ReceivingParity, ReceivingStop);
                } else {
                    self.fail(ReceivingParity);
                }
            }
            ReceivingStop => {
                if data != FrameBits::STOP {
                    self.fail(ReceivingStop);
                } else if self.advance(ReceivingStop, Idle) {
                    self.shared.rx.push(self.shared.frame.load().byte());
                }
            }
            // Timer handler finishes the handshake.
            RequestingSend => (),
            TransmittingData => {
                let mut frame = self.shared.frame.load();
                let (bit, done) = frame.transmit_bit();
                io.put_data_bit(bit);
                self.shared.frame.store(frame);
                self.advance(TransmittingData, if done { TransmittingParity } else { TransmittingData });
            }
            TransmittingParity => {
                io.put_data_bit(self.shared.frame.load().parity_bit());
                self.advance(TransmittingParity, TransmittingStop);
            }
            TransmittingStop => {
                // Released data floats high: stop bit.
                io.release_lines();
                self.advance(TransmittingStop, AwaitingAck);
            }
            AwaitingAck => {
                if data == FrameBits::ACK {
                    if self.advance(AwaitingAck, AwaitingIdle) {
                        io.start_timer(self.shared.timing.idle_poll);
                    }
                } else {
                    self.fail(AwaitingAck);
                }
            }
            AwaitingIdle | Error => (),
        }

        if self.shared.state.load() == Error {
            begin_recovery(io, &self.shared.timing);
        }
    }

    /// Returns `false` if the timer handler changed the state meanwhile.
    fn advance(&self, from: ProtocolState, to: ProtocolState) -> bool {
        if from != to && !self.shared.state.transition(from, to) {
            return false;
        }

        let progress = self.shared.progress.load(Ordering::Relaxed);
        self.shared.progress.store(progress.wrapping_add(1), Ordering::Release);
        true
    }

    fn fail(&self, from: ProtocolState) {
        self.shared.state.transition(from, ProtocolState::Error);
    }
}
