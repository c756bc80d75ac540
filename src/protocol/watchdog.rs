//! Timer handler: request-to-send handshake, watchdog and error recovery.
//!
//! Everything which is not triggered by a clock edge happens here.

use core::sync::atomic::Ordering;

use super::{begin_recovery, frame::Frame, state::ProtocolState, Shared};
use crate::bus::{io::Ps2IO, lines::LineControl};
use crate::timing::Timing;

/// Countdowns owned by the timer handler.
///
/// Both are reloaded whenever the edge handler made progress since the
/// previous tick, so `bark` bounds the ticks between two clock edges.
#[derive(Debug)]
pub struct WatchdogCounters {
    bark: u8,
    idle_wait: u8,
    seen_progress: u8,
}

impl WatchdogCounters {
    fn new(timing: &Timing) -> Self {
        Self {
            bark: timing.bark_limit,
            idle_wait: timing.idle_wait_limit,
            seen_progress: 0,
        }
    }

    fn reload(&mut self, timing: &Timing, progress: u8) {
        self.bark = timing.bark_limit;
        self.idle_wait = timing.idle_wait_limit;
        self.seen_progress = progress;
    }
}

/// Counts one tick. `true` when the counter had already run out.
fn count_down(counter: &mut u8) -> bool {
    match counter.checked_sub(1) {
        Some(value) => {
            *counter = value;
            false
        }
        None => true,
    }
}

/// Handle for the timer interrupt.
#[derive(Debug)]
pub struct TimerTick<'a, const N: usize> {
    shared: &'a Shared<N>,
    watchdog: WatchdogCounters,
}

impl<'a, const N: usize> TimerTick<'a, N> {
    pub(super) fn new(shared: &'a Shared<N>) -> Self {
        Self {
            shared,
            watchdog: WatchdogCounters::new(&shared.timing),
        }
    }

    /// Call from the timer interrupt.
    pub fn on_tick<IO: Ps2IO>(&mut self, io: &mut IO) {
        use ProtocolState::*;

        let shared = self.shared;
        let timing = &shared.timing;
        let state = shared.state.load();
        let progress = shared.progress.load(Ordering::Acquire);

        if progress != self.watchdog.seen_progress {
            self.watchdog.reload(timing, progress);
        }

        match state {
            Idle => {
                // Frame finished since the timer was armed.
                io.stop_timer();
                self.watchdog.reload(timing, progress);
            }
            Error => self.recover(io),
            RequestingSend => self.finish_request_to_send(io, progress),
            AwaitingIdle => {
                if io.bus_idle() {
                    if shared.state.transition(AwaitingIdle, Idle) {
                        io.stop_timer();
                    }
                } else if count_down(&mut self.watchdog.idle_wait) {
                    self.fail(AwaitingIdle, io);
                }
            }
            clocked => {
                debug_assert!(clocked.is_clocked());
                // No clock edge for too long: device gone or not a PS/2 device.
                if count_down(&mut self.watchdog.bark) {
                    self.fail(clocked, io);
                }
            }
        }
    }

    /// Clock has been held low for the request-to-send delay.
    fn finish_request_to_send<IO: Ps2IO>(&mut self, io: &mut IO, progress: u8) {
        let shared = self.shared;
        self.watchdog.reload(&shared.timing, progress);

        let byte = shared.pending.load(Ordering::Relaxed);
        shared.frame.store(Frame::transmit(byte));

        io.request_to_send();
        io.start_timer(shared.timing.watchdog);

        if shared
            .state
            .transition(ProtocolState::RequestingSend, ProtocolState::TransmittingData)
        {
            io.clock_interrupt(true);
        }
    }

    /// Recovery delay is over. This is the only way out of `Error`.
    fn recover<IO: Ps2IO>(&mut self, io: &mut IO) {
        io.stop_timer();
        self.shared.state.transition(ProtocolState::Error, ProtocolState::Idle);
        io.release_lines();
        io.clock_interrupt(true);
        let progress = self.shared.progress.load(Ordering::Acquire);
        self.watchdog.reload(&self.shared.timing, progress);
    }

    fn fail<IO: Ps2IO>(&mut self, from: ProtocolState, io: &mut IO) {
        if self.shared.state.transition(from, ProtocolState::Error) {
            begin_recovery(io, &self.shared.timing);
        }
    }
}
