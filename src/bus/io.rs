use embedded_hal::digital::{InputPin, OutputPin};

use super::raw::{Drive, Lines};
use crate::timing::TimerSetting;

/// Direction and level control of the clock and data lines.
///
/// Called from interrupt context, so implementations must not block.
pub trait LineIO {
    fn drive(&mut self, lines: Lines, drive: Drive);

    // Sampling is `&mut self`, because reading a pin can touch
    // peripheral state.
    fn sample(&mut self) -> Lines;
}

/// Interrupt sources used by the protocol engine.
pub trait InterruptIO {
    /// Make the clock interrupt fire on falling edges.
    fn select_falling_edge(&mut self);

    /// Enabling must discard an edge which is already pending.
    fn clock_interrupt(&mut self, enabled: bool);

    /// Start the periodic timer. Restarting an already running timer
    /// must discard a pending tick.
    fn start_timer(&mut self, setting: TimerSetting);

    fn stop_timer(&mut self);
}

/// Everything a protocol handler touches.
///
/// The engine never stores an IO object. Each execution context (clock
/// edge interrupt, timer interrupt, foreground) passes its own on every
/// call, so an implementation should be a cheap handle that each context
/// can create for itself: a zero sized type writing the port and timer
/// registers directly, or a [`Ps2Pins`] built from pin handles owned by
/// that context. Sharing one instance between contexts would need a lock
/// the interrupt handlers can not take.
pub trait Ps2IO: LineIO + InterruptIO {}

impl<T: LineIO + InterruptIO> Ps2IO for T {}

/// Lines from one source, interrupt control from another.
///
/// Typically [`OpenDrainLines`] plus a platform handle for the pin change
/// interrupt and the timer.
#[derive(Debug)]
pub struct Ps2Pins<L, I> {
    pub lines: L,
    pub interrupts: I,
}

impl<L: LineIO, I: InterruptIO> Ps2Pins<L, I> {
    pub fn new(lines: L, interrupts: I) -> Self {
        Self { lines, interrupts }
    }
}

impl<L: LineIO, I> LineIO for Ps2Pins<L, I> {
    fn drive(&mut self, lines: Lines, drive: Drive) {
        self.lines.drive(lines, drive)
    }

    fn sample(&mut self) -> Lines {
        self.lines.sample()
    }
}

impl<L, I: InterruptIO> InterruptIO for Ps2Pins<L, I> {
    fn select_falling_edge(&mut self) {
        self.interrupts.select_falling_edge()
    }

    fn clock_interrupt(&mut self, enabled: bool) {
        self.interrupts.clock_interrupt(enabled)
    }

    fn start_timer(&mut self, setting: TimerSetting) {
        self.interrupts.start_timer(setting)
    }

    fn stop_timer(&mut self) {
        self.interrupts.stop_timer()
    }
}

/// `LineIO` for two open-drain `embedded-hal` pins with external pull-ups.
///
/// `Drive::High` and `Drive::Release` both let the line float. A pin
/// which fails to read samples as low, and failed writes are dropped:
/// the resulting bad frame is caught by the parity check or the watchdog.
#[derive(Debug)]
pub struct OpenDrainLines<C, D> {
    clock: C,
    data: D,
}

impl<C: InputPin + OutputPin, D: InputPin + OutputPin> OpenDrainLines<C, D> {
    pub fn new(clock: C, data: D) -> Self {
        Self { clock, data }
    }

    pub fn release(self) -> (C, D) {
        (self.clock, self.data)
    }
}

fn set_pin<P: OutputPin>(pin: &mut P, drive: Drive) -> Result<(), P::Error> {
    match drive {
        Drive::Low => pin.set_low(),
        Drive::Release | Drive::High => pin.set_high(),
    }
}

impl<C: InputPin + OutputPin, D: InputPin + OutputPin> LineIO for OpenDrainLines<C, D> {
    fn drive(&mut self, lines: Lines, drive: Drive) {
        if lines.contains(Lines::CLOCK) {
            let _ = set_pin(&mut self.clock, drive);
        }
        if lines.contains(Lines::DATA) {
            let _ = set_pin(&mut self.data, drive);
        }
    }

    fn sample(&mut self) -> Lines {
        let mut lines = Lines::empty();
        lines.set(Lines::CLOCK, self.clock.is_high().unwrap_or(false));
        lines.set(Lines::DATA, self.data.is_high().unwrap_or(false));
        lines
    }
}
