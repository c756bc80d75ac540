//! Simulated bus and PS/2 device.
//!
//! Time is kept in nanoseconds. One `Sim::step` is one clock period of the
//! device: the device acts (at most one falling clock edge), then time
//! advances by `STEP_NS`, firing the timer whenever its armed period
//! elapses.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use ps2_bitbang::{
    ClockEdge, Config, Drive, InterruptIO, LineIO, Lines, Ps2Port, TimerClock, TimerSetting,
    TimerTick, Timing,
};

pub const BUFFER: usize = 16;
pub const CPU_HZ: u32 = 16_000_000;
/// 12.5 kHz device clock.
pub const STEP_NS: u64 = 80_000;

pub fn clock() -> TimerClock {
    TimerClock::avr_timer0(CPU_HZ)
}

pub fn timing() -> Timing {
    Timing::new(&clock(), &Config::default()).unwrap()
}

pub fn port() -> Ps2Port<BUFFER> {
    Ps2Port::new(timing())
}

/// Time between two ticks of a timer started with `setting`.
pub fn period_ns(setting: TimerSetting) -> u64 {
    let clock = clock();
    let counts = u64::from(clock.counter_top) + 1 - u64::from(setting.preload);
    counts * u64::from(setting.prescaler) * 1_000_000_000 / u64::from(clock.input_hz)
}

#[derive(Debug)]
pub struct Wire {
    pub now_ns: u64,
    pub host_clock: Drive,
    pub host_data: Drive,
    pub device_data_low: bool,
    pub clock_interrupt: bool,
    pub falling_edge_selected: bool,
    pub timer: Option<TimerSetting>,
    pub timer_due_ns: u64,
    inhibit_since: Option<u64>,
    /// How long each finished inhibit held clock low.
    pub inhibit_spans_ns: Vec<u64>,
}

impl Default for Wire {
    fn default() -> Self {
        Self {
            now_ns: 0,
            host_clock: Drive::Release,
            host_data: Drive::Release,
            device_data_low: false,
            clock_interrupt: false,
            falling_edge_selected: false,
            timer: None,
            timer_due_ns: 0,
            inhibit_since: None,
            inhibit_spans_ns: Vec::new(),
        }
    }
}

/// Every clone sees the same wire.
#[derive(Debug, Clone, Default)]
pub struct SimBus(Rc<RefCell<Wire>>);

impl SimBus {
    pub fn wire(&self) -> std::cell::Ref<'_, Wire> {
        self.0.borrow()
    }

    pub fn now_ns(&self) -> u64 {
        self.0.borrow().now_ns
    }

    pub fn timer_armed(&self) -> bool {
        self.0.borrow().timer.is_some()
    }

    pub fn clock_interrupt_enabled(&self) -> bool {
        self.0.borrow().clock_interrupt
    }

    pub fn host_inhibits(&self) -> bool {
        self.0.borrow().host_clock == Drive::Low
    }

    /// Host released clock and pulled data low.
    pub fn host_requests_to_send(&self) -> bool {
        let wire = self.0.borrow();
        wire.host_clock != Drive::Low && wire.host_data == Drive::Low
    }

    pub fn data_high(&self) -> bool {
        let wire = self.0.borrow();
        wire.host_data != Drive::Low && !wire.device_data_low
    }

    pub fn device_data(&self, high: bool) {
        self.0.borrow_mut().device_data_low = !high;
    }

    pub fn take_inhibit_spans(&self) -> Vec<u64> {
        std::mem::take(&mut self.0.borrow_mut().inhibit_spans_ns)
    }
}

impl LineIO for SimBus {
    fn drive(&mut self, lines: Lines, drive: Drive) {
        let mut wire = self.0.borrow_mut();
        if lines.contains(Lines::CLOCK) {
            let now = wire.now_ns;
            match (wire.inhibit_since, drive) {
                (None, Drive::Low) => wire.inhibit_since = Some(now),
                (Some(since), Drive::Release) | (Some(since), Drive::High) => {
                    wire.inhibit_since = None;
                    wire.inhibit_spans_ns.push(now - since);
                }
                _ => (),
            }
            wire.host_clock = drive;
        }
        if lines.contains(Lines::DATA) {
            wire.host_data = drive;
        }
    }

    fn sample(&mut self) -> Lines {
        let wire = self.0.borrow();
        let mut lines = Lines::empty();
        // The device only holds clock low in the middle of a bit, never
        // while the host looks.
        lines.set(Lines::CLOCK, wire.host_clock != Drive::Low);
        lines.set(Lines::DATA, wire.host_data != Drive::Low && !wire.device_data_low);
        lines
    }
}

impl InterruptIO for SimBus {
    fn select_falling_edge(&mut self) {
        self.0.borrow_mut().falling_edge_selected = true;
    }

    fn clock_interrupt(&mut self, enabled: bool) {
        self.0.borrow_mut().clock_interrupt = enabled;
    }

    fn start_timer(&mut self, setting: TimerSetting) {
        let mut wire = self.0.borrow_mut();
        wire.timer = Some(setting);
        wire.timer_due_ns = wire.now_ns + period_ns(setting);
    }

    fn stop_timer(&mut self) {
        self.0.borrow_mut().timer = None;
    }
}

/// 11-bit device-to-host frame.
pub fn frame_bits(byte: u8, good_parity: bool) -> Vec<bool> {
    let mut bits = vec![false];
    bits.extend((0..8).map(|i| byte & (1 << i) != 0));
    let odd = byte.count_ones() % 2 == 0;
    bits.push(if good_parity { odd } else { !odd });
    bits.push(true);
    bits
}

#[derive(Debug)]
pub enum Phase {
    Idle,
    Sending { bits: Vec<bool>, next: usize },
    Receiving { bits: Vec<bool> },
    Acknowledging { bits: Vec<bool> },
    /// Data held low for the ACK until `at_ns`.
    ReleasingAck { bits: Vec<bool>, at_ns: u64 },
}

/// Bit-level model of a PS/2 mouse.
#[derive(Debug)]
pub struct SimDevice {
    pub phase: Phase,
    pub outgoing: VecDeque<u8>,
    /// Bytes the host sent, in order, with good framing.
    pub received: Vec<u8>,
    /// Frames from the host with bad parity or stop bit.
    pub bad_frames: usize,
    /// Own frames cut short because the host inhibited the bus.
    pub aborted_frames: usize,
    /// Never clocks or answers.
    pub unresponsive: bool,
    /// Clocks in host frames but never pulls data low for the ACK.
    pub no_ack: bool,
    /// How long data stays low after the ACK edge.
    pub ack_hold_ns: u64,
    /// Sends the next frame with wrong parity.
    pub corrupt_next: bool,
    /// Answers every command with 0xFC.
    pub error_replies: bool,
    pub id: u8,
    pub sample_rates: VecDeque<u8>,
    pub awaiting_argument: Option<u8>,
    pub answer_reset_with: Vec<u8>,
}

impl Default for SimDevice {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            outgoing: VecDeque::new(),
            received: Vec::new(),
            bad_frames: 0,
            aborted_frames: 0,
            unresponsive: false,
            no_ack: false,
            ack_hold_ns: STEP_NS / 2,
            corrupt_next: false,
            error_replies: false,
            id: 0x00,
            sample_rates: VecDeque::new(),
            awaiting_argument: None,
            answer_reset_with: vec![0xFA, 0xAA, 0x00],
        }
    }
}

impl SimDevice {
    pub fn wheel() -> Self {
        Self {
            id: 0x03,
            ..Self::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle) && self.outgoing.is_empty()
    }

    fn command(&mut self, byte: u8) {
        self.received.push(byte);

        if self.error_replies {
            self.outgoing.push_back(0xFC);
            return;
        }

        if let Some(command) = self.awaiting_argument.take() {
            if command == 0xF3 {
                self.sample_rates.push_back(byte);
                if self.sample_rates.len() > 3 {
                    self.sample_rates.pop_front();
                }
            }
            self.outgoing.push_back(0xFA);
            return;
        }

        match byte {
            0xFF => {
                self.outgoing.clear();
                self.sample_rates.clear();
                let answer = self.answer_reset_with.clone();
                self.outgoing.extend(answer);
            }
            0xF3 | 0xE8 => {
                self.awaiting_argument = Some(byte);
                self.outgoing.push_back(0xFA);
            }
            0xF2 => {
                let knocked = self.sample_rates.iter().copied().eq([200, 100, 80].iter().copied());
                let id = if knocked { self.id } else { 0x00 };
                self.outgoing.extend([0xFA, id].iter().copied());
            }
            0xE9 => self.outgoing.extend([0xFA, 0x09, 0x02, 0x64].iter().copied()),
            _ => self.outgoing.push_back(0xFA),
        }
    }
}

fn byte_from_bits(bits: &[bool]) -> Option<u8> {
    if bits.len() != 10 || !bits[9] {
        return None;
    }
    let byte = bits[..8]
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << i));
    let ones = byte.count_ones() + bits[8] as u32;
    if ones % 2 == 1 {
        Some(byte)
    } else {
        None
    }
}

/// Interrupt side of the port plus the simulated device.
#[derive(Debug)]
pub struct Sim<'a> {
    pub edge: ClockEdge<'a, BUFFER>,
    pub tick: TimerTick<'a, BUFFER>,
    pub bus: SimBus,
    pub device: SimDevice,
    pub steps: usize,
    pub ticks: usize,
    pub edges: usize,
}

impl<'a> Sim<'a> {
    pub fn new(
        edge: ClockEdge<'a, BUFFER>,
        tick: TimerTick<'a, BUFFER>,
        bus: SimBus,
        device: SimDevice,
    ) -> Self {
        Self {
            edge,
            tick,
            bus,
            device,
            steps: 0,
            ticks: 0,
            edges: 0,
        }
    }

    pub fn step(&mut self) {
        self.steps += 1;
        self.device_step();
        self.advance(STEP_NS);
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Let `ns` pass: the ACK release and timer ticks happen when due,
    /// the ACK release first.
    pub fn advance(&mut self, ns: u64) {
        let end = self.bus.now_ns() + ns;

        loop {
            let ack_due = match self.device.phase {
                Phase::ReleasingAck { at_ns, .. } if at_ns <= end => Some(at_ns),
                _ => None,
            };
            let timer_due = {
                let wire = self.bus.wire();
                match wire.timer {
                    Some(_) if wire.timer_due_ns <= end => Some(wire.timer_due_ns),
                    _ => None,
                }
            };

            match (ack_due, timer_due) {
                (Some(ack), Some(timer)) if ack <= timer => self.release_ack(ack),
                (Some(ack), None) => self.release_ack(ack),
                (_, Some(_)) => self.timer_tick(),
                (None, None) => break,
            }
        }

        self.bus.0.borrow_mut().now_ns = end;
    }

    /// Wait for the next timer tick and run the handler.
    pub fn timer_tick(&mut self) {
        let (setting, due) = {
            let wire = self.bus.wire();
            match wire.timer {
                Some(setting) => (setting, wire.timer_due_ns),
                None => return,
            }
        };

        {
            let mut wire = self.bus.0.borrow_mut();
            wire.now_ns = wire.now_ns.max(due);
        }

        self.ticks += 1;
        self.tick.on_tick(&mut self.bus);

        // Periodic unless the handler stopped or restarted it.
        let mut wire = self.bus.0.borrow_mut();
        if wire.timer.is_some() && wire.timer_due_ns == due {
            wire.timer_due_ns = due + period_ns(setting);
        }
    }

    /// Falling clock edge, seen by the host only if the interrupt is on.
    pub fn falling_edge(&mut self) {
        self.edges += 1;
        if self.bus.clock_interrupt_enabled() {
            self.edge.on_falling_edge(&mut self.bus);
        }
    }

    /// Clock out raw bits as the device, one edge each.
    pub fn clock_out(&mut self, bits: &[bool]) {
        for &bit in bits {
            self.bus.device_data(bit);
            self.falling_edge();
        }
        self.bus.device_data(true);
    }

    fn release_ack(&mut self, at_ns: u64) {
        self.bus.0.borrow_mut().now_ns = at_ns;
        self.bus.device_data(true);

        if let Phase::ReleasingAck { bits, .. } = std::mem::replace(&mut self.device.phase, Phase::Idle) {
            match byte_from_bits(&bits) {
                Some(byte) => self.device.command(byte),
                None => {
                    self.device.bad_frames += 1;
                    self.device.outgoing.push_back(0xFE);
                }
            }
        }
    }

    fn device_step(&mut self) {
        if self.device.unresponsive {
            return;
        }

        let phase = std::mem::replace(&mut self.device.phase, Phase::Idle);
        self.device.phase = match phase {
            Phase::Idle => {
                if self.bus.host_inhibits() {
                    Phase::Idle
                } else if self.bus.host_requests_to_send() {
                    self.falling_edge();
                    Phase::Receiving {
                        bits: vec![self.bus.data_high()],
                    }
                } else if let Some(&byte) = self.device.outgoing.front() {
                    let good = !std::mem::replace(&mut self.device.corrupt_next, false);
                    self.send_bit(frame_bits(byte, good), 0)
                } else {
                    Phase::Idle
                }
            }
            Phase::Sending { bits, next } => {
                if self.bus.host_inhibits() {
                    // Aborted, the byte stays queued and is sent again.
                    self.bus.device_data(true);
                    self.device.aborted_frames += 1;
                    Phase::Idle
                } else {
                    self.send_bit(bits, next)
                }
            }
            Phase::Receiving { mut bits } => {
                self.falling_edge();
                bits.push(self.bus.data_high());
                if bits.len() == 10 {
                    Phase::Acknowledging { bits }
                } else {
                    Phase::Receiving { bits }
                }
            }
            Phase::Acknowledging { bits } => {
                if !self.device.no_ack {
                    self.bus.device_data(false);
                }
                self.falling_edge();
                Phase::ReleasingAck {
                    bits,
                    at_ns: self.bus.now_ns() + self.device.ack_hold_ns,
                }
            }
            waiting @ Phase::ReleasingAck { .. } => waiting,
        };
    }

    fn send_bit(&mut self, bits: Vec<bool>, next: usize) -> Phase {
        self.bus.device_data(bits[next]);
        self.falling_edge();

        if next + 1 == bits.len() {
            self.bus.device_data(true);
            self.device.outgoing.pop_front();
            Phase::Idle
        } else {
            Phase::Sending { bits, next: next + 1 }
        }
    }
}

/// Delay which runs the simulation, one step per device clock period.
#[derive(Debug)]
pub struct SimDelay<'a> {
    pub sim: Sim<'a>,
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        let steps = (u64::from(ns) / STEP_NS).max(1);
        self.sim.run(steps as usize);
    }
}
