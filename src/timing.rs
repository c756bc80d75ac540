//! Timer calibration.
//!
//! Every protocol delay is a duration in microseconds. They are turned
//! into timer settings once, from the timer input frequency, so nothing
//! frequency dependent is left in the protocol code.

use core::fmt;

/// A timer counting up from a preload value and interrupting on overflow.
#[derive(Debug, Copy, Clone)]
pub struct TimerClock {
    pub input_hz: u32,
    /// Available input dividers, smallest first.
    pub prescalers: &'static [u16],
    /// Highest counter value before overflow.
    pub counter_top: u16,
}

impl TimerClock {
    const AVR_TIMER0_PRESCALERS: &'static [u16] = &[1, 8, 64, 256, 1024];

    /// 8-bit timer/counter 0 of the ATmega8A and ATmega328P.
    pub const fn avr_timer0(cpu_hz: u32) -> Self {
        Self {
            input_hz: cpu_hz,
            prescalers: Self::AVR_TIMER0_PRESCALERS,
            counter_top: 0xFF,
        }
    }

    /// Setting for a timer period of `micros`, using the finest
    /// prescaler which can count that long.
    pub fn setting(&self, micros: u32) -> Result<TimerSetting, TimingError> {
        let span = u64::from(self.counter_top) + 1;

        for &prescaler in self.prescalers {
            let divider = u64::from(prescaler) * 1_000_000;
            let counts = (u64::from(self.input_hz) * u64::from(micros) + divider / 2) / divider;

            if counts >= 1 && counts <= span {
                return Ok(TimerSetting {
                    prescaler,
                    preload: (span - counts) as u16,
                });
            }
        }

        Err(TimingError::OutOfRange { micros })
    }
}

/// Values to load into the timer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimerSetting {
    pub prescaler: u16,
    /// Initial counter value. The timer overflows after
    /// `counter_top + 1 - preload` counts.
    pub preload: u16,
}

/// Protocol durations and watchdog limits.
#[derive(Debug, Copy, Clone)]
pub struct Config {
    /// How long clock is held low before data is pulled low. The PS/2
    /// protocol requires at least 100 µs.
    pub request_to_send_us: u32,
    /// Inhibit time between an error and reception being enabled again.
    pub recovery_us: u32,
    /// Watchdog tick period while a frame is being clocked.
    pub watchdog_tick_us: u32,
    /// Watchdog ticks allowed without a clock edge.
    pub bark_limit: u8,
    /// Poll period while waiting for the bus to go idle after an ACK.
    pub idle_poll_us: u32,
    /// Polls allowed before the bus must be idle.
    pub idle_wait_limit: u8,
}

impl Config {
    pub const MIN_REQUEST_TO_SEND_US: u32 = 100;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_to_send_us: 128,
            recovery_us: 1_000,
            watchdog_tick_us: 8_000,
            bark_limit: 20,
            idle_poll_us: 2,
            idle_wait_limit: 50,
        }
    }
}

/// Calibrated timer settings, computed once during initialization.
#[derive(Debug, Copy, Clone)]
pub struct Timing {
    pub request_to_send: TimerSetting,
    pub recovery: TimerSetting,
    pub watchdog: TimerSetting,
    pub idle_poll: TimerSetting,
    pub bark_limit: u8,
    pub idle_wait_limit: u8,
}

impl Timing {
    pub fn new(clock: &TimerClock, config: &Config) -> Result<Self, TimingError> {
        if config.request_to_send_us < Config::MIN_REQUEST_TO_SEND_US {
            return Err(TimingError::RequestTooShort {
                micros: config.request_to_send_us,
            });
        }

        if config.bark_limit == 0 || config.idle_wait_limit == 0 {
            return Err(TimingError::ZeroLimit);
        }

        Ok(Self {
            request_to_send: clock.setting(config.request_to_send_us)?,
            recovery: clock.setting(config.recovery_us)?,
            watchdog: clock.setting(config.watchdog_tick_us)?,
            idle_poll: clock.setting(config.idle_poll_us)?,
            bark_limit: config.bark_limit,
            idle_wait_limit: config.idle_wait_limit,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimingError {
    /// No prescaler can produce this period.
    OutOfRange { micros: u32 },
    RequestTooShort { micros: u32 },
    ZeroLimit,
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimingError::OutOfRange { micros } => {
                write!(f, "timer can not count {} us", micros)
            }
            TimingError::RequestTooShort { micros } => write!(
                f,
                "request-to-send hold of {} us is shorter than {} us",
                micros,
                Config::MIN_REQUEST_TO_SEND_US
            ),
            TimingError::ZeroLimit => write!(f, "watchdog limits must be non-zero"),
        }
    }
}
