//! Line states used by the protocol.

use super::{
    io::LineIO,
    raw::{Drive, Lines},
};

/// Line/bus controller. Every state the protocol puts the two lines in
/// goes through one of these methods.
pub trait LineControl: LineIO {
    /// Both lines to input mode. The device may talk.
    fn release_lines(&mut self) {
        self.drive(Lines::CLOCK | Lines::DATA, Drive::Release);
    }

    /// Hold clock low. The device must not start a frame and aborts one
    /// that is in progress.
    fn inhibit(&mut self) {
        self.drive(Lines::CLOCK, Drive::Low);
        self.drive(Lines::DATA, Drive::Release);
    }

    /// Second half of the request-to-send handshake. Clock has been held
    /// low long enough; pull data low (start bit) and let clock go.
    fn request_to_send(&mut self) {
        self.drive(Lines::DATA, Drive::Low);
        self.drive(Lines::CLOCK, Drive::Release);
    }

    fn put_data_bit(&mut self, bit: bool) {
        self.drive(Lines::DATA, Drive::from_bit(bit));
    }

    fn data_high(&mut self) -> bool {
        self.sample().contains(Lines::DATA)
    }

    /// Both lines high.
    fn bus_idle(&mut self) -> bool {
        self.sample().contains(Lines::CLOCK | Lines::DATA)
    }
}

impl<T: LineIO> LineControl for T {}
