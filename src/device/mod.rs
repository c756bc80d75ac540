//! Devices talking over a [`Ps2Port`](crate::protocol::Ps2Port).

pub mod keyboard;
pub mod mouse;
pub mod raw;
pub mod report;
pub mod serial;
