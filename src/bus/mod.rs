//! Access to the two PS/2 signal lines and to the interrupt sources
//! driving the protocol.

pub mod io;
pub mod lines;
pub mod raw;
