//! Hardware abstraction traits
//!
//! These traits define the interface between the core firmware logic and
//! hardware-specific implementations: the pin-level bus driver behind the
//! YARC, the UART to the host, the millisecond clock, and the continuous
//! self-test machinery.

pub mod bus;
pub mod io;
pub mod selftest;

pub use bus::YarcBus;
pub use io::{Millis, SerialPort};
pub use selftest::SelfTest;
