//! Board-agnostic core logic for the YARC Nano bus controller firmware
//!
//! This crate contains all firmware logic that does not depend on specific
//! hardware implementations:
//!
//! - The serial protocol engine (connection state machine, command dispatch,
//!   chunked in-progress transfers)
//! - Ring buffers for the host link
//! - The diagnostic log queue drained by the host's Poll command
//! - The cooperative task runner
//! - Hardware abstraction traits (target bus, serial port, clock, self-test)
//! - The numbered-fault path for internal invariant violations

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod fault;
pub mod logging;
pub mod ring;
pub mod scheduler;
pub mod serial;
pub mod traits;
