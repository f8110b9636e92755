//! Serial protocol engine
//!
//! The host drives the Nano through a byte-oriented command protocol; this
//! module is the firmware end of it. Three layers:
//!
//! - transport: two ring buffers between the UART and everything else
//! - session: the connection state machine (unsynchronized / ready /
//!   desynchronizing) plus send/receive plumbing
//! - commands: the dispatch table and the handlers, including the chunked
//!   bulk transfers that resume across scheduler passes
//!
//! The engine never blocks. A handler either finishes in one call or
//! installs an in-progress transfer that the next passes resume until the
//! chunk is done.

mod buffer;
mod engine;
mod state;

pub use buffer::{CommandBuffer, BUF_MAX_DATA, BUF_SIZE};
pub use engine::SerialEngine;
pub use state::{ConnectionState, Transfer};
