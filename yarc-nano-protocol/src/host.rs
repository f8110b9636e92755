//! Host-side request framing.
//!
//! Mirrors the shapes the host client sends down the wire: every command is
//! a fixed part (command byte plus fixed arguments, at most 8 bytes), after
//! which the Nano ACKs or NAKs. Counted sends stuff the chunk down the pipe
//! after the ACK-able fixed part; counted receives get a count byte as the
//! sole fixed response, then that many data bytes.

use heapless::Vec;

use crate::commands::{Command, Counted};
use crate::wire::ack;

/// Longest fixed request on the wire.
pub const MAX_FIXED: usize = 8;

/// Errors building a request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Argument count does not match the command's fixed length.
    ArgLength,
    /// Payload is not exactly one chunk, or the command takes no payload.
    PayloadLength,
}

/// Encode the fixed part of a command: the command byte followed by `args`,
/// whose length must match the command's fixed length exactly.
pub fn fixed_request(cmd: Command, args: &[u8]) -> Result<Vec<u8, MAX_FIXED>, FrameError> {
    if args.len() + 1 != cmd.fixed_len() {
        return Err(FrameError::ArgLength);
    }
    let mut frame = Vec::new();
    // Lengths are checked above; MAX_FIXED covers every command.
    let _ = frame.push(cmd.byte());
    let _ = frame.extend_from_slice(args);
    Ok(frame)
}

/// Validate the counted payload for a host-to-Nano bulk command.
pub fn counted_payload(cmd: Command, payload: &[u8]) -> Result<(), FrameError> {
    if cmd.counted() != Counted::HostToNano || payload.len() != cmd.chunk_size() {
        return Err(FrameError::PayloadLength);
    }
    Ok(())
}

/// The ACK byte the Nano is expected to answer with.
pub fn expected_ack(cmd: Command) -> u8 {
    ack(cmd.byte())
}
