//! Host serial protocol for the YARC Nano bus controller
//!
//! This crate defines the byte-oriented protocol spoken between the host
//! computer and the Nano over the 115200-baud serial link. It is the single
//! source of truth for command byte values, fixed command lengths, the
//! ACK/NAK transform, error codes, and the target machine's address-space
//! bounds; both the firmware engine and host-side clients build against it.
//!
//! # Protocol Overview
//!
//! Framing is implicit in the byte values: every byte above [`CMD_BASE`]
//! (`0xE0`) is a command byte, so a single comparison separates "command"
//! from "still mid-argument". Messages look like:
//!
//! ```text
//! ┌─────────┬──────────────┬───────────────────┐
//! │ COMMAND │ FIXED ARGS   │ COUNTED DATA      │
//! │ 1B      │ 0-7B         │ 0 or 64B          │
//! └─────────┴──────────────┴───────────────────┘
//! ```
//!
//! The Nano answers with `ACK(cmd)` (the command byte complemented) or a
//! single NAK byte from the `0x80..=0x86` error range, followed by at most
//! one fixed result byte and, for counted reads, the counted data. Bulk
//! transfers always move exactly one 64-byte chunk.

#![no_std]
#![deny(unsafe_code)]

pub mod commands;
pub mod host;
pub mod wire;

pub use commands::{Command, Counted, CMD_BASE};
pub use wire::{ack, is_command_byte, CHUNK_SIZE, PROTOCOL_VERSION};
