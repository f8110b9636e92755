//! Wire-level constants: the ACK transform, error codes, and the bounds of
//! the target machine's address spaces.

use crate::commands::CMD_BASE;

/// Protocol version reported by GetVer. Bumped whenever the command table or
/// a response shape changes.
pub const PROTOCOL_VERSION: u8 = 8;

/// Bulk transfers move exactly this many bytes, aligned to this boundary.
pub const CHUNK_SIZE: usize = 64;

/// Main memory runs from 0 to this bound: 32K less 2K of I/O register space.
pub const MEM_END: u16 = 0x7800;

/// The debug dump deposits registers and flags in the 64 bytes here.
pub const SCRATCH_ADDR: u16 = 0x7700;

/// Each ALU RAM holds 8K.
pub const ALU_END: u16 = 0x2000;

/// Three ALU RAMs, written in parallel and read back one at a time.
pub const ALU_RAMS: u8 = 3;

/// Microcode slices per opcode.
pub const MICROCODE_SLICES: u8 = 4;

/// True if the byte is a command byte rather than argument or payload data.
pub fn is_command_byte(byte: u8) -> bool {
    byte > CMD_BASE
}

/// Positive acknowledgment for a command byte. The complement keeps ACKs out
/// of both the command range and the printable range, so the host can match
/// a response to the request it sent with one comparison.
pub fn ack(cmd: u8) -> u8 {
    !cmd
}

// NAK bytes. All fall in 0x80..=0x86, which no ACK can collide with
// (commands are 0xE1..=0xFF, so ACKs are 0x00..=0x1E).
pub const ERR_NOSYNC: u8 = 0x80;
pub const ERR_PASSIVE: u8 = 0x81;
pub const ERR_ONECLOCK: u8 = 0x82;
pub const ERR_CANT_SS: u8 = 0x83;
pub const ERR_CANT_PG: u8 = 0x84;
pub const ERR_INTERNAL: u8 = 0x85;
pub const ERR_BADCMD: u8 = 0x86;

/// True if the byte is one of the NAK error codes.
pub fn is_error_byte(byte: u8) -> bool {
    (ERR_NOSYNC..=ERR_BADCMD).contains(&byte)
}

/// Human-readable text for a NAK byte, for host-side diagnostics.
pub fn error_message(byte: u8) -> Option<&'static str> {
    match byte {
        ERR_NOSYNC => Some("not synchronized"),
        ERR_PASSIVE => Some("not allowed when passive"),
        ERR_ONECLOCK => Some("cannot enable multiple clocks"),
        ERR_CANT_SS => Some("cannot single step with clock enable"),
        ERR_CANT_PG => Some("invalid state for chunk transfer"),
        ERR_INTERNAL => Some("Nano reported an internal error"),
        ERR_BADCMD => Some("invalid command byte"),
        _ => None,
    }
}
