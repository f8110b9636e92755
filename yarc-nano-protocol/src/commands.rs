//! Command bytes and the fixed-length table.
//!
//! Every command occupies one byte in `0xE1..=0xFF`. The "fixed length" of a
//! command covers the command byte plus its fixed-size arguments; counted
//! payload (always one 64-byte chunk) is excluded. The dispatcher must not
//! invoke a handler until the full fixed length has been buffered, so this
//! table has to stay in lock step with the host client.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::wire::CHUNK_SIZE;

/// Command bytes start above this value. `CMD_BASE` itself is not a valid
/// command: its ACK would be an ordinary transmissible ASCII character.
pub const CMD_BASE: u8 = 0xE0;

pub const CMD_GET_MCR: u8 = 0xE1;
pub const CMD_RUN_COST: u8 = 0xE2;
pub const CMD_STOP_COST: u8 = 0xE3;
pub const CMD_CLOCK_CTL: u8 = 0xE4;
pub const CMD_WR_MEM: u8 = 0xE5;
pub const CMD_RD_MEM: u8 = 0xE6;
pub const CMD_RUN_YARC: u8 = 0xE7;
pub const CMD_STOP_YARC: u8 = 0xE8;
pub const CMD_POLL: u8 = 0xE9;
pub const CMD_DEBUG: u8 = 0xEB;
pub const CMD_GET_VER: u8 = 0xEE;
pub const CMD_SYNC: u8 = 0xEF;
pub const CMD_DO_CYCLE: u8 = 0xF4;
pub const CMD_GET_RESULT: u8 = 0xF5;
pub const CMD_WR_SLICE: u8 = 0xF6;
pub const CMD_RD_SLICE: u8 = 0xF7;
pub const CMD_SET_K: u8 = 0xFB;
pub const CMD_SET_MCR: u8 = 0xFC;
pub const CMD_WR_ALU: u8 = 0xFD;
pub const CMD_RD_ALU: u8 = 0xFE;

/// Whether a command carries a counted chunk, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Counted {
    /// Fixed bytes only.
    None,
    /// One chunk follows the fixed bytes, host to Nano.
    HostToNano,
    /// ACK and a count byte are followed by one chunk, Nano to host.
    NanoToHost,
}

/// The protocol command set.
///
/// Byte values left unassigned in `0xE1..=0xFF` (including the superseded
/// page-transfer and bus-register drafts at `0xF0..=0xF3` and `0xF8..=0xFA`)
/// are rejected with a NAK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Command {
    /// Read the machine control register.
    GetMcr,
    /// Start the continuous self-test.
    RunCost,
    /// Stop the continuous self-test.
    StopCost,
    /// Apply a clock-control byte; returns the MCR as it was beforehand.
    ClockCtl,
    /// Write one chunk of main memory: addr hi, addr lo, count.
    WrMem,
    /// Read one chunk of main memory: addr hi, addr lo, count.
    RdMem,
    /// Start the YARC: clock control byte plus initial r0, r1, r2.
    RunYarc,
    /// Stop the YARC.
    StopYarc,
    /// Drain one queued diagnostic message, if any.
    Poll,
    /// Debug escape: sub-code plus six reserved bytes.
    Debug,
    /// Report the protocol version.
    GetVer,
    /// Establish (or re-establish) a session.
    Sync,
    /// Pulse the clock once; returns the bus input register.
    DoCycle,
    /// Return the bus input register without clocking.
    GetResult,
    /// Write one microcode slice chunk: opcode, slice, count.
    WrSlice,
    /// Read one microcode slice chunk: opcode, slice, count.
    RdSlice,
    /// Write the four control (K) register bytes, k3 first.
    SetK,
    /// Set the machine control register.
    SetMcr,
    /// Write one chunk of ALU RAM: addr hi, addr lo, count.
    WrAlu,
    /// Read one chunk of ALU RAM: addr hi, addr lo, ram id, count.
    RdAlu,
}

impl Command {
    /// Decode a command byte. Returns `None` for anything that is not an
    /// assigned command value.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_GET_MCR => Some(Command::GetMcr),
            CMD_RUN_COST => Some(Command::RunCost),
            CMD_STOP_COST => Some(Command::StopCost),
            CMD_CLOCK_CTL => Some(Command::ClockCtl),
            CMD_WR_MEM => Some(Command::WrMem),
            CMD_RD_MEM => Some(Command::RdMem),
            CMD_RUN_YARC => Some(Command::RunYarc),
            CMD_STOP_YARC => Some(Command::StopYarc),
            CMD_POLL => Some(Command::Poll),
            CMD_DEBUG => Some(Command::Debug),
            CMD_GET_VER => Some(Command::GetVer),
            CMD_SYNC => Some(Command::Sync),
            CMD_DO_CYCLE => Some(Command::DoCycle),
            CMD_GET_RESULT => Some(Command::GetResult),
            CMD_WR_SLICE => Some(Command::WrSlice),
            CMD_RD_SLICE => Some(Command::RdSlice),
            CMD_SET_K => Some(Command::SetK),
            CMD_SET_MCR => Some(Command::SetMcr),
            CMD_WR_ALU => Some(Command::WrAlu),
            CMD_RD_ALU => Some(Command::RdAlu),
            _ => None,
        }
    }

    /// The wire value of this command.
    pub fn byte(self) -> u8 {
        match self {
            Command::GetMcr => CMD_GET_MCR,
            Command::RunCost => CMD_RUN_COST,
            Command::StopCost => CMD_STOP_COST,
            Command::ClockCtl => CMD_CLOCK_CTL,
            Command::WrMem => CMD_WR_MEM,
            Command::RdMem => CMD_RD_MEM,
            Command::RunYarc => CMD_RUN_YARC,
            Command::StopYarc => CMD_STOP_YARC,
            Command::Poll => CMD_POLL,
            Command::Debug => CMD_DEBUG,
            Command::GetVer => CMD_GET_VER,
            Command::Sync => CMD_SYNC,
            Command::DoCycle => CMD_DO_CYCLE,
            Command::GetResult => CMD_GET_RESULT,
            Command::WrSlice => CMD_WR_SLICE,
            Command::RdSlice => CMD_RD_SLICE,
            Command::SetK => CMD_SET_K,
            Command::SetMcr => CMD_SET_MCR,
            Command::WrAlu => CMD_WR_ALU,
            Command::RdAlu => CMD_RD_ALU,
        }
    }

    /// Fixed command length in bytes: the command byte plus fixed arguments,
    /// excluding any counted chunk.
    pub fn fixed_len(self) -> usize {
        match self {
            Command::GetMcr
            | Command::RunCost
            | Command::StopCost
            | Command::StopYarc
            | Command::Poll
            | Command::GetVer
            | Command::Sync
            | Command::DoCycle
            | Command::GetResult => 1,
            Command::ClockCtl | Command::SetMcr => 2,
            Command::WrMem | Command::RdMem | Command::WrSlice | Command::RdSlice => 4,
            Command::WrAlu => 4,
            Command::RdAlu | Command::SetK => 5,
            Command::RunYarc | Command::Debug => 8,
        }
    }

    /// Counted-chunk behavior of this command.
    pub fn counted(self) -> Counted {
        match self {
            Command::WrMem | Command::WrSlice | Command::WrAlu => Counted::HostToNano,
            Command::RdMem
            | Command::RdSlice
            | Command::RdAlu
            | Command::Poll
            | Command::Debug => Counted::NanoToHost,
            _ => Counted::None,
        }
    }

    /// Chunk size for counted transfers. Uniform across all bulk commands;
    /// the count argument on the wire must match it exactly.
    pub fn chunk_size(self) -> usize {
        CHUNK_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::is_command_byte;

    #[test]
    fn test_round_trip_all_commands() {
        for byte in 0xE1..=0xFFu8 {
            if let Some(cmd) = Command::from_byte(byte) {
                assert_eq!(cmd.byte(), byte);
            }
        }
    }

    #[test]
    fn test_unassigned_bytes_rejected() {
        for byte in [0xE0, 0xEA, 0xEC, 0xED, 0xF0, 0xF1, 0xF2, 0xF3, 0xF8, 0xF9, 0xFA, 0xFF] {
            assert_eq!(Command::from_byte(byte), None);
        }
    }

    #[test]
    fn test_non_command_range_rejected() {
        for byte in 0x00..=0xE0u8 {
            assert!(!is_command_byte(byte));
            assert_eq!(Command::from_byte(byte), None);
        }
    }

    #[test]
    fn test_fixed_lengths() {
        assert_eq!(Command::Sync.fixed_len(), 1);
        assert_eq!(Command::ClockCtl.fixed_len(), 2);
        assert_eq!(Command::WrMem.fixed_len(), 4);
        assert_eq!(Command::RdAlu.fixed_len(), 5);
        assert_eq!(Command::SetK.fixed_len(), 5);
        assert_eq!(Command::RunYarc.fixed_len(), 8);
        assert_eq!(Command::Debug.fixed_len(), 8);
    }

    #[test]
    fn test_counted_directions() {
        assert_eq!(Command::WrMem.counted(), Counted::HostToNano);
        assert_eq!(Command::RdMem.counted(), Counted::NanoToHost);
        assert_eq!(Command::Poll.counted(), Counted::NanoToHost);
        assert_eq!(Command::Sync.counted(), Counted::None);
        assert_eq!(Command::SetK.counted(), Counted::None);
    }
}
