//! Session state for the host link.

/// Connection state of the host session.
///
/// Commands are dispatched only in `Ready`. A protocol error NAKs and passes
/// through `Desynchronizing` before the buffers are cleared, so the NAK has
/// a chance to reach the wire before the transmit ring is wiped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// No session. Only the sync command is accepted.
    Unsynchronized,
    /// Session established; the full command table is live.
    Ready,
    /// A NAK is queued; the next pass resets everything to `Unsynchronized`.
    Desynchronizing,
}

/// A bulk operation in flight, with its typed cursor.
///
/// At most one transfer is active at a time; while one is installed the
/// dispatcher is suppressed and each scheduler pass resumes the transfer
/// instead. Byte counts live in the command buffer; the cursor here is the
/// target-side position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transfer {
    /// Streaming a queued log message back to the host.
    Poll,
    /// Consuming a chunk from the host into main memory.
    WriteMem { addr: u16 },
    /// Streaming a chunk of main memory to the host. Also carries the
    /// debug dump, which reads the scratch region.
    ReadMem { addr: u16 },
    /// Consuming a chunk into one microcode slice.
    WriteSlice { opcode: u8, slice: u8, index: u8 },
    /// Streaming one microcode slice to the host.
    ReadSlice { opcode: u8, slice: u8, index: u8 },
    /// Consuming a chunk into the ALU RAMs (written in parallel).
    WriteAlu { addr: u16 },
    /// Streaming a chunk of one ALU RAM to the host.
    ReadAlu { ram: u8, addr: u16 },
}
