//! Target machine access.
//!
//! The YARC's memories and registers are reached by bit-banging shift
//! registers onto its bus, one byte transfer per clock pulse. That
//! sequencing is linear hardware code with no place in the core, so the
//! engine sees only this trait. Implementations own the address/data
//! register shadowing and whatever microcode setup a given access needs.

/// Byte-granular access to the YARC's registers, memories, microcode store,
/// and ALU lookup RAMs.
///
/// Memory, slice, and ALU accessors move a single byte per call. The engine
/// calls them from millisecond-bounded loops, so one call must stay well
/// under a millisecond; every implementation of the underlying bus cycle
/// already is.
pub trait YarcBus {
    /// Read the machine control register.
    fn mcr(&mut self) -> u8;

    /// Write the machine control register.
    fn set_mcr(&mut self, value: u8);

    /// Apply a clock-control byte. The effect on the running machine is
    /// asynchronous to the firmware's scheduler.
    fn clock_control(&mut self, value: u8);

    /// Pulse the system clock once and return the bus input register.
    fn single_clock(&mut self) -> u8;

    /// Read the bus input register without clocking.
    fn bus_input_register(&mut self) -> u8;

    /// Write all four control (K) register bytes, k3 first.
    fn write_control(&mut self, k: [u8; 4]);

    /// Take the YARC out of reset with the given clock setting and initial
    /// register values.
    fn run(&mut self, clock: u8, r0: u16, r1: u16, r2: u16);

    /// Stop the YARC and return control of the bus to the Nano.
    fn stop(&mut self);

    /// Write one byte of main memory.
    fn write_mem_byte(&mut self, addr: u16, value: u8);

    /// Read one byte of main memory.
    fn read_mem_byte(&mut self, addr: u16) -> u8;

    /// Write one byte of a microcode slice. The opcode already carries the
    /// high bit the microcode store expects.
    fn write_slice_byte(&mut self, opcode: u8, slice: u8, index: u8, value: u8);

    /// Read one byte of a microcode slice.
    fn read_slice_byte(&mut self, opcode: u8, slice: u8, index: u8) -> u8;

    /// Write one byte of ALU RAM. All three RAMs are written in parallel.
    fn write_alu_byte(&mut self, addr: u16, value: u8);

    /// Read one byte back from a single ALU RAM (`ram` is 0..=2).
    fn read_alu_byte(&mut self, ram: u8, addr: u16) -> u8;

    /// Dump the general registers and flags into the scratch region of main
    /// memory, where a following read streams them to the host.
    fn dump_registers(&mut self);

    /// Set the diagnostic display register.
    fn set_display(&mut self, value: u8);
}
