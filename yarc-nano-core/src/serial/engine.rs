//! The serial protocol engine.
//!
//! One instance exists per device, constructed at boot and serviced by the
//! scheduler on every pass with no delay. Each pass: drain as much of the
//! transmit ring as the UART will take, fill the receive ring from whatever
//! has arrived, then either resume the in-progress transfer or feed the
//! dispatcher - never both.
//!
//! Handlers may assume their entire fixed command is buffered and that an
//! ACK/NAK plus one result byte will not block; the dispatcher defers,
//! consuming nothing, until both hold. When an error occurs the host
//! responds by ending the session, so there is no need to consume the rest
//! of a half-received command after a NAK.

use yarc_nano_protocol::commands::{self, Command};
use yarc_nano_protocol::wire::{
    ack, is_command_byte, ALU_END, ALU_RAMS, CHUNK_SIZE, ERR_BADCMD, MEM_END, MICROCODE_SLICES,
    PROTOCOL_VERSION, SCRATCH_ADDR,
};

use crate::fault::{fault, Fault};
use crate::logging::LogQueue;
use crate::ring::RingBuffer;
use crate::traits::{Millis, SelfTest, SerialPort, YarcBus};

use super::buffer::{CommandBuffer, BUF_MAX_DATA};
use super::state::{ConnectionState, Transfer};

/// Room the dispatcher reserves before invoking any handler: an ACK or NAK
/// plus at most one fixed result byte.
const MAX_FIXED_RESPONSE: usize = 2;

// Display register codes for session transitions.
const DISPLAY_READY: u8 = 0xC2;
const DISPLAY_UNSYNC: u8 = 0xCF;

/// The serial command-and-transfer engine.
///
/// Owns the two ring buffers, the connection state, the in-progress
/// transfer, and the shared command buffer. Collaborators (UART, target
/// bus, self-test, log queue, clock) are passed in per service call so the
/// engine itself stays board-agnostic.
#[derive(Debug)]
pub struct SerialEngine {
    rx: RingBuffer,
    tx: RingBuffer,
    state: ConnectionState,
    transfer: Option<Transfer>,
    buffer: CommandBuffer,
}

impl SerialEngine {
    /// Create an engine in the unsynchronized state.
    pub const fn new() -> Self {
        Self {
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            state: ConnectionState::Unsynchronized,
            transfer: None,
            buffer: CommandBuffer::new(),
        }
    }

    /// Current session state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True while a bulk transfer is being serviced across passes.
    pub fn transfer_in_progress(&self) -> bool {
        self.transfer.is_some()
    }

    /// Hardware-reset notification: drop the session and all buffered data.
    /// Any partially-completed transfer is abandoned, leaving target state
    /// as far as it had been written.
    pub fn reset(&mut self) {
        self.rx.clear();
        self.tx.clear();
        self.transfer = None;
        self.buffer.release_if_held();
        self.state = ConnectionState::Unsynchronized;
    }

    /// One scheduler pass. Returns quickly; bulk work is bounded by ring
    /// space and by the millisecond clock.
    pub fn service<P, Y, T, C>(
        &mut self,
        port: &mut P,
        yarc: &mut Y,
        cost: &mut T,
        log: &mut LogQueue,
        clock: &C,
    ) where
        P: SerialPort,
        Y: YarcBus,
        T: SelfTest,
        C: Millis,
    {
        while !self.tx.is_empty() && port.can_write() {
            port.write(self.tx.peek());
            self.tx.consume(1);
        }

        while !self.rx.is_full() {
            match port.read() {
                Some(byte) => self.rx.put(byte),
                None => break,
            }
        }

        // Phase two of an error reset: the NAK above has had its chance to
        // reach the wire, so clear everything and wait for a new session.
        if self.state == ConnectionState::Desynchronizing {
            self.enter_unsync(yarc);
            self.state = ConnectionState::Unsynchronized;
            return;
        }

        if self.transfer.is_some() {
            self.resume(yarc, clock);
            return;
        }

        if !self.rx.is_empty() {
            let byte = self.rx.peek();
            self.process(byte, yarc, cost, log, clock);
        }
    }

    // === session plumbing ===

    fn send_ack(&mut self, cmd: u8) {
        if !is_command_byte(cmd) {
            fault(Fault::AckNotCommand);
        }
        self.tx.put(ack(cmd));
    }

    fn send_nak(&mut self) {
        self.tx.put(ERR_BADCMD);
    }

    /// Reset both rings and the transfer machinery and drop to
    /// `Unsynchronized`. Cancels any pending output, NAKs included; the
    /// desynchronizing state exists so this runs one pass after the NAK was
    /// queued.
    fn enter_unsync<Y: YarcBus>(&mut self, yarc: &mut Y) {
        self.rx.clear();
        self.tx.clear();
        self.transfer = None;
        self.buffer.release_if_held();
        yarc.set_display(DISPLAY_UNSYNC);
    }

    /// A bad command byte was processed: not a command value, unassigned, or
    /// a command outside the session state that allows it. Queue one NAK and
    /// leave the byte unconsumed; the next pass lands in
    /// [`ConnectionState::Desynchronizing`] and performs the full reset.
    fn bad_command(&mut self) -> ConnectionState {
        if self.tx.is_full() {
            // An error and no way to report it.
            fault(Fault::NakWouldBlock);
        }
        self.send_nak();
        ConnectionState::Desynchronizing
    }

    /// Validation failure in a handler: NAK now, reset next pass.
    fn reject(&mut self) -> ConnectionState {
        self.send_nak();
        ConnectionState::Desynchronizing
    }

    /// There is at least one byte waiting in the receive ring and no
    /// transfer in progress. May consume zero or more bytes.
    fn process<Y, T, C>(&mut self, byte: u8, yarc: &mut Y, cost: &mut T, log: &mut LogQueue, clock: &C)
    where
        Y: YarcBus,
        T: SelfTest,
        C: Millis,
    {
        self.state = match self.state {
            // service() completes the error reset before calling here.
            ConnectionState::Desynchronizing => self.state,
            ConnectionState::Unsynchronized => {
                if byte == commands::CMD_SYNC {
                    self.handle_sync(byte, yarc)
                } else {
                    self.bad_command()
                }
            }
            ConnectionState::Ready => self.dispatch(byte, yarc, cost, log, clock),
        };
    }

    fn handle_sync<Y: YarcBus>(&mut self, byte: u8, yarc: &mut Y) -> ConnectionState {
        if self.tx.is_full() {
            return self.state;
        }
        self.rx.consume(1);
        self.send_ack(byte);
        yarc.set_display(DISPLAY_READY);
        ConnectionState::Ready
    }

    // === command dispatch ===

    fn dispatch<Y, T, C>(&mut self, byte: u8, yarc: &mut Y, cost: &mut T, log: &mut LogQueue, clock: &C) -> ConnectionState
    where
        Y: YarcBus,
        T: SelfTest,
        C: Millis,
    {
        let Some(cmd) = Command::from_byte(byte) else {
            return self.bad_command();
        };

        // Defer, consuming nothing, until the whole fixed command has been
        // buffered and the fixed response cannot block.
        let n = cmd.fixed_len();
        if self.rx.len() < n || self.tx.available() < MAX_FIXED_RESPONSE {
            return self.state;
        }

        let mut fixed = [0u8; 8];
        self.rx.copy_to(&mut fixed[..n]);
        self.rx.consume(n);

        match cmd {
            Command::GetMcr => {
                self.send_ack(byte);
                let value = yarc.mcr();
                self.tx.put(value);
                self.state
            }
            Command::RunCost => {
                cost.start();
                self.send_ack(byte);
                self.state
            }
            Command::StopCost => {
                cost.stop();
                self.send_ack(byte);
                self.state
            }
            Command::ClockCtl => {
                // The clock change takes effect asynchronously, so the value
                // returned is the MCR as it was before the change.
                let previous = yarc.mcr();
                yarc.clock_control(fixed[1]);
                self.send_ack(byte);
                self.tx.put(previous);
                self.state
            }
            Command::RunYarc => {
                let r0 = u16::from_be_bytes([fixed[2], fixed[3]]);
                let r1 = u16::from_be_bytes([fixed[4], fixed[5]]);
                let r2 = u16::from_be_bytes([fixed[6], fixed[7]]);
                yarc.run(fixed[1], r0, r1, r2);
                self.send_ack(byte);
                self.state
            }
            Command::StopYarc => {
                yarc.stop();
                self.send_ack(byte);
                self.state
            }
            Command::GetVer => {
                self.send_ack(byte);
                self.tx.put(PROTOCOL_VERSION);
                self.state
            }
            Command::Sync => {
                self.send_ack(byte);
                yarc.set_display(DISPLAY_READY);
                ConnectionState::Ready
            }
            Command::DoCycle => {
                self.send_ack(byte);
                let bir = yarc.single_clock();
                self.tx.put(bir);
                self.state
            }
            Command::GetResult => {
                self.send_ack(byte);
                let bir = yarc.bus_input_register();
                self.tx.put(bir);
                self.state
            }
            Command::SetK => {
                yarc.write_control([fixed[1], fixed[2], fixed[3], fixed[4]]);
                self.send_ack(byte);
                self.state
            }
            Command::SetMcr => {
                yarc.set_mcr(fixed[1]);
                self.send_ack(byte);
                self.state
            }
            Command::Poll => self.handle_poll(byte, log, clock),
            Command::Debug => self.handle_debug(byte, &fixed, yarc, log, clock),
            Command::WrMem | Command::RdMem => {
                let addr = u16::from_be_bytes([fixed[1], fixed[2]]);
                let count = fixed[3] as usize;
                if count != CHUNK_SIZE || !chunk_bounded(addr, MEM_END) {
                    return self.reject();
                }
                self.begin_transfer(byte);
                if cmd == Command::RdMem {
                    self.send_ack(byte);
                    self.tx.put(CHUNK_SIZE as u8);
                    self.transfer = Some(Transfer::ReadMem { addr });
                    self.run_read_mem(yarc, clock)
                } else {
                    self.transfer = Some(Transfer::WriteMem { addr });
                    self.run_write_mem(yarc, clock)
                }
            }
            Command::WrSlice | Command::RdSlice => {
                // The microcode store addresses opcodes with the high bit set.
                let opcode = fixed[1] | 0x80;
                let slice = fixed[2];
                let count = fixed[3] as usize;
                if count != CHUNK_SIZE || slice >= MICROCODE_SLICES {
                    return self.reject();
                }
                self.begin_transfer(byte);
                if cmd == Command::RdSlice {
                    self.send_ack(byte);
                    self.tx.put(CHUNK_SIZE as u8);
                    self.transfer = Some(Transfer::ReadSlice { opcode, slice, index: 0 });
                    self.run_read_slice(yarc, clock)
                } else {
                    self.transfer = Some(Transfer::WriteSlice { opcode, slice, index: 0 });
                    self.run_write_slice(yarc, clock)
                }
            }
            Command::WrAlu => {
                let addr = u16::from_be_bytes([fixed[1], fixed[2]]);
                let count = fixed[3] as usize;
                if count != CHUNK_SIZE || !chunk_bounded(addr, ALU_END) {
                    return self.reject();
                }
                self.begin_transfer(byte);
                self.transfer = Some(Transfer::WriteAlu { addr });
                self.run_write_alu(yarc, clock)
            }
            Command::RdAlu => {
                let addr = u16::from_be_bytes([fixed[1], fixed[2]]);
                let ram = fixed[3];
                let count = fixed[4] as usize;
                if count != CHUNK_SIZE || ram >= ALU_RAMS || !chunk_bounded(addr, ALU_END) {
                    return self.reject();
                }
                self.begin_transfer(byte);
                self.send_ack(byte);
                self.tx.put(CHUNK_SIZE as u8);
                self.transfer = Some(Transfer::ReadAlu { ram, addr });
                self.run_read_alu(yarc, clock)
            }
        }
    }

    /// Acquire the shared buffer for a chunk transfer: the command byte is
    /// stashed so the ack/nak decision can be deferred to the end.
    fn begin_transfer(&mut self, byte: u8) {
        self.buffer.acquire();
        self.buffer.buf[0] = byte;
        self.buffer.remaining = CHUNK_SIZE;
    }

    // === in-progress transfers ===

    /// Re-invoke the installed transfer. Dispatch is suppressed while one is
    /// installed, so this is the only handler that runs this pass.
    fn resume<Y, C>(&mut self, yarc: &mut Y, clock: &C)
    where
        Y: YarcBus,
        C: Millis,
    {
        self.state = match self.transfer {
            Some(Transfer::Poll) => self.run_poll(clock),
            Some(Transfer::WriteMem { .. }) => self.run_write_mem(yarc, clock),
            Some(Transfer::ReadMem { .. }) => self.run_read_mem(yarc, clock),
            Some(Transfer::WriteSlice { .. }) => self.run_write_slice(yarc, clock),
            Some(Transfer::ReadSlice { .. }) => self.run_read_slice(yarc, clock),
            Some(Transfer::WriteAlu { .. }) => self.run_write_alu(yarc, clock),
            Some(Transfer::ReadAlu { .. }) => self.run_read_alu(yarc, clock),
            None => fault(Fault::TransferMismatch),
        };
    }

    /// A host-to-Nano transfer finished: ack the stashed command byte and
    /// hand the buffer back.
    fn finish_write(&mut self) {
        let cmd = self.buffer.buf[0];
        self.send_ack(cmd);
        self.buffer.release();
        self.transfer = None;
    }

    /// The target address range ran out mid-transfer: NAK the stashed
    /// command and abandon the rest.
    fn abort_transfer(&mut self) -> ConnectionState {
        self.send_nak();
        self.buffer.release();
        self.transfer = None;
        self.state
    }

    fn run_write_mem<Y, C>(&mut self, yarc: &mut Y, clock: &C) -> ConnectionState
    where
        Y: YarcBus,
        C: Millis,
    {
        let Some(Transfer::WriteMem { mut addr }) = self.transfer else {
            fault(Fault::TransferMismatch);
        };
        // Loop while there is work, data, and we are still in the same
        // millisecond; when the millisecond clicks over the transfer stays
        // installed and the rest of the tasks get their turn.
        let start = clock.now();
        while self.buffer.remaining > 0 && !self.rx.is_empty() && clock.now() == start {
            if addr >= MEM_END {
                return self.abort_transfer();
            }
            yarc.write_mem_byte(addr, self.rx.peek());
            self.rx.consume(1);
            addr += 1;
            self.buffer.remaining -= 1;
        }
        self.transfer = Some(Transfer::WriteMem { addr });
        if self.buffer.remaining == 0 {
            self.finish_write();
        }
        self.state
    }

    fn run_read_mem<Y, C>(&mut self, yarc: &mut Y, clock: &C) -> ConnectionState
    where
        Y: YarcBus,
        C: Millis,
    {
        let Some(Transfer::ReadMem { mut addr }) = self.transfer else {
            fault(Fault::TransferMismatch);
        };
        let start = clock.now();
        while self.buffer.remaining > 0 && !self.tx.is_full() && clock.now() == start {
            if addr >= MEM_END {
                return self.abort_transfer();
            }
            let value = yarc.read_mem_byte(addr);
            self.tx.put(value);
            addr += 1;
            self.buffer.remaining -= 1;
        }
        self.transfer = Some(Transfer::ReadMem { addr });
        if self.buffer.remaining == 0 {
            self.buffer.release();
            self.transfer = None;
        }
        self.state
    }

    fn run_write_slice<Y, C>(&mut self, yarc: &mut Y, clock: &C) -> ConnectionState
    where
        Y: YarcBus,
        C: Millis,
    {
        let Some(Transfer::WriteSlice { opcode, slice, mut index }) = self.transfer else {
            fault(Fault::TransferMismatch);
        };
        let start = clock.now();
        while self.buffer.remaining > 0 && !self.rx.is_empty() && clock.now() == start {
            yarc.write_slice_byte(opcode, slice, index, self.rx.peek());
            self.rx.consume(1);
            index += 1;
            self.buffer.remaining -= 1;
        }
        self.transfer = Some(Transfer::WriteSlice { opcode, slice, index });
        if self.buffer.remaining == 0 {
            self.finish_write();
        }
        self.state
    }

    fn run_read_slice<Y, C>(&mut self, yarc: &mut Y, clock: &C) -> ConnectionState
    where
        Y: YarcBus,
        C: Millis,
    {
        let Some(Transfer::ReadSlice { opcode, slice, mut index }) = self.transfer else {
            fault(Fault::TransferMismatch);
        };
        let start = clock.now();
        while self.buffer.remaining > 0 && !self.tx.is_full() && clock.now() == start {
            let value = yarc.read_slice_byte(opcode, slice, index);
            self.tx.put(value);
            index += 1;
            self.buffer.remaining -= 1;
        }
        self.transfer = Some(Transfer::ReadSlice { opcode, slice, index });
        if self.buffer.remaining == 0 {
            self.buffer.release();
            self.transfer = None;
        }
        self.state
    }

    fn run_write_alu<Y, C>(&mut self, yarc: &mut Y, clock: &C) -> ConnectionState
    where
        Y: YarcBus,
        C: Millis,
    {
        let Some(Transfer::WriteAlu { mut addr }) = self.transfer else {
            fault(Fault::TransferMismatch);
        };
        let start = clock.now();
        while self.buffer.remaining > 0 && !self.rx.is_empty() && clock.now() == start {
            if addr >= ALU_END {
                return self.abort_transfer();
            }
            yarc.write_alu_byte(addr, self.rx.peek());
            self.rx.consume(1);
            addr += 1;
            self.buffer.remaining -= 1;
        }
        self.transfer = Some(Transfer::WriteAlu { addr });
        if self.buffer.remaining == 0 {
            self.finish_write();
        }
        self.state
    }

    fn run_read_alu<Y, C>(&mut self, yarc: &mut Y, clock: &C) -> ConnectionState
    where
        Y: YarcBus,
        C: Millis,
    {
        let Some(Transfer::ReadAlu { ram, mut addr }) = self.transfer else {
            fault(Fault::TransferMismatch);
        };
        let start = clock.now();
        while self.buffer.remaining > 0 && !self.tx.is_full() && clock.now() == start {
            if addr >= ALU_END {
                return self.abort_transfer();
            }
            let value = yarc.read_alu_byte(ram, addr);
            self.tx.put(value);
            addr += 1;
            self.buffer.remaining -= 1;
        }
        self.transfer = Some(Transfer::ReadAlu { ram, addr });
        if self.buffer.remaining == 0 {
            self.buffer.release();
            self.transfer = None;
        }
        self.state
    }

    /// Poll: hand the host one queued diagnostic message. The whole response
    /// is staged in the command buffer so the log entry is consumed exactly
    /// once, then streamed out across however many passes it takes.
    fn handle_poll<C: Millis>(&mut self, byte: u8, log: &mut LogQueue, clock: &C) -> ConnectionState {
        if log.is_empty() {
            self.send_ack(byte);
            self.tx.put(0);
            return self.state;
        }
        self.buffer.acquire();
        let n = log.drain_next(&mut self.buffer.buf[2..2 + BUF_MAX_DATA]);
        self.buffer.buf[0] = ack(byte);
        self.buffer.buf[1] = n as u8;
        self.buffer.next = 0;
        self.buffer.remaining = 2 + n;
        self.transfer = Some(Transfer::Poll);
        self.run_poll(clock)
    }

    fn run_poll<C: Millis>(&mut self, clock: &C) -> ConnectionState {
        if self.transfer != Some(Transfer::Poll) {
            fault(Fault::TransferMismatch);
        }
        let start = clock.now();
        while self.buffer.remaining > 0 && !self.tx.is_full() && clock.now() == start {
            self.tx.put(self.buffer.buf[self.buffer.next]);
            self.buffer.next += 1;
            self.buffer.remaining -= 1;
        }
        if self.buffer.remaining == 0 {
            self.buffer.release();
            self.transfer = None;
        }
        self.state
    }

    /// Debug escape. Sub-command 0 dumps the general registers and flags to
    /// the scratch region and returns it; anything else is acknowledged with
    /// an empty response so a newer host cannot wedge an older firmware.
    fn handle_debug<Y, C>(&mut self, byte: u8, fixed: &[u8], yarc: &mut Y, log: &mut LogQueue, clock: &C) -> ConnectionState
    where
        Y: YarcBus,
        C: Millis,
    {
        match fixed[1] {
            0 => {
                yarc.dump_registers();
                self.begin_transfer(byte);
                self.send_ack(byte);
                self.tx.put(CHUNK_SIZE as u8);
                self.transfer = Some(Transfer::ReadMem { addr: SCRATCH_ADDR });
                self.run_read_mem(yarc, clock)
            }
            _ => {
                let _ = log.log("debug: unknown sub-command");
                self.send_ack(byte);
                self.tx.put(0);
                self.state
            }
        }
    }
}

impl Default for SerialEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Chunk-transfer address check: aligned and entirely inside the region.
fn chunk_bounded(addr: u16, end: u16) -> bool {
    addr % CHUNK_SIZE as u16 == 0 && addr as usize + CHUNK_SIZE <= end as usize
}
