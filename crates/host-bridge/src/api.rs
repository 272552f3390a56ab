//! Contracts between the host bridge and a 68000 instruction engine.
//!
//! The engine never sees a concrete adapter type. It receives a
//! `&mut dyn HostBus` for every call that may touch memory, and hands the
//! bus a [`CpuView`] of its own registers with every access so that a
//! deferred fault is stamped with the state of *that* access.

use crate::fault::BusFault;
use crate::text;

/// How an engine resolves the vector number of an acknowledged interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum IrqMode {
    /// Level `n` uses the autovector `24 + n`.
    #[default]
    Auto,
    /// The vector number is supplied by [`HostBus::read_irq_user_vector`].
    User,
}

/// Machine-level configuration applied when a [`crate::Machine`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Interrupt vector resolution forced onto the engine at construction.
    pub irq_mode: IrqMode,
    /// Drops an unconsumed scheduled bus fault when the machine is reset.
    pub clear_fault_on_reset: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            irq_mode: IrqMode::User,
            clear_fault_on_reset: true,
        }
    }
}

/// Registers a host needs to stamp a bus-fault frame.
pub trait CpuView {
    /// Opcode of the instruction currently executing (`IRD`).
    fn ird(&self) -> u16;

    /// Full status register.
    fn sr(&self) -> u16;

    /// Program counter.
    fn pc(&self) -> u32;
}

/// Capability set an engine requires from its host.
///
/// Every memory access and every sync may fail with a [`BusFault`]. The
/// engine is expected to propagate it into its own exception entry, the same
/// way it handles faults it detects itself.
pub trait HostBus {
    /// Reads a byte.
    ///
    /// # Errors
    ///
    /// Returns a [`BusFault`] when a deferred fault is delivered on this access.
    fn read8(&mut self, cpu: &dyn CpuView, addr: u32) -> Result<u8, BusFault>;

    /// Reads a big-endian word.
    ///
    /// # Errors
    ///
    /// Returns a [`BusFault`] when a deferred fault is delivered on this access.
    fn read16(&mut self, cpu: &dyn CpuView, addr: u32) -> Result<u16, BusFault>;

    /// Writes a byte.
    ///
    /// # Errors
    ///
    /// Returns a [`BusFault`] when a deferred fault is delivered on this access.
    fn write8(&mut self, cpu: &dyn CpuView, addr: u32, value: u8) -> Result<(), BusFault>;

    /// Writes a big-endian word.
    ///
    /// # Errors
    ///
    /// Returns a [`BusFault`] when a deferred fault is delivered on this access.
    fn write16(&mut self, cpu: &dyn CpuView, addr: u32, value: u16) -> Result<(), BusFault>;

    /// Reports `cycles` elapsed on the engine clock.
    ///
    /// The engine always advances its own clock before calling this. The
    /// default does nothing further.
    ///
    /// # Errors
    ///
    /// Returns a [`BusFault`] when a deferred fault is delivered on this call.
    fn sync(&mut self, _cpu: &dyn CpuView, _cycles: i32) -> Result<(), BusFault> {
        Ok(())
    }

    /// Returns the vector number for an interrupt acknowledged at `level`.
    fn read_irq_user_vector(&mut self, _level: u8) -> u16 {
        0
    }

    /// Reads a word for inspection only. Never delivers a deferred fault.
    fn peek16(&mut self, addr: u32) -> u16;
}

/// Driving and inspection contract of a 68000-family instruction engine.
///
/// Register accessors are direct get/set pairs. Index arguments of
/// [`Engine::d`] and [`Engine::a`] must be in `0..8`; implementations may
/// panic otherwise.
pub trait Engine: CpuView {
    /// Performs a processor reset, fetching the initial SSP and PC.
    fn reset(&mut self, bus: &mut dyn HostBus);

    /// Executes one instruction, or idles for one bus cycle when stopped or
    /// halted.
    fn step(&mut self, bus: &mut dyn HostBus);

    /// Returns `true` once the engine has halted (for example after a double
    /// bus fault). Only a reset leaves this state.
    fn is_halted(&self) -> bool;

    /// Runs until the engine halts.
    fn run(&mut self, bus: &mut dyn HostBus) {
        while !self.is_halted() {
            self.step(bus);
        }
    }

    /// Runs for at least `cycles` clock cycles.
    fn execute_cycles(&mut self, bus: &mut dyn HostBus, cycles: i64) {
        let target = self.clock().saturating_add(cycles);
        self.execute_until(bus, target);
    }

    /// Runs until the clock reaches or passes `cycle`.
    fn execute_until(&mut self, bus: &mut dyn HostBus, cycle: i64) {
        while self.clock() < cycle {
            self.step(bus);
        }
    }

    /// Current clock value.
    fn clock(&self) -> i64;
    /// Overwrites the clock.
    fn set_clock(&mut self, value: i64);

    /// Data register `Dn`.
    fn d(&self, n: usize) -> u32;
    /// Writes data register `Dn`.
    fn set_d(&mut self, n: usize, value: u32);
    /// Address register `An` (`A7` is the active stack pointer).
    fn a(&self, n: usize) -> u32;
    /// Writes address register `An`.
    fn set_a(&mut self, n: usize, value: u32);

    /// Writes the program counter.
    fn set_pc(&mut self, value: u32);
    /// Program counter at the start of the current instruction.
    fn pc0(&self) -> u32;
    /// Writes the start-of-instruction program counter shadow.
    fn set_pc0(&mut self, value: u32);

    /// Prefetched instruction word (`IRC`).
    fn irc(&self) -> u16;
    /// Writes the prefetch register.
    fn set_irc(&mut self, value: u16);
    /// Writes the executing-opcode register (`IRD`).
    fn set_ird(&mut self, value: u16);

    /// Condition-code byte (low byte of `SR`).
    fn ccr(&self) -> u8 {
        self.sr().to_be_bytes()[1]
    }
    /// Writes the condition-code byte.
    fn set_ccr(&mut self, value: u8);
    /// Writes the full status register.
    fn set_sr(&mut self, value: u16);

    /// Active stack pointer.
    fn sp(&self) -> u32;
    /// Writes the active stack pointer.
    fn set_sp(&mut self, value: u32);

    /// Interrupt priority level presented on the IPL pins.
    fn ipl(&self) -> u8;
    /// Drives the IPL pins.
    fn set_ipl(&mut self, value: u8);

    /// Enters or leaves supervisor mode, switching stack pointers.
    fn set_supervisor_mode(&mut self, enabled: bool);

    /// Selects how interrupt vectors are resolved.
    fn set_irq_mode(&mut self, mode: IrqMode);

    /// Disassembles the instruction at `addr` into `out` and returns its
    /// length in bytes.
    fn disassemble(&self, bus: &mut dyn HostBus, addr: u32, out: &mut String) -> usize;

    /// Renders the status register into `out`.
    fn disassemble_sr(&self, out: &mut String) {
        text::format_sr(out, self.sr());
    }

    /// Renders an 8-bit value into `out`.
    fn dump8(&self, out: &mut String, value: u8) {
        text::dump8(out, value);
    }

    /// Renders a 16-bit value into `out`.
    fn dump16(&self, out: &mut String, value: u16) {
        text::dump16(out, value);
    }

    /// Renders the low 24 bits of `value` into `out`.
    fn dump24(&self, out: &mut String, value: u32) {
        text::dump24(out, value);
    }

    /// Renders a 32-bit value into `out`.
    fn dump32(&self, out: &mut String, value: u32) {
        text::dump32(out, value);
    }
}
