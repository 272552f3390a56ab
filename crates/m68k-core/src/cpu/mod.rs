//! The reference core: reset, the step loop and the [`Engine`] surface.
//!
//! Every host access goes through [`HostBus`] with the register file as the
//! [`CpuView`], so a bus fault delivered by the host is stamped with the
//! state of the access that observed it. Faults propagate as
//! [`Exception`] values to [`Core::settle`], which runs exception entry
//! until the core is back at an instruction boundary.

mod bus;
mod exception;

use host_bridge::{CpuView, Engine, HostBus, IrqMode};
use tracing::warn;

use crate::api::CoreConfig;
use crate::decoder::decode;
use crate::disasm;
use crate::fault::Exception;
use crate::state::{Registers, RunState, SR_RESET};
use crate::timing::{cycles, CycleCostKind};

/// Compact 68000 core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Core {
    pub(crate) regs: Registers,
    pub(crate) run_state: RunState,
    pub(crate) config: CoreConfig,
    clock: i64,
    ipl: u8,
    last_ipl: u8,
    in_group0: bool,
    unsynced: u32,
}

impl Core {
    /// Creates a core with the default configuration.
    ///
    /// The register file is zeroed; call [`Engine::reset`] to load the reset
    /// vectors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a core with an explicit configuration.
    #[must_use]
    pub fn with_config(config: CoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.regs
    }

    /// Mutable register file.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    fn load_reset_vectors(&mut self, bus: &mut dyn HostBus) -> Result<(), Exception> {
        let ssp = self.read_long(bus, 0)?;
        let pc = self.read_long(bus, 4)?;
        self.regs.set_sp(ssp);
        self.jump(bus, pc)
    }

    fn execute_next(&mut self, bus: &mut dyn HostBus) -> Result<u32, Exception> {
        let opcode = self.regs.irc();
        self.regs.set_pc0(self.regs.pc());
        self.regs.set_ird(opcode);

        let instruction = decode(opcode);
        if instruction.is_privileged() && !self.regs.supervisor() {
            return Err(Exception::PrivilegeViolation(opcode));
        }
        self.regs.set_pc(self.regs.pc().wrapping_add(2));
        self.prefetch(bus)?;
        self.execute(bus, instruction)
    }

    /// Samples the interrupt lines. Level 7 is taken on its rising edge even
    /// when the mask is 7.
    fn poll_interrupt(&mut self) -> Option<u8> {
        let level = self.ipl & 7;
        let edge = level == 7 && self.last_ipl != 7;
        self.last_ipl = level;
        (level > self.regs.interrupt_mask() || edge).then_some(level)
    }

    /// Runs exception entry until the core is back at an instruction
    /// boundary and returns the cycles spent.
    fn settle(&mut self, bus: &mut dyn HostBus, mut outcome: Result<u32, Exception>) -> u32 {
        loop {
            match outcome {
                Ok(spent) => return spent,
                Err(exception) => outcome = self.enter_exception(bus, exception),
            }
        }
    }

    /// Charges `spent` cycles to the clock and reports everything not yet
    /// synced to the host. When the sync itself delivers a bus fault the host
    /// never saw the cycles, so they are carried into the next sync together
    /// with the handler entry.
    fn advance(&mut self, bus: &mut dyn HostBus, spent: u32) {
        self.clock = self.clock.saturating_add(i64::from(spent));
        let elapsed = std::mem::take(&mut self.unsynced).saturating_add(spent);
        if let Err(fault) = bus.sync(&self.regs, i32::try_from(elapsed).unwrap_or(i32::MAX)) {
            let handler = self.settle(bus, Err(fault.into()));
            self.clock = self.clock.saturating_add(i64::from(handler));
            self.unsynced = elapsed.saturating_add(handler);
        }
    }

    pub(crate) fn halt(&mut self, cause: &Exception) {
        warn!(%cause, pc = self.regs.pc(), "core halted");
        self.run_state = RunState::Halted;
        self.in_group0 = false;
    }
}

impl CpuView for Core {
    fn ird(&self) -> u16 {
        self.regs.ird()
    }

    fn sr(&self) -> u16 {
        self.regs.sr()
    }

    fn pc(&self) -> u32 {
        self.regs.pc()
    }
}

impl Engine for Core {
    fn reset(&mut self, bus: &mut dyn HostBus) {
        let clock = self.clock;
        let (ipl, config) = (self.ipl, self.config);
        *self = Self {
            clock,
            ipl,
            last_ipl: ipl & 7,
            config,
            ..Self::default()
        };
        self.regs.set_sr(SR_RESET);

        if let Err(cause) = self.load_reset_vectors(bus) {
            self.halt(&cause);
        }
        self.advance(bus, cycles(CycleCostKind::Reset));
    }

    fn step(&mut self, bus: &mut dyn HostBus) {
        if self.run_state == RunState::Halted {
            self.advance(bus, cycles(CycleCostKind::Idle));
            return;
        }
        let outcome = match self.poll_interrupt() {
            Some(level) => self.interrupt(bus, level),
            None if self.run_state == RunState::Stopped => {
                self.advance(bus, cycles(CycleCostKind::Idle));
                return;
            }
            None => self.execute_next(bus),
        };
        let spent = self.settle(bus, outcome);
        self.advance(bus, spent);
    }

    fn is_halted(&self) -> bool {
        self.run_state == RunState::Halted
    }

    fn clock(&self) -> i64 {
        self.clock
    }

    fn set_clock(&mut self, value: i64) {
        self.clock = value;
    }

    fn d(&self, n: usize) -> u32 {
        self.regs.d(n)
    }

    fn set_d(&mut self, n: usize, value: u32) {
        self.regs.set_d(n, value);
    }

    fn a(&self, n: usize) -> u32 {
        self.regs.a(n)
    }

    fn set_a(&mut self, n: usize, value: u32) {
        self.regs.set_a(n, value);
    }

    fn set_pc(&mut self, value: u32) {
        self.regs.set_pc(value);
    }

    fn pc0(&self) -> u32 {
        self.regs.pc0()
    }

    fn set_pc0(&mut self, value: u32) {
        self.regs.set_pc0(value);
    }

    fn irc(&self) -> u16 {
        self.regs.irc()
    }

    fn set_irc(&mut self, value: u16) {
        self.regs.set_irc(value);
    }

    fn set_ird(&mut self, value: u16) {
        self.regs.set_ird(value);
    }

    fn ccr(&self) -> u8 {
        self.regs.ccr()
    }

    fn set_ccr(&mut self, value: u8) {
        self.regs.set_ccr(value);
    }

    fn set_sr(&mut self, value: u16) {
        self.regs.set_sr(value);
    }

    fn sp(&self) -> u32 {
        self.regs.sp()
    }

    fn set_sp(&mut self, value: u32) {
        self.regs.set_sp(value);
    }

    fn ipl(&self) -> u8 {
        self.ipl
    }

    fn set_ipl(&mut self, value: u8) {
        self.ipl = value;
    }

    fn set_supervisor_mode(&mut self, enabled: bool) {
        self.regs.set_supervisor(enabled);
    }

    fn set_irq_mode(&mut self, mode: IrqMode) {
        self.config.irq_mode = mode;
    }

    fn disassemble(&self, bus: &mut dyn HostBus, addr: u32, out: &mut String) -> usize {
        let mask = self.config.address_mask;
        disasm::disassemble_masked(bus, addr & mask, mask, out)
    }
}
