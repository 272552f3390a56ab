//! Safe boundary surface over an engine and its host adapter.
//!
//! Nothing here can fail once a machine exists: bus faults are consumed by the
//! engine's exception entry and never come back out of `step`/`run`.

use tracing::debug;

use crate::adapter::HostAdapter;
use crate::api::{Engine, MachineConfig};
use crate::contract::{CallbackContract, ContractError};
use crate::fault::{AccessKind, PendingFault};
use crate::frame::ExceptionFrame;

/// An engine wired to an embedder contract.
#[derive(Debug)]
pub struct Machine<E, C> {
    engine: E,
    host: HostAdapter<C>,
    config: MachineConfig,
}

impl<E: Engine, C> Machine<E, C> {
    /// Builds a machine with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when a required callback is absent.
    pub fn new(engine: E, contract: CallbackContract<C>) -> Result<Self, ContractError> {
        Self::with_config(engine, contract, MachineConfig::default())
    }

    /// Builds a machine with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when a required callback is absent.
    pub fn with_config(
        mut engine: E,
        contract: CallbackContract<C>,
        config: MachineConfig,
    ) -> Result<Self, ContractError> {
        let host = HostAdapter::new(contract)?;
        engine.set_irq_mode(config.irq_mode);
        Ok(Self {
            engine,
            host,
            config,
        })
    }

    /// The wrapped engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Exclusive access to the wrapped engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The host adapter.
    #[must_use]
    pub const fn host(&self) -> &HostAdapter<C> {
        &self.host
    }

    /// Exclusive access to the host adapter.
    pub fn host_mut(&mut self) -> &mut HostAdapter<C> {
        &mut self.host
    }

    /// Configuration the machine was built with.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Splits the machine into its engine and adapter.
    pub fn into_parts(self) -> (E, HostAdapter<C>) {
        (self.engine, self.host)
    }

    /// Resets the engine. Drops an unconsumed bus fault first unless
    /// configured otherwise.
    pub fn reset(&mut self) {
        if self.config.clear_fault_on_reset {
            if let Some(dropped) = self.host.clear_pending_fault() {
                debug!(address = dropped.address, "reset dropped pending bus fault");
            }
        }
        self.engine.reset(&mut self.host);
    }

    /// Runs until the engine halts.
    pub fn run(&mut self) {
        self.engine.run(&mut self.host);
    }

    /// Executes one instruction.
    pub fn step(&mut self) {
        self.engine.step(&mut self.host);
    }

    /// Runs for at least `cycles` clock cycles.
    pub fn execute_cycles(&mut self, cycles: i64) {
        self.engine.execute_cycles(&mut self.host, cycles);
    }

    /// Runs until the clock reaches or passes `cycle`.
    pub fn execute_until(&mut self, cycle: i64) {
        self.engine.execute_until(&mut self.host, cycle);
    }

    /// Enters or leaves supervisor mode.
    pub fn set_supervisor_mode(&mut self, enabled: bool) {
        self.engine.set_supervisor_mode(enabled);
    }

    /// Schedules a bus fault for delivery at the next access or sync.
    pub fn schedule_bus_fault(&mut self, address: u32, is_write: bool) -> Option<PendingFault> {
        self.host
            .schedule_bus_fault(address, AccessKind::from_is_write(is_write))
    }

    /// Clock value.
    #[must_use]
    pub fn clock(&self) -> i64 {
        self.engine.clock()
    }

    /// Overwrites the clock.
    pub fn set_clock(&mut self, value: i64) {
        self.engine.set_clock(value);
    }

    /// Data register `Dn`.
    #[must_use]
    pub fn d(&self, n: usize) -> u32 {
        self.engine.d(n)
    }

    /// Writes data register `Dn`.
    pub fn set_d(&mut self, n: usize, value: u32) {
        self.engine.set_d(n, value);
    }

    /// Address register `An`.
    #[must_use]
    pub fn a(&self, n: usize) -> u32 {
        self.engine.a(n)
    }

    /// Writes address register `An`.
    pub fn set_a(&mut self, n: usize, value: u32) {
        self.engine.set_a(n, value);
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u32 {
        self.engine.pc()
    }

    /// Writes the program counter.
    pub fn set_pc(&mut self, value: u32) {
        self.engine.set_pc(value);
    }

    /// Program counter at the start of the current instruction.
    #[must_use]
    pub fn pc0(&self) -> u32 {
        self.engine.pc0()
    }

    /// Writes the start-of-instruction program counter.
    pub fn set_pc0(&mut self, value: u32) {
        self.engine.set_pc0(value);
    }

    /// Prefetch register.
    #[must_use]
    pub fn irc(&self) -> u16 {
        self.engine.irc()
    }

    /// Writes the prefetch register.
    pub fn set_irc(&mut self, value: u16) {
        self.engine.set_irc(value);
    }

    /// Executing-opcode register.
    #[must_use]
    pub fn ird(&self) -> u16 {
        self.engine.ird()
    }

    /// Writes the executing-opcode register.
    pub fn set_ird(&mut self, value: u16) {
        self.engine.set_ird(value);
    }

    /// Condition-code byte.
    #[must_use]
    pub fn ccr(&self) -> u8 {
        self.engine.ccr()
    }

    /// Writes the condition-code byte.
    pub fn set_ccr(&mut self, value: u8) {
        self.engine.set_ccr(value);
    }

    /// Status register.
    #[must_use]
    pub fn sr(&self) -> u16 {
        self.engine.sr()
    }

    /// Writes the status register.
    pub fn set_sr(&mut self, value: u16) {
        self.engine.set_sr(value);
    }

    /// Active stack pointer.
    #[must_use]
    pub fn sp(&self) -> u32 {
        self.engine.sp()
    }

    /// Writes the active stack pointer.
    pub fn set_sp(&mut self, value: u32) {
        self.engine.set_sp(value);
    }

    /// Interrupt priority level on the IPL pins.
    #[must_use]
    pub fn ipl(&self) -> u8 {
        self.engine.ipl()
    }

    /// Drives the IPL pins.
    pub fn set_ipl(&mut self, value: u8) {
        self.engine.set_ipl(value);
    }

    /// Disassembles the instruction at `addr` into `out`; returns its length
    /// in bytes. Never consumes a pending bus fault.
    pub fn disassemble(&mut self, addr: u32, out: &mut String) -> usize {
        self.engine.disassemble(&mut self.host, addr, out)
    }

    /// Renders the status register into `out`.
    pub fn disassemble_sr(&self, out: &mut String) {
        self.engine.disassemble_sr(out);
    }

    /// Renders an 8-bit value into `out`.
    pub fn dump8(&self, out: &mut String, value: u8) {
        self.engine.dump8(out, value);
    }

    /// Renders a 16-bit value into `out`.
    pub fn dump16(&self, out: &mut String, value: u16) {
        self.engine.dump16(out, value);
    }

    /// Renders a 24-bit value into `out`.
    pub fn dump24(&self, out: &mut String, value: u32) {
        self.engine.dump24(out, value);
    }

    /// Renders a 32-bit value into `out`.
    pub fn dump32(&self, out: &mut String, value: u32) {
        self.engine.dump32(out, value);
    }

    /// Frame derived from live state.
    ///
    /// Only `ird`, `sr` and `pc` are populated; a delivered fault's original
    /// frame is not retained.
    #[must_use]
    pub fn exception_frame(&self) -> ExceptionFrame {
        ExceptionFrame::capture(&self.engine)
    }

    /// Writes `ird`, `sr` and `pc` of `frame` back into the engine. The other
    /// fields are ignored.
    pub fn set_exception_frame(&mut self, frame: &ExceptionFrame) {
        self.engine.set_ird(frame.ird);
        self.engine.set_sr(frame.sr);
        self.engine.set_pc(frame.pc);
    }
}

#[cfg(test)]
mod tests {
    use super::Machine;
    use crate::api::{CpuView, Engine, HostBus, IrqMode, MachineConfig};
    use crate::contract::CallbackContract;
    use crate::fault::FaultState;
    use crate::frame::ExceptionFrame;

    /// Engine stub that performs one word read per step at `A0`.
    #[derive(Debug, Default)]
    struct Probe {
        regs: [u32; 16],
        pc: u32,
        pc0: u32,
        ird: u16,
        irc: u16,
        sr: u16,
        ipl: u8,
        clock: i64,
        irq_mode: Option<IrqMode>,
        faults: Vec<ExceptionFrame>,
        resets: u32,
    }

    impl CpuView for Probe {
        fn ird(&self) -> u16 {
            self.ird
        }
        fn sr(&self) -> u16 {
            self.sr
        }
        fn pc(&self) -> u32 {
            self.pc
        }
    }

    impl Engine for Probe {
        fn reset(&mut self, _bus: &mut dyn HostBus) {
            self.resets += 1;
        }
        fn step(&mut self, bus: &mut dyn HostBus) {
            if let Err(fault) = bus.read16(&*self, self.regs[8]) {
                self.faults.push(fault.frame);
            }
            self.clock += 4;
        }
        fn is_halted(&self) -> bool {
            !self.faults.is_empty()
        }
        fn clock(&self) -> i64 {
            self.clock
        }
        fn set_clock(&mut self, value: i64) {
            self.clock = value;
        }
        fn d(&self, n: usize) -> u32 {
            self.regs[n]
        }
        fn set_d(&mut self, n: usize, value: u32) {
            self.regs[n] = value;
        }
        fn a(&self, n: usize) -> u32 {
            self.regs[8 + n]
        }
        fn set_a(&mut self, n: usize, value: u32) {
            self.regs[8 + n] = value;
        }
        fn set_pc(&mut self, value: u32) {
            self.pc = value;
        }
        fn pc0(&self) -> u32 {
            self.pc0
        }
        fn set_pc0(&mut self, value: u32) {
            self.pc0 = value;
        }
        fn irc(&self) -> u16 {
            self.irc
        }
        fn set_irc(&mut self, value: u16) {
            self.irc = value;
        }
        fn set_ird(&mut self, value: u16) {
            self.ird = value;
        }
        fn set_ccr(&mut self, value: u8) {
            self.sr = (self.sr & 0xFF00) | u16::from(value);
        }
        fn set_sr(&mut self, value: u16) {
            self.sr = value;
        }
        fn sp(&self) -> u32 {
            self.regs[15]
        }
        fn set_sp(&mut self, value: u32) {
            self.regs[15] = value;
        }
        fn ipl(&self) -> u8 {
            self.ipl
        }
        fn set_ipl(&mut self, value: u8) {
            self.ipl = value;
        }
        fn set_supervisor_mode(&mut self, enabled: bool) {
            if enabled {
                self.sr |= 0x2000;
            } else {
                self.sr &= !0x2000;
            }
        }
        fn set_irq_mode(&mut self, mode: IrqMode) {
            self.irq_mode = Some(mode);
        }
        fn disassemble(&self, bus: &mut dyn HostBus, addr: u32, out: &mut String) -> usize {
            let word = bus.peek16(addr);
            out.clear();
            out.push_str(&format!("dc.w ${word:04x}"));
            2
        }
    }

    fn contract() -> CallbackContract<u32> {
        CallbackContract::new(0)
            .with_read8(|_, _| 0)
            .with_read16(|reads, _| {
                *reads += 1;
                0x4E71
            })
            .with_write8(|_, _, _| {})
            .with_write16(|_, _, _| {})
    }

    #[test]
    fn construction_forces_configured_irq_mode() {
        let machine = Machine::new(Probe::default(), contract()).expect("complete contract");
        assert_eq!(machine.engine().irq_mode, Some(IrqMode::User));

        let config = MachineConfig {
            irq_mode: IrqMode::Auto,
            ..MachineConfig::default()
        };
        let machine =
            Machine::with_config(Probe::default(), contract(), config).expect("complete contract");
        assert_eq!(machine.engine().irq_mode, Some(IrqMode::Auto));
    }

    #[test]
    fn scheduled_fault_is_stamped_at_the_triggering_access() {
        let mut machine = Machine::new(Probe::default(), contract()).expect("complete contract");
        machine.set_pc(0x1000);
        machine.set_sr(0x2700);
        machine.set_ird(0x4E71);
        machine.set_a(0, 0x200);
        machine.schedule_bus_fault(0x00AB_CDEF, false);

        machine.set_pc(0x1002);
        machine.step();

        assert_eq!(
            machine.engine().faults,
            vec![ExceptionFrame {
                code: 0x0010,
                addr: 0x00AB_CDEF,
                ird: 0x4E71,
                sr: 0x2700,
                pc: 0x1002,
                fc: 0,
                ssw: 0,
            }]
        );
        assert_eq!(machine.host().faults().state(), FaultState::Idle);
    }

    #[test]
    fn reset_clears_pending_fault_by_default() {
        let mut machine = Machine::new(Probe::default(), contract()).expect("complete contract");
        machine.schedule_bus_fault(0x10, true);
        machine.reset();
        assert_eq!(machine.engine().resets, 1);
        assert_eq!(machine.host().faults().state(), FaultState::Idle);
    }

    #[test]
    fn reset_can_keep_pending_fault() {
        let config = MachineConfig {
            clear_fault_on_reset: false,
            ..MachineConfig::default()
        };
        let mut machine =
            Machine::with_config(Probe::default(), contract(), config).expect("complete contract");
        machine.schedule_bus_fault(0x10, true);
        machine.reset();
        assert_eq!(machine.host().faults().state(), FaultState::Scheduled);
    }

    #[test]
    fn execute_until_stops_at_or_past_target() {
        let mut machine = Machine::new(Probe::default(), contract()).expect("complete contract");
        machine.execute_until(10);
        assert_eq!(machine.clock(), 12);
        machine.execute_cycles(8);
        assert_eq!(machine.clock(), 20);
        assert_eq!(*machine.host().context(), 5);
        machine.execute_until(4);
        assert_eq!(machine.clock(), 20);
    }

    #[test]
    fn run_returns_once_engine_halts() {
        let mut machine = Machine::new(Probe::default(), contract()).expect("complete contract");
        machine.schedule_bus_fault(0x20, false);
        machine.run();
        assert!(machine.engine().is_halted());
        assert_eq!(machine.engine().faults.len(), 1);
    }

    #[test]
    fn frame_round_trip_restores_only_live_registers() {
        let mut machine = Machine::new(Probe::default(), contract()).expect("complete contract");
        machine.set_pc(0x0000_4000);
        machine.set_sr(0x2004);
        machine.set_ird(0x3010);

        let frame = machine.exception_frame();
        assert_eq!((frame.code, frame.addr, frame.fc, frame.ssw), (0, 0, 0, 0));

        machine.set_pc(0);
        machine.set_sr(0);
        machine.set_ird(0);
        machine.set_exception_frame(&ExceptionFrame {
            code: 0x0010,
            addr: 0xDEAD,
            fc: 5,
            ssw: 7,
            ..frame
        });
        assert_eq!(machine.exception_frame(), frame);
    }

    #[test]
    fn disassembly_does_not_consume_pending_fault() {
        let mut machine = Machine::new(Probe::default(), contract()).expect("complete contract");
        machine.schedule_bus_fault(0x30, false);
        let mut out = String::new();
        assert_eq!(machine.disassemble(0x1000, &mut out), 2);
        assert_eq!(out, "dc.w $4e71");
        assert_eq!(machine.host().faults().state(), FaultState::Scheduled);
    }

    #[test]
    fn text_helpers_delegate_to_engine_defaults() {
        let mut machine = Machine::new(Probe::default(), contract()).expect("complete contract");
        machine.set_sr(0x2700);
        let mut out = String::new();
        machine.disassemble_sr(&mut out);
        assert_eq!(out, "-S7-----");
        machine.dump32(&mut out, 0x1234);
        assert_eq!(out, "$00001234");
        assert_eq!(machine.ccr(), 0);
        machine.set_ccr(0x1F);
        assert_eq!(machine.sr(), 0x271F);
    }
}
