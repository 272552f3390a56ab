//! Exception and interrupt entry.

use host_bridge::{ExceptionFrame, HostBus, IrqMode};
use tracing::debug;

use super::Core;
use crate::fault::{Exception, VECTOR_SPURIOUS};
use crate::state::{RunState, SR_S, SR_T};
use crate::timing::{cycles, CycleCostKind};

impl Core {
    /// Enters the handler for `exception`.
    ///
    /// A failure while stacking or fetching the vector is returned so that
    /// [`Core::settle`] processes it in turn; a group 0 failure during group
    /// 0 processing halts the core instead.
    pub(super) fn enter_exception(
        &mut self,
        bus: &mut dyn HostBus,
        exception: Exception,
    ) -> Result<u32, Exception> {
        if self.run_state == RunState::Halted {
            debug!(%exception, "core halted, exception dropped");
            return Ok(0);
        }
        self.run_state = RunState::Running;
        match exception.group0_frame() {
            Some(frame) => self.enter_group0(bus, &exception, frame),
            None => self.enter_group12(bus, &exception),
        }
    }

    fn enter_group0(
        &mut self,
        bus: &mut dyn HostBus,
        exception: &Exception,
        frame: ExceptionFrame,
    ) -> Result<u32, Exception> {
        if self.in_group0 {
            self.halt(exception);
            return Ok(0);
        }
        debug!(%exception, vector = exception.vector(), "group 0 exception");
        self.in_group0 = true;
        self.enter_supervisor();

        self.push_long(bus, frame.pc)?;
        self.push_word(bus, frame.sr)?;
        self.push_word(bus, frame.ird)?;
        self.push_long(bus, frame.addr)?;
        self.push_word(bus, frame.code)?;
        self.jump_to_vector(bus, exception.vector())?;

        self.in_group0 = false;
        Ok(cycles(CycleCostKind::Group0Entry))
    }

    fn enter_group12(
        &mut self,
        bus: &mut dyn HostBus,
        exception: &Exception,
    ) -> Result<u32, Exception> {
        let return_pc = if exception.returns_to_faulting_instruction() {
            self.regs.pc0()
        } else {
            self.regs.pc()
        };
        let sr = self.regs.sr();
        self.enter_supervisor();

        self.push_long(bus, return_pc)?;
        self.push_word(bus, sr)?;
        self.jump_to_vector(bus, exception.vector())?;

        Ok(cycles(match exception {
            Exception::Trap(_) => CycleCostKind::TrapEntry,
            Exception::PrivilegeViolation(_) => CycleCostKind::PrivilegeEntry,
            _ => CycleCostKind::IllegalEntry,
        }))
    }

    /// Acknowledges an interrupt of `level` and enters its handler.
    pub(super) fn interrupt(&mut self, bus: &mut dyn HostBus, level: u8) -> Result<u32, Exception> {
        let sr = self.regs.sr();
        self.run_state = RunState::Running;
        self.enter_supervisor();
        self.regs.set_interrupt_mask(level);

        let vector = match self.config.irq_mode {
            IrqMode::Auto => VECTOR_SPURIOUS + level,
            IrqMode::User => bus.read_irq_user_vector(level).to_be_bytes()[1],
        };
        debug!(level, vector, "interrupt");

        self.push_long(bus, self.regs.pc())?;
        self.push_word(bus, sr)?;
        self.jump_to_vector(bus, vector)?;
        Ok(cycles(CycleCostKind::InterruptEntry))
    }

    fn enter_supervisor(&mut self) {
        self.regs.set_sr((self.regs.sr() | SR_S) & !SR_T);
    }

    fn jump_to_vector(&mut self, bus: &mut dyn HostBus, vector: u8) -> Result<(), Exception> {
        let target = self.read_long(bus, u32::from(vector) * 4)?;
        self.jump(bus, target)
    }
}
