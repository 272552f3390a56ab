//! Instruction execution for the implemented 68000 subset.
//!
//! Each handler returns the cycles the instruction took, or the
//! [`Exception`] it raised. Register and memory side effects performed
//! before a fault stay committed, as on the real bus.

mod flags;
mod helpers;

pub use helpers::Operand;

use host_bridge::HostBus;

use crate::cpu::Core;
use crate::decoder::{Condition, Ea, Instruction, Size};
use crate::fault::Exception;
use crate::state::RunState;
use crate::timing::{cycles, ea_cycles, CycleCostKind};

impl Core {
    pub(crate) fn execute(
        &mut self,
        bus: &mut dyn HostBus,
        instruction: Instruction,
    ) -> Result<u32, Exception> {
        match instruction {
            Instruction::Nop => Ok(cycles(CycleCostKind::Nop)),
            Instruction::Moveq { data, reg } => {
                let value = sign_extend_byte(data);
                self.regs.set_d(usize::from(reg), value);
                self.set_logic_flags(Size::Long, value);
                Ok(cycles(CycleCostKind::Moveq))
            }
            Instruction::Move { size, src, dst } => self.exec_move(bus, size, src, dst),
            Instruction::Movea { size, src, reg } => self.exec_movea(bus, size, src, reg),
            Instruction::Branch {
                cond: Condition::False,
                disp8,
            } => self.exec_bsr(bus, disp8),
            Instruction::Branch { cond, disp8 } => self.exec_bcc(bus, cond, disp8),
            Instruction::Rts => {
                let target = self.pop_long(bus)?;
                self.jump(bus, target)?;
                Ok(cycles(CycleCostKind::Rts))
            }
            Instruction::Rte => {
                let sr = self.pop_word(bus)?;
                let target = self.pop_long(bus)?;
                self.regs.set_sr(sr);
                self.jump(bus, target)?;
                Ok(cycles(CycleCostKind::Rte))
            }
            Instruction::Stop => {
                let sr = self.next_word(bus)?;
                self.regs.set_sr(sr);
                self.run_state = RunState::Stopped;
                Ok(cycles(CycleCostKind::Stop))
            }
            Instruction::Trap { vector } => Err(Exception::Trap(vector)),
            Instruction::Illegal => Err(Exception::IllegalInstruction(self.regs.ird())),
            Instruction::LineA => Err(Exception::LineA(self.regs.ird())),
            Instruction::LineF => Err(Exception::LineF(self.regs.ird())),
        }
    }

    fn exec_move(
        &mut self,
        bus: &mut dyn HostBus,
        size: Size,
        src: Ea,
        dst: Ea,
    ) -> Result<u32, Exception> {
        let source = self.resolve(bus, src, size)?;
        let value = self.load(bus, source, size)?;
        let target = self.resolve(bus, dst, size)?;
        self.store(bus, target, size, value)?;
        self.set_logic_flags(size, value);
        Ok(cycles(CycleCostKind::MoveBase)
            + ea_cycles(src, size, false)
            + ea_cycles(dst, size, true))
    }

    fn exec_movea(
        &mut self,
        bus: &mut dyn HostBus,
        size: Size,
        src: Ea,
        reg: u8,
    ) -> Result<u32, Exception> {
        let source = self.resolve(bus, src, size)?;
        let value = self.load(bus, source, size)?;
        let value = match size {
            Size::Word => sign_extend_word(value),
            Size::Byte | Size::Long => value,
        };
        self.regs.set_a(usize::from(reg), value);
        Ok(cycles(CycleCostKind::MoveBase) + ea_cycles(src, size, false))
    }

    /// Reads the branch displacement: the opcode's low byte, or the word
    /// extension when that byte is zero.
    fn branch_displacement(&mut self, bus: &mut dyn HostBus, disp8: u8) -> Result<u32, Exception> {
        if disp8 == 0 {
            Ok(sign_extend_word(u32::from(self.next_word(bus)?)))
        } else {
            Ok(sign_extend_byte(disp8))
        }
    }

    fn exec_bcc(
        &mut self,
        bus: &mut dyn HostBus,
        cond: Condition,
        disp8: u8,
    ) -> Result<u32, Exception> {
        let base = self.regs.pc0().wrapping_add(2);
        if cond.test(self.regs.sr()) {
            let target = base.wrapping_add(self.branch_displacement(bus, disp8)?);
            self.jump(bus, target)?;
            Ok(cycles(CycleCostKind::BranchTaken))
        } else if disp8 == 0 {
            self.next_word(bus)?;
            Ok(cycles(CycleCostKind::BranchNotTakenWord))
        } else {
            Ok(cycles(CycleCostKind::BranchNotTakenShort))
        }
    }

    fn exec_bsr(&mut self, bus: &mut dyn HostBus, disp8: u8) -> Result<u32, Exception> {
        let base = self.regs.pc0().wrapping_add(2);
        let target = base.wrapping_add(self.branch_displacement(bus, disp8)?);
        self.push_long(bus, self.regs.pc())?;
        self.jump(bus, target)?;
        Ok(cycles(CycleCostKind::Bsr))
    }
}

/// Sign-extends a byte to 32 bits.
#[must_use]
pub fn sign_extend_byte(value: u8) -> u32 {
    let value = u32::from(value);
    if value & 0x80 == 0 {
        value
    } else {
        value | 0xFFFF_FF00
    }
}

/// Sign-extends the low word of `value` to 32 bits.
#[must_use]
pub const fn sign_extend_word(value: u32) -> u32 {
    let value = value & 0xFFFF;
    if value & 0x8000 == 0 {
        value
    } else {
        value | 0xFFFF_0000
    }
}
