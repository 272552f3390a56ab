use host_bridge::HostBus;

use crate::cpu::Core;
use crate::decoder::{Ea, Size};
use crate::fault::Exception;

/// Effective address after calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// `Dn`.
    DataReg(u8),
    /// `An`.
    AddrReg(u8),
    /// Memory at a calculated address.
    Memory(u32),
    /// Immediate value taken from the extension words.
    Immediate(u32),
}

/// `(An)+` and `-(An)` step; byte accesses through `A7` keep the stack
/// word aligned.
const fn address_step(reg: u8, size: Size) -> u32 {
    match (reg, size) {
        (7, Size::Byte) => 2,
        _ => size.bytes(),
    }
}

/// Replaces the low `size` bits of `old` with `value`.
const fn merge(old: u32, value: u32, size: Size) -> u32 {
    (old & !size.mask()) | (value & size.mask())
}

impl Core {
    /// Calculates an effective address, consuming extension words and
    /// applying the address register side effects of `(An)+` and `-(An)`.
    pub(crate) fn resolve(
        &mut self,
        bus: &mut dyn HostBus,
        ea: Ea,
        size: Size,
    ) -> Result<Operand, Exception> {
        Ok(match ea {
            Ea::DataReg(reg) => Operand::DataReg(reg),
            Ea::AddrReg(reg) => Operand::AddrReg(reg),
            Ea::Indirect(reg) => Operand::Memory(self.regs.a(usize::from(reg))),
            Ea::PostInc(reg) => {
                let addr = self.regs.a(usize::from(reg));
                self.regs
                    .set_a(usize::from(reg), addr.wrapping_add(address_step(reg, size)));
                Operand::Memory(addr)
            }
            Ea::PreDec(reg) => {
                let addr = self
                    .regs
                    .a(usize::from(reg))
                    .wrapping_sub(address_step(reg, size));
                self.regs.set_a(usize::from(reg), addr);
                Operand::Memory(addr)
            }
            Ea::Disp16(reg) => {
                let disp = super::sign_extend_word(u32::from(self.next_word(bus)?));
                Operand::Memory(self.regs.a(usize::from(reg)).wrapping_add(disp))
            }
            Ea::AbsShort => {
                Operand::Memory(super::sign_extend_word(u32::from(self.next_word(bus)?)))
            }
            Ea::AbsLong => Operand::Memory(self.next_long(bus)?),
            Ea::Immediate => Operand::Immediate(match size {
                Size::Byte => u32::from(self.next_word(bus)?) & 0xFF,
                Size::Word => u32::from(self.next_word(bus)?),
                Size::Long => self.next_long(bus)?,
            }),
        })
    }

    /// Reads an operand; the value is zero-extended from `size`.
    pub(crate) fn load(
        &mut self,
        bus: &mut dyn HostBus,
        operand: Operand,
        size: Size,
    ) -> Result<u32, Exception> {
        match operand {
            Operand::DataReg(reg) => Ok(self.regs.d(usize::from(reg)) & size.mask()),
            Operand::AddrReg(reg) => Ok(self.regs.a(usize::from(reg)) & size.mask()),
            Operand::Memory(addr) => self.read_sized(bus, addr, size),
            Operand::Immediate(value) => Ok(value & size.mask()),
        }
    }

    /// Writes an operand. Data registers keep their bits above `size`.
    pub(crate) fn store(
        &mut self,
        bus: &mut dyn HostBus,
        operand: Operand,
        size: Size,
        value: u32,
    ) -> Result<(), Exception> {
        match operand {
            Operand::DataReg(reg) => {
                let n = usize::from(reg);
                self.regs.set_d(n, merge(self.regs.d(n), value, size));
                Ok(())
            }
            Operand::AddrReg(reg) => {
                self.regs.set_a(usize::from(reg), value);
                Ok(())
            }
            Operand::Memory(addr) => self.write_sized(bus, addr, size, value),
            Operand::Immediate(_) => Err(Exception::IllegalInstruction(self.regs.ird())),
        }
    }
}
