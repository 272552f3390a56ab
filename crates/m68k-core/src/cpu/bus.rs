//! Sized transfers, prefetch and stack operations over the host bus.

use host_bridge::{AccessKind, ExceptionFrame, HostBus};

use super::Core;
use crate::decoder::Size;
use crate::fault::Exception;
use crate::memory::{access_info, function_code, is_aligned, mask_address, AddressSpace};

impl Core {
    const fn bus_address(&self, addr: u32) -> u32 {
        mask_address(addr, self.config.address_mask)
    }

    fn address_error(&self, addr: u32, access: AccessKind, space: AddressSpace) -> Exception {
        let fc = function_code(self.regs.supervisor(), space);
        Exception::AddressError(ExceptionFrame {
            code: access_info(self.regs.ird(), access, fc),
            addr: self.bus_address(addr),
            ird: self.regs.ird(),
            sr: self.regs.sr(),
            pc: self.regs.pc(),
            fc,
            ssw: 0,
        })
    }

    fn check_alignment(
        &self,
        addr: u32,
        size: Size,
        access: AccessKind,
        space: AddressSpace,
    ) -> Result<(), Exception> {
        if is_aligned(addr, size) {
            Ok(())
        } else {
            Err(self.address_error(addr, access, space))
        }
    }

    pub(crate) fn read_byte(&mut self, bus: &mut dyn HostBus, addr: u32) -> Result<u8, Exception> {
        Ok(bus.read8(&self.regs, self.bus_address(addr))?)
    }

    pub(crate) fn read_word(&mut self, bus: &mut dyn HostBus, addr: u32) -> Result<u16, Exception> {
        self.check_alignment(addr, Size::Word, AccessKind::Read, AddressSpace::Data)?;
        Ok(bus.read16(&self.regs, self.bus_address(addr))?)
    }

    pub(crate) fn read_long(&mut self, bus: &mut dyn HostBus, addr: u32) -> Result<u32, Exception> {
        let high = self.read_word(bus, addr)?;
        let low = self.read_word(bus, addr.wrapping_add(2))?;
        Ok((u32::from(high) << 16) | u32::from(low))
    }

    pub(crate) fn write_byte(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        value: u8,
    ) -> Result<(), Exception> {
        Ok(bus.write8(&self.regs, self.bus_address(addr), value)?)
    }

    pub(crate) fn write_word(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        value: u16,
    ) -> Result<(), Exception> {
        self.check_alignment(addr, Size::Word, AccessKind::Write, AddressSpace::Data)?;
        Ok(bus.write16(&self.regs, self.bus_address(addr), value)?)
    }

    pub(crate) fn write_long(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        value: u32,
    ) -> Result<(), Exception> {
        let [b0, b1, b2, b3] = value.to_be_bytes();
        self.write_word(bus, addr, u16::from_be_bytes([b0, b1]))?;
        self.write_word(bus, addr.wrapping_add(2), u16::from_be_bytes([b2, b3]))
    }

    /// Reads an operand of `size`; the value is zero-extended.
    pub(crate) fn read_sized(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        size: Size,
    ) -> Result<u32, Exception> {
        match size {
            Size::Byte => self.read_byte(bus, addr).map(u32::from),
            Size::Word => self.read_word(bus, addr).map(u32::from),
            Size::Long => self.read_long(bus, addr),
        }
    }

    /// Writes the low `size` bits of `value`.
    pub(crate) fn write_sized(
        &mut self,
        bus: &mut dyn HostBus,
        addr: u32,
        size: Size,
        value: u32,
    ) -> Result<(), Exception> {
        let [_, _, b2, b3] = value.to_be_bytes();
        match size {
            Size::Byte => self.write_byte(bus, addr, b3),
            Size::Word => self.write_word(bus, addr, u16::from_be_bytes([b2, b3])),
            Size::Long => self.write_long(bus, addr, value),
        }
    }

    /// Refills `IRC` with the word at `PC`.
    pub(crate) fn prefetch(&mut self, bus: &mut dyn HostBus) -> Result<(), Exception> {
        let pc = self.regs.pc();
        self.check_alignment(pc, Size::Word, AccessKind::Read, AddressSpace::Program)?;
        let word = bus.read16(&self.regs, self.bus_address(pc))?;
        self.regs.set_irc(word);
        Ok(())
    }

    /// Consumes the extension word in `IRC` and prefetches the next one.
    pub(crate) fn next_word(&mut self, bus: &mut dyn HostBus) -> Result<u16, Exception> {
        let word = self.regs.irc();
        self.regs.set_pc(self.regs.pc().wrapping_add(2));
        self.prefetch(bus)?;
        Ok(word)
    }

    /// Consumes two extension words as a long.
    pub(crate) fn next_long(&mut self, bus: &mut dyn HostBus) -> Result<u32, Exception> {
        let high = self.next_word(bus)?;
        let low = self.next_word(bus)?;
        Ok((u32::from(high) << 16) | u32::from(low))
    }

    /// Transfers control to `target` and refills the prefetch queue.
    pub(crate) fn jump(&mut self, bus: &mut dyn HostBus, target: u32) -> Result<(), Exception> {
        self.regs.set_pc(target);
        self.prefetch(bus)
    }

    pub(crate) fn push_word(&mut self, bus: &mut dyn HostBus, value: u16) -> Result<(), Exception> {
        let sp = self.regs.sp().wrapping_sub(2);
        self.regs.set_sp(sp);
        self.write_word(bus, sp, value)
    }

    pub(crate) fn push_long(&mut self, bus: &mut dyn HostBus, value: u32) -> Result<(), Exception> {
        let sp = self.regs.sp().wrapping_sub(4);
        self.regs.set_sp(sp);
        self.write_long(bus, sp, value)
    }

    pub(crate) fn pop_word(&mut self, bus: &mut dyn HostBus) -> Result<u16, Exception> {
        let sp = self.regs.sp();
        let value = self.read_word(bus, sp)?;
        self.regs.set_sp(sp.wrapping_add(2));
        Ok(value)
    }

    pub(crate) fn pop_long(&mut self, bus: &mut dyn HostBus) -> Result<u32, Exception> {
        let sp = self.regs.sp();
        let value = self.read_long(bus, sp)?;
        self.regs.set_sp(sp.wrapping_add(4));
        Ok(value)
    }
}
