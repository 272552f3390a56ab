//! Alignment policy and group 0 access-info encoding.

use host_bridge::AccessKind;

use crate::decoder::Size;

/// Read flag in the access-info word of a group 0 frame.
pub const FC_RW_READ: u16 = 0x0010;

/// Address space selected by the function code pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSpace {
    /// Operand accesses.
    Data,
    /// Opcode and extension word fetches.
    Program,
}

/// Returns `true` when an access of `size` at `addr` is legal on the 68000.
///
/// Byte accesses are always aligned; word and long accesses need an even
/// address.
#[must_use]
pub const fn is_aligned(addr: u32, size: Size) -> bool {
    matches!(size, Size::Byte) || addr & 1 == 0
}

/// Function code driven for an access.
#[must_use]
pub const fn function_code(supervisor: bool, space: AddressSpace) -> u16 {
    match (supervisor, space) {
        (false, AddressSpace::Data) => 1,
        (false, AddressSpace::Program) => 2,
        (true, AddressSpace::Data) => 5,
        (true, AddressSpace::Program) => 6,
    }
}

/// Access-info word of an address error frame: the opcode's upper bits, the
/// R/W flag and the function code.
#[must_use]
pub const fn access_info(ird: u16, access: AccessKind, fc: u16) -> u16 {
    let rw = match access {
        AccessKind::Read => FC_RW_READ,
        AccessKind::Write => 0,
    };
    (ird & 0xFFE0) | rw | (fc & 7)
}
