use host_bridge::{BusFault, ExceptionFrame};
use thiserror::Error;

/// Vector number of the bus error exception.
pub const VECTOR_BUS_ERROR: u8 = 2;
/// Vector number of the address error exception.
pub const VECTOR_ADDRESS_ERROR: u8 = 3;
/// Vector number of the illegal instruction exception.
pub const VECTOR_ILLEGAL: u8 = 4;
/// Vector number of the privilege violation exception.
pub const VECTOR_PRIVILEGE: u8 = 8;
/// Vector number of the line 1010 emulator exception.
pub const VECTOR_LINE_A: u8 = 10;
/// Vector number of the line 1111 emulator exception.
pub const VECTOR_LINE_F: u8 = 11;
/// Vector number of the spurious interrupt; autovectors follow it.
pub const VECTOR_SPURIOUS: u8 = 24;
/// Vector number of `TRAP #0`.
pub const VECTOR_TRAP_BASE: u8 = 32;

/// Exception raised while executing an instruction.
///
/// Group 0 variants carry the frame pushed on the supervisor stack. The rest
/// carry the opcode or trap number that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Exception {
    /// Host-signalled bus error.
    #[error(transparent)]
    BusError(#[from] BusFault),
    /// Word or long access at an odd address.
    #[error("address error at {:#010x}", .0.addr)]
    AddressError(ExceptionFrame),
    /// Opcode outside the implemented instruction set.
    #[error("illegal instruction {0:#06x}")]
    IllegalInstruction(u16),
    /// Opcode in the `$Axxx` line.
    #[error("line 1010 emulator trap {0:#06x}")]
    LineA(u16),
    /// Opcode in the `$Fxxx` line.
    #[error("line 1111 emulator trap {0:#06x}")]
    LineF(u16),
    /// Privileged instruction executed in user mode.
    #[error("privilege violation by {0:#06x}")]
    PrivilegeViolation(u16),
    /// `TRAP #n`.
    #[error("trap #{0}")]
    Trap(u8),
}

impl Exception {
    /// Exception vector number.
    #[must_use]
    pub const fn vector(&self) -> u8 {
        match self {
            Self::BusError(_) => VECTOR_BUS_ERROR,
            Self::AddressError(_) => VECTOR_ADDRESS_ERROR,
            Self::IllegalInstruction(_) => VECTOR_ILLEGAL,
            Self::LineA(_) => VECTOR_LINE_A,
            Self::LineF(_) => VECTOR_LINE_F,
            Self::PrivilegeViolation(_) => VECTOR_PRIVILEGE,
            Self::Trap(n) => VECTOR_TRAP_BASE + (*n & 0x0F),
        }
    }

    /// Frame of a group 0 exception, `None` for groups 1 and 2.
    #[must_use]
    pub const fn group0_frame(&self) -> Option<ExceptionFrame> {
        match self {
            Self::BusError(fault) => Some(fault.frame),
            Self::AddressError(frame) => Some(*frame),
            Self::IllegalInstruction(_)
            | Self::LineA(_)
            | Self::LineF(_)
            | Self::PrivilegeViolation(_)
            | Self::Trap(_) => None,
        }
    }

    /// Returns `true` when the stacked `PC` points at the faulting
    /// instruction rather than the one after it.
    #[must_use]
    pub const fn returns_to_faulting_instruction(&self) -> bool {
        !matches!(self, Self::Trap(_))
    }
}
