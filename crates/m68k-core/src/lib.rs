//! Compact 68000 reference engine for the host bridge.
//!
//! [`Core`] implements [`host_bridge::Engine`] for a subset of the 68000:
//! the reset sequence, data movement, branches and subroutines, traps and
//! the full group 0/1/2 exception model including bus errors delivered by
//! the host, address errors, privilege violations and interrupts. Every
//! memory access goes through [`host_bridge::HostBus`].

/// Host-facing engine configuration.
pub mod api;
pub use api::{CoreConfig, DEFAULT_ADDRESS_MASK};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{Registers, RunState};

/// Exception taxonomy and vector numbers.
pub mod fault;
pub use fault::{
    Exception, VECTOR_ADDRESS_ERROR, VECTOR_BUS_ERROR, VECTOR_ILLEGAL, VECTOR_LINE_A,
    VECTOR_LINE_F, VECTOR_PRIVILEGE, VECTOR_SPURIOUS, VECTOR_TRAP_BASE,
};

/// Opcode decoder for the implemented subset.
pub mod decoder;
pub use decoder::{decode, Condition, Ea, Instruction, Size};

/// Address masking, alignment and access-info policy.
pub mod memory;

/// Deterministic instruction cycle-cost table and lookup helpers.
pub mod timing;
pub use timing::{cycle_cost, CycleCostKind, CYCLE_COST_TABLE};

/// Instruction execution.
pub mod execute;
pub use execute::{sign_extend_byte, sign_extend_word, Operand};

/// Motorola-syntax disassembler.
pub mod disasm;
pub use disasm::{
    disassemble, disassemble_masked, disassemble_one, disassemble_one_masked, disassemble_window,
    DisassemblyRow,
};

/// The core and its step loop.
pub mod cpu;
pub use cpu::Core;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
