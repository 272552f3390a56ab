//! Host bridge between a cycle-stepped 68000 engine and an embedder.
//!
//! The embedder supplies memory and interrupt behavior as a
//! [`CallbackContract`]. A [`HostAdapter`] owns that contract and exposes it
//! to the engine as the [`HostBus`] capability set. Bus faults detected by the
//! embedder outside the engine's call stack are parked in a
//! [`FaultController`] and surface as a [`BusFault`] from the next memory
//! access or sync call, stamped with the engine registers of that access.
//!
//! [`Machine`] ties an [`Engine`] and an adapter together and is the safe
//! boundary surface the flat C ABI is built on.

/// Engine-facing capability contracts and machine configuration.
pub mod api;
pub use api::{CpuView, Engine, HostBus, IrqMode, MachineConfig};

/// Embedder callback contract and construction-time validation.
pub mod contract;
pub use contract::{
    BoundCallbacks, CallbackContract, CallbackSlot, ContractError, IrqVectorFn, Read16Fn,
    Read8Fn, SyncFn, Write16Fn, Write8Fn,
};

/// Deferred bus-fault state machine.
pub mod fault;
pub use fault::{
    AccessKind, BusFault, FaultController, FaultState, PendingFault, ACCESS_CODE_READ,
    ACCESS_CODE_WRITE,
};

/// Exception-frame snapshots of engine state.
pub mod frame;
pub use frame::{CpuSnapshot, ExceptionFrame};

/// Capability-set implementation over an embedder contract.
pub mod adapter;
pub use adapter::HostAdapter;

/// Safe boundary surface over an engine and its host adapter.
pub mod machine;
pub use machine::Machine;

/// Hex dump and status-register text helpers.
pub mod text;
pub use text::{dump16, dump24, dump32, dump8, format_sr};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
