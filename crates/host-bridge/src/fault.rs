//! Deferred bus-fault controller.
//!
//! The embedder may decide that an access must fail at a point where it does
//! not own the engine's call stack (a bus arbiter tick, a peripheral
//! callback, a debugger). The controller parks that request in a single slot
//! and turns it into a [`BusFault`] at the next delivery point. There is no
//! queue: scheduling again before delivery replaces the earlier request.

use thiserror::Error;
use tracing::debug;

use crate::api::CpuView;
use crate::frame::ExceptionFrame;

/// Access code for a faulting read: the R/W bit (bit 4) of the 68000 group-0
/// access-information word.
pub const ACCESS_CODE_READ: u16 = 0x0010;
/// Access code for a faulting write (R/W bit clear).
pub const ACCESS_CODE_WRITE: u16 = 0x0000;

/// Direction of the access a fault is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessKind {
    /// Read cycle.
    Read,
    /// Write cycle.
    Write,
}

impl AccessKind {
    /// Maps the boundary's `is_write` flag onto an access kind.
    #[must_use]
    pub const fn from_is_write(is_write: bool) -> Self {
        if is_write {
            Self::Write
        } else {
            Self::Read
        }
    }

    /// Returns `true` for write cycles.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }

    /// Access-information code placed in the delivered frame.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Read => ACCESS_CODE_READ,
            Self::Write => ACCESS_CODE_WRITE,
        }
    }
}

/// A scheduled, not yet delivered bus fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PendingFault {
    /// Address reported as the faulting access address.
    pub address: u32,
    /// Direction reported in the access code.
    pub access: AccessKind,
}

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaultState {
    /// Nothing pending.
    #[default]
    Idle,
    /// A fault waits for the next delivery point.
    Scheduled,
}

/// Bus fault delivered into the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("bus error at {:#010x} (access code {:#06x})", .frame.addr, .frame.code)]
pub struct BusFault {
    /// Frame stamped at the delivering access.
    pub frame: ExceptionFrame,
}

/// Single-slot deferred fault state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultController {
    pending: Option<PendingFault>,
}

impl FaultController {
    /// Creates an idle controller.
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> FaultState {
        match self.pending {
            Some(_) => FaultState::Scheduled,
            None => FaultState::Idle,
        }
    }

    /// Returns the pending fault without consuming it.
    #[must_use]
    pub const fn pending(&self) -> Option<PendingFault> {
        self.pending
    }

    /// Schedules a fault, replacing any unconsumed one.
    ///
    /// Returns the replaced fault, if there was one.
    pub fn schedule(&mut self, address: u32, access: AccessKind) -> Option<PendingFault> {
        let replaced = self.pending.replace(PendingFault { address, access });
        if let Some(old) = replaced {
            debug!(
                old_address = old.address,
                new_address = address,
                "unconsumed bus fault overwritten"
            );
        } else {
            debug!(address, ?access, "bus fault scheduled");
        }
        replaced
    }

    /// Drops the pending fault without delivering it.
    pub fn clear(&mut self) -> Option<PendingFault> {
        self.pending.take()
    }

    /// Delivery check run after every access and before every sync.
    ///
    /// # Errors
    ///
    /// When a fault is scheduled, clears it and returns it as a [`BusFault`]
    /// whose frame carries the registers reported by `cpu` right now.
    pub fn deliver_if_pending(&mut self, cpu: &dyn CpuView) -> Result<(), BusFault> {
        match self.pending.take() {
            None => Ok(()),
            Some(fault) => {
                let frame = ExceptionFrame::bus_fault(fault, cpu);
                debug!(
                    address = fault.address,
                    pc = frame.pc,
                    ird = frame.ird,
                    "delivering bus fault"
                );
                Err(BusFault { frame })
            }
        }
    }
}
