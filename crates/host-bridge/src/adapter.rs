//! Host adapter: the engine's capability set over an embedder contract.
//!
//! Reads and writes are forwarded verbatim. The delivery check runs only after
//! the callback has returned, so the access completes with its side effects
//! before the fault is signalled, and the frame reflects the engine state of
//! this access rather than the state at scheduling time.

use crate::api::{CpuView, HostBus};
use crate::contract::{BoundCallbacks, CallbackContract, ContractError};
use crate::fault::{AccessKind, BusFault, FaultController, PendingFault};

/// Owns one embedder contract and the deferred fault slot.
#[derive(Debug)]
pub struct HostAdapter<C> {
    callbacks: BoundCallbacks<C>,
    faults: FaultController,
}

impl<C> HostAdapter<C> {
    /// Validates `contract` and builds an idle adapter around it.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when a required callback is absent.
    pub fn new(contract: CallbackContract<C>) -> Result<Self, ContractError> {
        Ok(Self {
            callbacks: contract.bind()?,
            faults: FaultController::new(),
        })
    }

    /// Schedules a bus fault for the next access or sync.
    ///
    /// Returns the unconsumed fault this one replaced, if any.
    pub fn schedule_bus_fault(&mut self, address: u32, access: AccessKind) -> Option<PendingFault> {
        self.faults.schedule(address, access)
    }

    /// Drops the pending fault without delivering it.
    pub fn clear_pending_fault(&mut self) -> Option<PendingFault> {
        self.faults.clear()
    }

    /// Deferred fault controller.
    #[must_use]
    pub const fn faults(&self) -> &FaultController {
        &self.faults
    }

    /// Validated callback set.
    #[must_use]
    pub const fn callbacks(&self) -> &BoundCallbacks<C> {
        &self.callbacks
    }

    /// Shared access to the embedder context.
    #[must_use]
    pub const fn context(&self) -> &C {
        self.callbacks.context()
    }

    /// Exclusive access to the embedder context.
    pub fn context_mut(&mut self) -> &mut C {
        self.callbacks.context_mut()
    }

    /// Consumes the adapter and releases the embedder context.
    pub fn into_context(self) -> C {
        self.callbacks.into_context()
    }
}

impl<C> HostBus for HostAdapter<C> {
    fn read8(&mut self, cpu: &dyn CpuView, addr: u32) -> Result<u8, BusFault> {
        let value = self.callbacks.read8(addr);
        self.faults.deliver_if_pending(cpu)?;
        Ok(value)
    }

    fn read16(&mut self, cpu: &dyn CpuView, addr: u32) -> Result<u16, BusFault> {
        let value = self.callbacks.read16(addr);
        self.faults.deliver_if_pending(cpu)?;
        Ok(value)
    }

    fn write8(&mut self, cpu: &dyn CpuView, addr: u32, value: u8) -> Result<(), BusFault> {
        self.callbacks.write8(addr, value);
        self.faults.deliver_if_pending(cpu)
    }

    fn write16(&mut self, cpu: &dyn CpuView, addr: u32, value: u16) -> Result<(), BusFault> {
        self.callbacks.write16(addr, value);
        self.faults.deliver_if_pending(cpu)
    }

    // A fault scheduled from inside the sync callback waits for the next
    // access.
    fn sync(&mut self, cpu: &dyn CpuView, cycles: i32) -> Result<(), BusFault> {
        self.faults.deliver_if_pending(cpu)?;
        self.callbacks.sync(cycles);
        Ok(())
    }

    fn read_irq_user_vector(&mut self, level: u8) -> u16 {
        self.callbacks.read_irq_user_vector(level).unwrap_or(0)
    }

    fn peek16(&mut self, addr: u32) -> u16 {
        self.callbacks.read16(addr)
    }
}
