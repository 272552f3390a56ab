//! Embedder callback contract.
//!
//! A contract is an opaque context value plus function references. Four
//! references are required (byte/word read and write); `sync` and
//! `read_irq_user_vector` are optional and fall back to built-in behavior.
//! [`CallbackContract::bind`] validates the whole set at once, so a
//! partially usable adapter can never be observed.

use std::fmt;

use thiserror::Error;

/// Byte read callback.
pub type Read8Fn<C> = fn(&mut C, u32) -> u8;
/// Word read callback.
pub type Read16Fn<C> = fn(&mut C, u32) -> u16;
/// Byte write callback.
pub type Write8Fn<C> = fn(&mut C, u32, u8);
/// Word write callback.
pub type Write16Fn<C> = fn(&mut C, u32, u16);
/// Cycle pacing callback.
pub type SyncFn<C> = fn(&mut C, i32);
/// Interrupt user-vector lookup callback.
pub type IrqVectorFn<C> = fn(&mut C, u8) -> u16;

/// Callback slots of a contract, in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackSlot {
    /// `read8`, required.
    Read8,
    /// `read16`, required.
    Read16,
    /// `write8`, required.
    Write8,
    /// `write16`, required.
    Write16,
    /// `sync`, optional.
    Sync,
    /// `read_irq_user_vector`, optional.
    ReadIrqUserVector,
}

impl CallbackSlot {
    /// Slots that must be present for construction to succeed.
    pub const REQUIRED: [Self; 4] = [Self::Read8, Self::Read16, Self::Write8, Self::Write16];

    /// Field name of the slot.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Read8 => "read8",
            Self::Read16 => "read16",
            Self::Write8 => "write8",
            Self::Write16 => "write16",
            Self::Sync => "sync",
            Self::ReadIrqUserVector => "read_irq_user_vector",
        }
    }

    /// Returns `true` for the four memory slots.
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(
            self,
            Self::Read8 | Self::Read16 | Self::Write8 | Self::Write16
        )
    }
}

impl fmt::Display for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Construction failure for a host adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ContractError {
    /// A required callback reference was absent.
    #[error("required callback `{0}` is missing")]
    MissingCallback(CallbackSlot),
}

/// Unvalidated callback contract as supplied by an embedder.
#[derive(Debug, Clone)]
pub struct CallbackContract<C> {
    /// Opaque context passed to every callback.
    pub context: C,
    /// Byte read.
    pub read8: Option<Read8Fn<C>>,
    /// Word read.
    pub read16: Option<Read16Fn<C>>,
    /// Byte write.
    pub write8: Option<Write8Fn<C>>,
    /// Word write.
    pub write16: Option<Write16Fn<C>>,
    /// Cycle pacing.
    pub sync: Option<SyncFn<C>>,
    /// Interrupt user-vector lookup.
    pub read_irq_user_vector: Option<IrqVectorFn<C>>,
}

impl<C> CallbackContract<C> {
    /// Creates a contract around `context` with every slot empty.
    #[must_use]
    pub const fn new(context: C) -> Self {
        Self {
            context,
            read8: None,
            read16: None,
            write8: None,
            write16: None,
            sync: None,
            read_irq_user_vector: None,
        }
    }

    /// Fills the `read8` slot.
    #[must_use]
    pub fn with_read8(mut self, f: Read8Fn<C>) -> Self {
        self.read8 = Some(f);
        self
    }

    /// Fills the `read16` slot.
    #[must_use]
    pub fn with_read16(mut self, f: Read16Fn<C>) -> Self {
        self.read16 = Some(f);
        self
    }

    /// Fills the `write8` slot.
    #[must_use]
    pub fn with_write8(mut self, f: Write8Fn<C>) -> Self {
        self.write8 = Some(f);
        self
    }

    /// Fills the `write16` slot.
    #[must_use]
    pub fn with_write16(mut self, f: Write16Fn<C>) -> Self {
        self.write16 = Some(f);
        self
    }

    /// Fills the optional `sync` slot.
    #[must_use]
    pub fn with_sync(mut self, f: SyncFn<C>) -> Self {
        self.sync = Some(f);
        self
    }

    /// Fills the optional `read_irq_user_vector` slot.
    #[must_use]
    pub fn with_read_irq_user_vector(mut self, f: IrqVectorFn<C>) -> Self {
        self.read_irq_user_vector = Some(f);
        self
    }

    /// Validates the contract.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::MissingCallback`] naming the first absent
    /// required slot in field order.
    pub fn bind(self) -> Result<BoundCallbacks<C>, ContractError> {
        let missing = ContractError::MissingCallback;
        Ok(BoundCallbacks {
            read8: self.read8.ok_or(missing(CallbackSlot::Read8))?,
            read16: self.read16.ok_or(missing(CallbackSlot::Read16))?,
            write8: self.write8.ok_or(missing(CallbackSlot::Write8))?,
            write16: self.write16.ok_or(missing(CallbackSlot::Write16))?,
            sync: self.sync,
            read_irq_user_vector: self.read_irq_user_vector,
            context: self.context,
        })
    }
}

/// Validated contract: every required slot is present.
#[derive(Debug)]
pub struct BoundCallbacks<C> {
    context: C,
    read8: Read8Fn<C>,
    read16: Read16Fn<C>,
    write8: Write8Fn<C>,
    write16: Write16Fn<C>,
    sync: Option<SyncFn<C>>,
    read_irq_user_vector: Option<IrqVectorFn<C>>,
}

impl<C> BoundCallbacks<C> {
    /// Shared access to the embedder context.
    #[must_use]
    pub const fn context(&self) -> &C {
        &self.context
    }

    /// Exclusive access to the embedder context.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Releases the embedder context.
    pub fn into_context(self) -> C {
        self.context
    }

    /// Returns `true` when a sync callback was supplied.
    #[must_use]
    pub const fn has_sync(&self) -> bool {
        self.sync.is_some()
    }

    /// Returns `true` when an interrupt vector callback was supplied.
    #[must_use]
    pub const fn has_irq_user_vector(&self) -> bool {
        self.read_irq_user_vector.is_some()
    }

    /// Forwards a byte read.
    pub fn read8(&mut self, addr: u32) -> u8 {
        (self.read8)(&mut self.context, addr)
    }

    /// Forwards a word read.
    pub fn read16(&mut self, addr: u32) -> u16 {
        (self.read16)(&mut self.context, addr)
    }

    /// Forwards a byte write.
    pub fn write8(&mut self, addr: u32, value: u8) {
        (self.write8)(&mut self.context, addr, value);
    }

    /// Forwards a word write.
    pub fn write16(&mut self, addr: u32, value: u16) {
        (self.write16)(&mut self.context, addr, value);
    }

    /// Forwards to the sync callback. Returns `false` when none was supplied.
    pub fn sync(&mut self, cycles: i32) -> bool {
        match self.sync {
            Some(sync) => {
                sync(&mut self.context, cycles);
                true
            }
            None => false,
        }
    }

    /// Forwards an interrupt vector lookup, or `None` when no callback was
    /// supplied.
    pub fn read_irq_user_vector(&mut self, level: u8) -> Option<u16> {
        self.read_irq_user_vector
            .map(|lookup| lookup(&mut self.context, level))
    }
}
