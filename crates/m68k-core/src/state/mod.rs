//! Architectural CPU state model primitives.

/// Programmer-visible register file and `SR` bit layout.
pub mod registers;

pub use registers::{
    Registers, ADDRESS_REGISTER_COUNT, CCR_MASK, DATA_REGISTER_COUNT, SR_C, SR_IPL, SR_MASK, SR_N,
    SR_RESET, SR_S, SR_T, SR_V, SR_X, SR_Z,
};

/// Execution state of the core as seen by the step loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Fetching and executing instructions.
    #[default]
    Running,
    /// Parked by `STOP` until an interrupt above the mask arrives.
    Stopped,
    /// Halted by a double fault or a failed reset; only reset recovers.
    Halted,
}

impl RunState {
    /// Returns `true` when the next step executes an instruction.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}
