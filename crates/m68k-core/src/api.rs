//! Host-facing configuration of the reference engine.

use host_bridge::IrqMode;

/// Address lines driven by the 68000.
pub const DEFAULT_ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Top-level configuration for a core instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Source of interrupt vectors.
    pub irq_mode: IrqMode,
    /// Mask applied to every address before it reaches the host.
    pub address_mask: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            irq_mode: IrqMode::Auto,
            address_mask: DEFAULT_ADDRESS_MASK,
        }
    }
}
