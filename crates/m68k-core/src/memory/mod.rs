//! Bus-facing address policy: masking, alignment and function codes.

/// Alignment and access-info policy helpers.
pub mod access;

pub use access::{access_info, function_code, is_aligned, AddressSpace, FC_RW_READ};

/// Applies the configured bus mask to an address.
#[must_use]
pub const fn mask_address(addr: u32, mask: u32) -> u32 {
    addr & mask
}
