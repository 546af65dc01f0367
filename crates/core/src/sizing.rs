//! Buffer sizing from a percentage of available memory

use crate::error::{Error, Result};

/// Compute `floor(available * percent / 100)`.
///
/// The product is taken in `u128`, so no `u64` reading can overflow.
///
/// # Errors
///
/// `InvalidConfig` if `percent` is outside `1..=100` or `available` is zero.
pub fn size_for(percent: u8, available: u64) -> Result<u64> {
    if percent == 0 || percent > 100 {
        return Err(Error::invalid_config(format!(
            "memory percent must be in 1..=100, got {}",
            percent
        )));
    }
    if available == 0 {
        return Err(Error::invalid_config("available memory must be positive"));
    }
    let bytes = (available as u128 * percent as u128) / 100;
    // percent <= 100, so the quotient never exceeds `available`
    Ok(bytes as u64)
}

/// Size the stress buffer in bytes, ready to allocate.
///
/// On top of [`size_for`], rejects an empty buffer (nothing to stress) and a
/// length that does not fit the address space.
pub fn buffer_len(percent: u8, available: u64) -> Result<usize> {
    let bytes = size_for(percent, available)?;
    if bytes == 0 {
        return Err(Error::invalid_config(format!(
            "{}% of {} bytes leaves an empty buffer",
            percent, available
        )));
    }
    usize::try_from(bytes).map_err(|_| Error::AddressSpace { requested: bytes })
}
