//! Effective gas price helpers.

use alloy_primitives::U256;

/// The percentage byte value meaning the transaction paid its full gas price.
pub const MAX_EFFECTIVE_PERCENTAGE: u8 = u8::MAX;

/// An error computing the effective gas price percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EgpError {
    /// One of the prices is zero.
    #[error("gas price or effective gas price is empty")]
    EmptyPrice,
}

/// Returns the byte encoding of the ratio between the `effective_gas_price` and the `gas_price`
/// declared by a transaction.
///
/// The result is `ceil(effective_gas_price * 256 / gas_price) - 1`, computed with integers only so
/// that it matches the prover's field arithmetic.
pub fn calculate_effective_gas_price_percentage(
    gas_price: U256,
    effective_gas_price: U256,
) -> Result<u8, EgpError> {
    if gas_price.is_zero() || effective_gas_price.is_zero() {
        return Err(EgpError::EmptyPrice)
    }
    if gas_price <= effective_gas_price {
        return Ok(MAX_EFFECTIVE_PERCENTAGE)
    }

    let numerator = effective_gas_price
        .saturating_mul(U256::from(256))
        .saturating_add(gas_price - U256::from(1));
    let percentage = numerator / gas_price - U256::from(1);

    Ok(u8::try_from(percentage).unwrap_or(MAX_EFFECTIVE_PERCENTAGE))
}

/// Returns the effective gas price paid for the provided percentage byte.
pub fn effective_gas_price_from_percentage(gas_price: U256, percentage: u8) -> U256 {
    gas_price * U256::from(percentage as u64 + 1) / U256::from(256)
}
