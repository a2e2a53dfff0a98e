//! Trading-lot rounding.
//!
//! Orders on this market are placed in whole lots of [`LOT_SIZE`] shares.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Minimum tradable increment of shares.
pub const LOT_SIZE: i64 = 100;

/// Floor `quantity` to a multiple of [`LOT_SIZE`].
///
/// Floors toward negative infinity, so `round_lot(-1) == -100`. Values
/// outside the `i64` range saturate to the largest representable lot
/// multiple of the same sign.
pub fn round_lot(quantity: Decimal) -> i64 {
    let lot = Decimal::from(LOT_SIZE);
    let lots = (quantity / lot).floor();
    let saturated = if quantity.is_sign_negative() {
        (i64::MIN / LOT_SIZE) * LOT_SIZE
    } else {
        (i64::MAX / LOT_SIZE) * LOT_SIZE
    };
    lots.to_i64()
        .and_then(|n| n.checked_mul(LOT_SIZE))
        .unwrap_or(saturated)
}

/// Lot rounding for share counts that can only be bought or held.
///
/// Negative desired quantities map to zero instead of a negative lot.
pub fn round_lot_clamped(quantity: Decimal) -> u64 {
    let lots = round_lot(quantity);
    if lots <= 0 {
        0
    } else {
        lots as u64
    }
}
