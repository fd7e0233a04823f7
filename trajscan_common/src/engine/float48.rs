//! The controller's 48-bit floating-point word.
//!
//! Layout, most significant bit first:
//!
//! ```text
//! | 36-bit two's-complement mantissa | 12-bit exponent (offset 0x800) |
//! ```
//!
//! A non-zero mantissa magnitude is normalised into `[2^34, 2^35)`, so the
//! represented value is `mantissa * 2^(exponent - 0x800 - 34)`. Zero is the
//! all-zero word. Host tooling uses this to export point sets in the form the
//! controller's memory loader accepts (`$` followed by lowercase hex).

use thiserror::Error;

const MANTISSA_BITS: u32 = 36;
const EXPONENT_BITS: u32 = 12;
const EXPONENT_OFFSET: i32 = 0x800;
const EXPONENT_MASK: u64 = (1 << EXPONENT_BITS) - 1;
const MANTISSA_MASK: u64 = (1 << MANTISSA_BITS) - 1;
/// Position of the normalised leading one inside the mantissa.
const LEAD_BIT: i32 = 34;
const WORD_MASK: u64 = (1 << (MANTISSA_BITS + EXPONENT_BITS)) - 1;

/// Errors raised by the 48-bit word codec.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FloatWordError {
    #[error("value {0} is not finite")]
    NotFinite(f64),

    #[error("word {0:#x} does not fit in 48 bits")]
    WordTooWide(u64),
}

/// Encode `value` as a 48-bit controller word. Excess mantissa precision is
/// truncated.
pub fn encode(value: f64) -> Result<u64, FloatWordError> {
    if !value.is_finite() {
        return Err(FloatWordError::NotFinite(value));
    }
    if value == 0.0 {
        return Ok(0);
    }

    let bits = value.abs().to_bits();
    let biased = ((bits >> 52) & 0x7FF) as i32;
    let fraction = bits & ((1 << 52) - 1);

    // 53-bit significand with the leading one at bit 52, plus its exponent.
    let (significand, exponent) = if biased == 0 {
        let shift = fraction.leading_zeros() - 11;
        (fraction << shift, -1022 - shift as i32)
    } else {
        (fraction | (1 << 52), biased - 1023)
    };

    let magnitude = significand >> (52 - LEAD_BIT);
    let mantissa = if value < 0.0 {
        magnitude.wrapping_neg() & MANTISSA_MASK
    } else {
        magnitude
    };

    // f64 exponents span -1074..=1023, always inside the 12-bit offset range.
    let exponent_field = (exponent + EXPONENT_OFFSET) as u64 & EXPONENT_MASK;
    Ok((mantissa << EXPONENT_BITS) | exponent_field)
}

/// Decode a 48-bit controller word.
pub fn decode(word: u64) -> Result<f64, FloatWordError> {
    if word & !WORD_MASK != 0 {
        return Err(FloatWordError::WordTooWide(word));
    }
    let raw_mantissa = word >> EXPONENT_BITS;
    if raw_mantissa == 0 {
        return Ok(0.0);
    }
    // Sign-extend the 36-bit mantissa.
    let shift = 64 - MANTISSA_BITS;
    let mantissa = ((raw_mantissa << shift) as i64) >> shift;
    let exponent = (word & EXPONENT_MASK) as i32 - EXPONENT_OFFSET;

    Ok(mantissa as f64 * 2f64.powi(exponent - LEAD_BIT))
}

/// Encode and format as the controller's `$hex` literal.
pub fn to_controller_literal(value: f64) -> Result<String, FloatWordError> {
    Ok(format!("${:x}", encode(value)?))
}
