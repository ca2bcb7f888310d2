//! Amount and commitment helpers

use barter_escrow::{EscrowError, Field};
use solana_sdk::commitment_config::CommitmentLevel;

use crate::error::{SdkError, SdkResult};

/// Convert a decimal quantity into base units, e.g. `"2.5"` with 9 decimals is
/// 2_500_000_000. Overflow is reported against `field`, never wrapped.
pub fn parse_amount(value: &str, decimals: u8, field: Field) -> SdkResult<u64> {
    let value = value.trim();
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (value, ""),
    };

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(SdkError::Configuration(format!(
            "invalid amount {value:?} for {field}"
        )));
    }
    if fraction.len() > decimals as usize {
        return Err(SdkError::Configuration(format!(
            "amount {value:?} for {field} has more than {decimals} fractional digits"
        )));
    }

    let overflow = || SdkError::Escrow(EscrowError::AmountOverflow { field });
    let scale = 10u64.checked_pow(decimals as u32).ok_or_else(overflow)?;
    let whole = accumulate(whole).ok_or_else(overflow)?;
    // fraction.len() <= decimals, so this exponent cannot exceed the scale's
    let fraction_scale = 10u64
        .checked_pow((decimals as usize - fraction.len()) as u32)
        .ok_or_else(overflow)?;
    let fraction = accumulate(fraction).ok_or_else(overflow)?;

    whole
        .checked_mul(scale)
        .and_then(|base| {
            fraction
                .checked_mul(fraction_scale)
                .and_then(|fraction| base.checked_add(fraction))
        })
        .ok_or_else(overflow)
}

fn accumulate(digits: &str) -> Option<u64> {
    digits.bytes().try_fold(0u64, |acc, digit| {
        acc.checked_mul(10)?.checked_add((digit - b'0') as u64)
    })
}

/// Parse `processed`, `confirmed` or `finalized`
pub fn parse_commitment(value: &str) -> SdkResult<CommitmentLevel> {
    match value {
        "processed" => Ok(CommitmentLevel::Processed),
        "confirmed" => Ok(CommitmentLevel::Confirmed),
        "finalized" => Ok(CommitmentLevel::Finalized),
        other => Err(SdkError::Configuration(format!(
            "unknown commitment level {other:?}"
        ))),
    }
}
