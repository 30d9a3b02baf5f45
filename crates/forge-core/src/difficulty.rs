//! Compact difficulty decoding and the proof-of-work predicate.

use thiserror::Error;

use crate::hash::{reverse_bytes, Hash256};
use crate::params::ConsensusParams;

/// Reasons a compact `bits` value cannot be used as a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PowError {
    #[error("compact target {0:#010x} is negative")]
    Negative(u32),
    #[error("compact target {0:#010x} overflows 256 bits")]
    Overflow(u32),
    #[error("compact target {0:#010x} is zero")]
    Zero(u32),
    #[error("compact target {bits:#010x} is above the proof-of-work limit {limit:#010x}")]
    AboveLimit { bits: u32, limit: u32 },
}

/// Convert compact "bits" representation to a 256-bit target.
///
/// The bits format is: [exponent (1 byte)][sign (1 bit)][mantissa (23 bits)]
/// Target = mantissa * 256^(exponent - 3)
///
/// The result is a 32-byte big-endian representation of the target.
pub fn bits_to_target(bits: u32) -> Result<[u8; 32], PowError> {
    let exponent = (bits >> 24) as usize;
    let mantissa = bits & 0x007F_FFFF;

    if mantissa != 0 && bits & 0x0080_0000 != 0 {
        return Err(PowError::Negative(bits));
    }

    let mut target = [0u8; 32];

    if exponent <= 3 {
        // Mantissa is shifted right, the value fits in the low 3 bytes
        let value = mantissa >> (8 * (3 - exponent));
        target[29] = (value >> 16) as u8;
        target[30] = (value >> 8) as u8;
        target[31] = value as u8;
        return Ok(target);
    }

    let mantissa_bytes = [(mantissa >> 16) as u8, (mantissa >> 8) as u8, mantissa as u8];
    for (i, byte) in mantissa_bytes.into_iter().enumerate() {
        // Big-endian position is 32 - exponent + i
        if 32 + i < exponent {
            if byte != 0 {
                return Err(PowError::Overflow(bits));
            }
        } else {
            target[32 + i - exponent] = byte;
        }
    }

    Ok(target)
}

/// Check if a big-endian hash meets a big-endian target.
///
/// Returns true if hash <= target.
#[inline]
pub fn hash_meets_target(hash: &[u8; 32], target: &[u8; 32]) -> bool {
    // Lexicographic order on big-endian bytes is numeric order
    hash <= target
}

/// Decode `bits` into a usable target under `params`.
///
/// Beyond [`bits_to_target`], rejects a zero target and any target easier
/// than the proof-of-work limit.
pub fn target_for_bits(bits: u32, params: &ConsensusParams) -> Result<[u8; 32], PowError> {
    let target = bits_to_target(bits)?;
    if target == [0u8; 32] {
        return Err(PowError::Zero(bits));
    }

    let limit = bits_to_target(params.pow_limit_bits)?;
    if !hash_meets_target(&target, &limit) {
        return Err(PowError::AboveLimit {
            bits,
            limit: params.pow_limit_bits,
        });
    }

    Ok(target)
}

/// The hashcash proof-of-work predicate.
///
/// `pow_hash` is in internal (little-endian) byte order. Fails when `bits`
/// does not decode to a usable target for `params`.
pub fn check_proof_of_work(
    pow_hash: &Hash256,
    bits: u32,
    params: &ConsensusParams,
) -> Result<bool, PowError> {
    let target = target_for_bits(bits, params)?;
    Ok(hash_meets_target(&reverse_bytes(pow_hash), &target))
}
