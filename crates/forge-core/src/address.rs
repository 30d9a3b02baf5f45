//! Address decoding into payment destinations and their scriptPubKeys.
//!
//! Supports:
//! - P2PKH (Pay to Public Key Hash) - Legacy addresses starting with 1 (mainnet) or m/n (regtest)
//! - P2SH (Pay to Script Hash) - Addresses starting with 3 (mainnet) or 2 (regtest)
//! - P2WPKH (Pay to Witness Public Key Hash) - Native SegWit v0, bc1q.../bcrt1q...
//! - P2WSH (Pay to Witness Script Hash) - Native SegWit v0, bc1q... (32-byte program)
//! - P2TR (Pay to Taproot) - SegWit v1, bc1p.../bcrt1p...

use thiserror::Error;

use crate::hash::double_sha256;
use crate::network::Network;
use crate::script::{ScriptBuilder, OP_0, OP_1, OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160};

/// Address decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid address format")]
    InvalidFormat,
    #[error("Invalid Base58 character: {0}")]
    InvalidBase58Char(char),
    #[error("Invalid checksum")]
    InvalidChecksum,
    #[error("Invalid Bech32 encoding: {0}")]
    InvalidBech32(String),
    #[error("Invalid witness version: {0}")]
    InvalidWitnessVersion(u8),
    #[error("Invalid witness program length: {0}")]
    InvalidWitnessProgramLength(usize),
    #[error("Address network mismatch: expected {expected}")]
    NetworkMismatch { expected: Network },
    #[error("Unsupported address type")]
    UnsupportedType,
}

/// Where an output pays to, decoded from an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Legacy P2PKH: OP_DUP OP_HASH160 <20-byte-hash> OP_EQUALVERIFY OP_CHECKSIG
    PubKeyHash([u8; 20]),
    /// P2SH: OP_HASH160 <20-byte-hash> OP_EQUAL
    ScriptHash([u8; 20]),
    /// Native SegWit v0 P2WPKH: OP_0 <20-byte-hash>
    WitnessV0KeyHash([u8; 20]),
    /// Native SegWit v0 P2WSH: OP_0 <32-byte-hash>
    WitnessV0ScriptHash([u8; 32]),
    /// Taproot P2TR: OP_1 <32-byte-x-only-pubkey>
    Taproot([u8; 32]),
}

impl Destination {
    /// Get the display name for this destination type.
    pub fn name(&self) -> &'static str {
        match self {
            Destination::PubKeyHash(_) => "P2PKH",
            Destination::ScriptHash(_) => "P2SH",
            Destination::WitnessV0KeyHash(_) => "P2WPKH",
            Destination::WitnessV0ScriptHash(_) => "P2WSH",
            Destination::Taproot(_) => "P2TR",
        }
    }
}

/// Render the scriptPubKey paying to `destination`.
pub fn script_for_destination(destination: &Destination) -> Vec<u8> {
    match destination {
        Destination::PubKeyHash(hash) => ScriptBuilder::new()
            .push_opcode(OP_DUP)
            .push_opcode(OP_HASH160)
            .push_slice(hash)
            .push_opcode(OP_EQUALVERIFY)
            .push_opcode(OP_CHECKSIG)
            .into_bytes(),
        Destination::ScriptHash(hash) => ScriptBuilder::new()
            .push_opcode(OP_HASH160)
            .push_slice(hash)
            .push_opcode(OP_EQUAL)
            .into_bytes(),
        Destination::WitnessV0KeyHash(program) => witness_script(OP_0, program),
        Destination::WitnessV0ScriptHash(program) => witness_script(OP_0, program),
        Destination::Taproot(program) => witness_script(OP_1, program),
    }
}

fn witness_script(version_opcode: u8, program: &[u8]) -> Vec<u8> {
    ScriptBuilder::new()
        .push_opcode(version_opcode)
        .push_slice(program)
        .into_bytes()
}

/// Decode an address for `expected_network` into a destination.
pub fn decode_destination(address: &str, expected_network: Network) -> Result<Destination, AddressError> {
    let trimmed = address.trim();
    let lower = trimmed.to_lowercase();

    // Bech32/Bech32m: bc1.../bcrt1...
    if ["bc1", "bcrt1"].iter().any(|prefix| lower.starts_with(prefix)) {
        return decode_bech32_destination(trimmed, expected_network);
    }

    // Base58Check: 1.../3.../m.../n.../2...
    decode_base58_destination(trimmed, expected_network)
}

/// Decode a Base58Check encoded address (P2PKH or P2SH).
fn decode_base58_destination(address: &str, expected_network: Network) -> Result<Destination, AddressError> {
    let decoded = base58_decode(address)?;

    if decoded.len() < 5 {
        return Err(AddressError::InvalidFormat);
    }

    // Verify checksum (last 4 bytes)
    let (payload, checksum) = decoded.split_at(decoded.len() - 4);
    if checksum != &double_sha256(payload)[..4] {
        return Err(AddressError::InvalidChecksum);
    }

    let version = payload[0];
    let hash: [u8; 20] = payload[1..]
        .try_into()
        .map_err(|_| AddressError::InvalidFormat)?;

    if version == expected_network.p2pkh_version() {
        Ok(Destination::PubKeyHash(hash))
    } else if version == expected_network.p2sh_version() {
        Ok(Destination::ScriptHash(hash))
    } else if is_known_base58_version(version) {
        Err(AddressError::NetworkMismatch {
            expected: expected_network,
        })
    } else {
        Err(AddressError::InvalidFormat)
    }
}

fn is_known_base58_version(version: u8) -> bool {
    [Network::Mainnet, Network::Regtest]
        .iter()
        .any(|network| version == network.p2pkh_version() || version == network.p2sh_version())
}

/// Decode a Bech32/Bech32m encoded address (P2WPKH, P2WSH, or P2TR).
fn decode_bech32_destination(address: &str, expected_network: Network) -> Result<Destination, AddressError> {
    let (hrp, data, variant) = bech32_decode(address)?;

    if hrp != expected_network.bech32_hrp() {
        return match hrp.as_str() {
            "bc" | "bcrt" => Err(AddressError::NetworkMismatch {
                expected: expected_network,
            }),
            _ => Err(AddressError::InvalidBech32(format!("Unknown HRP: {}", hrp))),
        };
    }

    if data.is_empty() {
        return Err(AddressError::InvalidFormat);
    }

    // First 5-bit group is the witness version
    let witness_version = data[0];

    // Convert remaining 5-bit data to 8-bit
    let program = convert_bits(&data[1..], 5, 8, false)?;

    match witness_version {
        0 => {
            // SegWit v0 must use Bech32 (not Bech32m)
            if variant != Bech32Variant::Bech32 {
                return Err(AddressError::InvalidBech32("SegWit v0 must use Bech32".into()));
            }
        }
        1..=16 => {
            // SegWit v1+ must use Bech32m
            if variant != Bech32Variant::Bech32m {
                return Err(AddressError::InvalidBech32("SegWit v1+ must use Bech32m".into()));
            }
        }
        _ => return Err(AddressError::InvalidWitnessVersion(witness_version)),
    }

    match (witness_version, program.len()) {
        (0, 20) => Ok(Destination::WitnessV0KeyHash(to_array(&program)?)),
        (0, 32) => Ok(Destination::WitnessV0ScriptHash(to_array(&program)?)),
        (1, 32) => Ok(Destination::Taproot(to_array(&program)?)),
        // Future witness versions are valid addresses we cannot pay to
        (v, len) if v > 1 && (2..=40).contains(&len) => Err(AddressError::UnsupportedType),
        (_, len) => Err(AddressError::InvalidWitnessProgramLength(len)),
    }
}

fn to_array<const N: usize>(program: &[u8]) -> Result<[u8; N], AddressError> {
    program
        .try_into()
        .map_err(|_| AddressError::InvalidWitnessProgramLength(program.len()))
}

// ============================================================================
// Base58 Implementation
// ============================================================================

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn base58_decode(input: &str) -> Result<Vec<u8>, AddressError> {
    let mut result = Vec::new();

    // Count leading '1's (they become leading zeros)
    let mut leading_zeros = 0;
    for c in input.chars() {
        if c == '1' {
            leading_zeros += 1;
        } else {
            break;
        }
    }

    // Process remaining characters
    for c in input.chars() {
        let value = BASE58_ALPHABET
            .iter()
            .position(|&x| x == c as u8)
            .ok_or(AddressError::InvalidBase58Char(c))? as u32;

        // Multiply result by 58 and add value
        let mut carry = value;
        for byte in result.iter_mut().rev() {
            let temp = (*byte as u32) * 58 + carry;
            *byte = (temp & 0xFF) as u8;
            carry = temp >> 8;
        }

        while carry > 0 {
            result.insert(0, (carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    // Add leading zeros
    let mut final_result = vec![0u8; leading_zeros];
    final_result.extend(result);

    Ok(final_result)
}

// ============================================================================
// Bech32/Bech32m Implementation
// ============================================================================

const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bech32Variant {
    Bech32,
    Bech32m,
}

fn bech32_decode(input: &str) -> Result<(String, Vec<u8>, Bech32Variant), AddressError> {
    let input_lower = input.to_lowercase();

    // Find separator
    let sep_pos = input_lower.rfind('1')
        .ok_or(AddressError::InvalidBech32("No separator found".into()))?;

    if sep_pos == 0 || sep_pos + 7 > input_lower.len() {
        return Err(AddressError::InvalidBech32("Invalid separator position".into()));
    }

    let hrp = &input_lower[..sep_pos];
    let data_part = &input_lower[sep_pos + 1..];

    // Decode data characters
    let mut data = Vec::with_capacity(data_part.len());
    for c in data_part.chars() {
        let idx = BECH32_CHARSET
            .find(c)
            .ok_or(AddressError::InvalidBech32(format!("Invalid character: {}", c)))?;
        data.push(idx as u8);
    }

    // Verify checksum and determine variant
    let checksum = bech32_polymod(&hrp_expand(hrp), &data);

    let variant = if checksum == 1 {
        Bech32Variant::Bech32
    } else if checksum == 0x2bc830a3 {
        Bech32Variant::Bech32m
    } else {
        return Err(AddressError::InvalidBech32("Invalid checksum".into()));
    };

    // Remove checksum from data (last 6 characters)
    data.truncate(data.len() - 6);

    Ok((hrp.to_string(), data, variant))
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(hrp.len() * 2 + 1);

    for c in hrp.chars() {
        result.push((c as u8) >> 5);
    }
    result.push(0);
    for c in hrp.chars() {
        result.push((c as u8) & 31);
    }

    result
}

fn bech32_polymod(hrp: &[u8], data: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

    let mut chk: u32 = 1;

    for &value in hrp.iter().chain(data.iter()) {
        let top = chk >> 25;
        chk = ((chk & 0x1ffffff) << 5) ^ (value as u32);
        for (i, &g) in GEN.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }

    chk
}

fn convert_bits(data: &[u8], from_bits: u8, to_bits: u8, pad: bool) -> Result<Vec<u8>, AddressError> {
    let mut acc: u32 = 0;
    let mut bits: u8 = 0;
    let mut result = Vec::new();
    let max_value = (1u32 << to_bits) - 1;

    for &value in data {
        if value >> from_bits != 0 {
            return Err(AddressError::InvalidBech32("Invalid value in data".into()));
        }
        acc = (acc << from_bits) | (value as u32);
        bits += from_bits;

        while bits >= to_bits {
            bits -= to_bits;
            result.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            result.push(((acc << (to_bits - bits)) & max_value) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & max_value) != 0 {
        return Err(AddressError::InvalidBech32("Invalid padding".into()));
    }

    Ok(result)
}
