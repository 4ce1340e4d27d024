//! RPIK derivation from a Temporary Exposure Key using HKDF

use crate::error::CryptoError;
use crate::primitives::hkdf_sha256_expand;

/// Info string for RPIK expansion (7 bytes, no terminator)
const RPIK_INFO: &[u8] = b"EN-RPIK";

/// Byte length of a Temporary Exposure Key.
pub const TEK_LENGTH: usize = 16;

/// Byte length of a Rolling Proximity Identifier Key.
pub const RPIK_LENGTH: usize = 16;

/// Derive the Rolling Proximity Identifier Key for a TEK.
///
/// ```text
/// RPIK = HKDF-SHA256(ikm = tek, salt = ∅, info = "EN-RPIK", L = 16)
/// ```
///
/// Deterministic: the same TEK always yields the same RPIK. The caller owns
/// the returned bytes and is responsible for wiping them after use.
///
/// # Errors
///
/// `CryptoError::KeyExpansion` if the primitive rejects the expansion.
pub fn derive_rpi_key(tek: &[u8; TEK_LENGTH]) -> Result<[u8; RPIK_LENGTH], CryptoError> {
    let mut rpik = [0u8; RPIK_LENGTH];
    hkdf_sha256_expand(tek, RPIK_INFO, &mut rpik)?;
    Ok(rpik)
}
