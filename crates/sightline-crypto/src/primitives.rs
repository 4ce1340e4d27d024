//! Thin façades over the vetted primitive implementations.
//!
//! The derivation schedule needs exactly two operations. Keeping them behind
//! one seam means the rest of the crate never touches primitive APIs
//! directly, and primitive failures arrive as [`CryptoError`] everywhere.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Block};
use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::CryptoError;

/// HKDF-SHA256 expansion with an empty salt.
///
/// Fills `okm` completely.
///
/// # Errors
///
/// `CryptoError::KeyExpansion` if the primitive rejects the requested output
/// length.
pub fn hkdf_sha256_expand(ikm: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), CryptoError> {
    Hkdf::<Sha256>::new(None, ikm)
        .expand(info, okm)
        .map_err(|_| CryptoError::KeyExpansion)
}

/// Batched AES-128-ECB block encryption, no padding.
///
/// Encrypts `plaintext` block-for-block into `ciphertext`; the two slices
/// must have equal length.
pub(crate) fn aes128_ecb_encrypt_blocks(
    key: &[u8; 16],
    plaintext: &[Block],
    ciphertext: &mut [Block],
) -> Result<(), CryptoError> {
    let cipher = Aes128::new(key.into());
    cipher
        .encrypt_blocks_b2b(plaintext, ciphertext)
        .map_err(|_| CryptoError::BlockEncryption)
}
