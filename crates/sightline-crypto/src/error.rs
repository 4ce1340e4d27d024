//! Error types for RPI derivation.

use thiserror::Error;

/// Failures reported by the cryptographic primitives during derivation.
///
/// Both variants are per-key: the matching engine logs them, skips the
/// offending key, and continues with the rest of the batch.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// HKDF-SHA256 rejected the RPIK expansion request
    #[error("HKDF-SHA256 expansion of the RPI key failed")]
    KeyExpansion,

    /// The batched AES-128-ECB pass over the interval blocks failed
    #[error("AES-128-ECB block encryption failed")]
    BlockEncryption,
}
