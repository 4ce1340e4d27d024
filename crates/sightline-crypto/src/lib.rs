//! Sightline Cryptographic Primitives
//!
//! The derivation side of Exposure Notification matching. Pure functions with
//! deterministic outputs: the same key and interval always produce the same
//! identifiers, which is what makes offline matching possible at all.
//!
//! # Derivation Pipeline
//!
//! Each published Temporary Exposure Key (TEK) expands into the 144 Rolling
//! Proximity Identifiers (RPIs) it broadcast over one day, one per 10-minute
//! interval:
//!
//! ```text
//! TEK (16 bytes, daily secret)
//!        │
//!        ▼
//! HKDF-SHA256 (salt = ∅, info = "EN-RPIK") → RPIK (16 bytes)
//!        │
//!        ▼
//! AES-128-ECB over 144 padded interval blocks → 144 RPIs
//! ```
//!
//! The plaintext block for interval `i` is `"EN-RPI" ‖ 0x00×6 ‖ LE32(i)`.
//! The interval number is little-endian on the wire regardless of host
//! endianness.
//!
//! # Security
//!
//! Key Hygiene:
//! - The derived RPIK is wiped as soon as its batched encryption completes
//! - TEK bytes are borrowed, never copied into long-lived storage here
//! - The reusable scratch buffer holds only public plaintext (label, padding,
//!   interval numbers), never key material
//!
//! Failure Containment:
//! - Primitive failures surface as [`CryptoError`] instead of panics, so a
//!   matching batch can skip one bad key and keep going

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod derivation;
mod deriver;
mod error;
mod primitives;

pub use derivation::{derive_rpi_key, RPIK_LENGTH, TEK_LENGTH};
pub use deriver::{RpiDeriver, RPIS_PER_KEY, RPI_LENGTH};
pub use error::CryptoError;
pub use primitives::hkdf_sha256_expand;
