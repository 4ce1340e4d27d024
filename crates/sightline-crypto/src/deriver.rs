//! Batched Rolling Proximity Identifier generation.
//!
//! One [`RpiDeriver`] serves a whole matching session. It owns a 144-block
//! scratch plaintext whose invariant bytes (the `"EN-RPI"` label and six pad
//! bytes) are written once at construction; each derivation only stores the
//! four trailing interval bytes per block and runs a single batched AES-ECB
//! pass, which is materially cheaper than 144 separate encryptions.

use aes::Block;
use zeroize::Zeroize;

use crate::derivation::{derive_rpi_key, TEK_LENGTH};
use crate::error::CryptoError;
use crate::primitives::aes128_ecb_encrypt_blocks;

/// Byte length of a Rolling Proximity Identifier.
pub const RPI_LENGTH: usize = 16;

/// RPIs derived per key: one per 10-minute interval over a day.
pub const RPIS_PER_KEY: usize = 144;

/// Invariant block prefix: `"EN-RPI"` then six zero pad bytes.
const RPI_PADDED_DATA: [u8; 12] = *b"EN-RPI\0\0\0\0\0\0";

/// Offset of the little-endian interval number within each block.
const INTERVAL_OFFSET: usize = 12;

/// Reusable RPI derivation state.
///
/// The scratch buffer is mutated on every [`derive`](Self::derive) call and
/// must be exclusively owned; share derived output, not the deriver.
///
/// # Security
///
/// The scratch holds only public data. The per-call RPIK is wiped as soon as
/// the batched encryption completes, before any error propagates.
pub struct RpiDeriver {
    /// Plaintext blocks; prefix bytes are fixed, interval bytes change per call.
    scratch: [Block; RPIS_PER_KEY],
}

impl RpiDeriver {
    /// Create a deriver with the invariant scratch bytes pre-filled.
    #[must_use]
    pub fn new() -> Self {
        let mut template = Block::default();
        template[..RPI_PADDED_DATA.len()].copy_from_slice(&RPI_PADDED_DATA);

        Self { scratch: [template; RPIS_PER_KEY] }
    }

    /// Derive the 144 RPIs a TEK broadcast starting at `rolling_start`.
    ///
    /// Block `i` encrypts `"EN-RPI" ‖ 0x00×6 ‖ LE32(rolling_start + i)` under
    /// the TEK's RPIK. Interval numbers wrap on `u32` overflow. The interval
    /// encoding is explicitly little-endian; host byte order never leaks into
    /// the plaintext.
    ///
    /// # Errors
    ///
    /// - `CryptoError::KeyExpansion` if RPIK derivation fails
    /// - `CryptoError::BlockEncryption` if the batched ECB pass fails
    pub fn derive(
        &mut self,
        tek: &[u8; TEK_LENGTH],
        rolling_start: u32,
    ) -> Result<[[u8; RPI_LENGTH]; RPIS_PER_KEY], CryptoError> {
        let mut rpik = derive_rpi_key(tek)?;

        for (offset, block) in self.scratch.iter_mut().enumerate() {
            // offset < 144, so the narrowing conversion is exact
            let interval = rolling_start.wrapping_add(offset as u32);
            block[INTERVAL_OFFSET..].copy_from_slice(&interval.to_le_bytes());
        }

        let mut encrypted = [Block::default(); RPIS_PER_KEY];
        let outcome = aes128_ecb_encrypt_blocks(&rpik, &self.scratch, &mut encrypted);
        rpik.zeroize();
        outcome?;

        let mut rpis = [[0u8; RPI_LENGTH]; RPIS_PER_KEY];
        for (rpi, block) in rpis.iter_mut().zip(encrypted.iter()) {
            rpi.copy_from_slice(block);
        }

        Ok(rpis)
    }
}

impl Default for RpiDeriver {
    fn default() -> Self {
        Self::new()
    }
}
