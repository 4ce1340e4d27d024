//! Matching pipeline: decode published keys, derive RPIs, probe the index.

use std::path::Path;

use sightline_crypto::RpiDeriver;
use sightline_export::{KeyFileReader, TemporaryExposureKey};
use tracing::{error, info, warn};

use crate::prefix_index::{PrefixIndex, SCAN_RECORD_LENGTH};

/// Tunables for a matching session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Read buffer capacity for key-file decoding.
    pub read_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { read_buffer_size: sightline_export::DEFAULT_READ_BUFFER_SIZE }
    }
}

/// One matching session: a scan-record index plus derivation state.
///
/// The engine is best-effort throughout: a corrupt source, record, or key is
/// logged and skipped, and never invalidates the rest of the batch.
///
/// # Concurrency
///
/// Single-threaded. The host may drive an engine from any thread but must
/// not invoke two operations on the same engine concurrently; the deriver's
/// scratch buffer is mutated on every key.
pub struct MatchEngine {
    index: PrefixIndex,
    deriver: RpiDeriver,
    keys_processed: u32,
    config: EngineConfig,
}

impl MatchEngine {
    /// Build an engine over the device's observed scan records.
    #[must_use]
    pub fn new(scan_records: Vec<[u8; SCAN_RECORD_LENGTH]>) -> Self {
        Self::with_config(scan_records, EngineConfig::default())
    }

    /// [`new`](Self::new) with explicit configuration.
    #[must_use]
    pub fn with_config(scan_records: Vec<[u8; SCAN_RECORD_LENGTH]>, config: EngineConfig) -> Self {
        Self {
            index: PrefixIndex::build(scan_records),
            deriver: RpiDeriver::new(),
            keys_processed: 0,
            config,
        }
    }

    /// Match every published key in `sources` against the scan records.
    ///
    /// Keys are consumed in source-list order, then stream order, and matched
    /// keys come back in consumption order without deduplication. A key
    /// matches when any of its 144 RPIs is present in the index; further hits
    /// for the same key are not enumerated.
    ///
    /// Sources that fail to open are skipped. A mid-stream read failure
    /// terminates that one source. The processed-key counter restarts at the
    /// beginning of every call and counts attempted records, parsed or not.
    pub fn match_files(&mut self, sources: &[impl AsRef<Path>]) -> Vec<TemporaryExposureKey> {
        self.keys_processed = 0;
        let mut matched = Vec::new();

        for source in sources {
            let path = source.as_ref();
            info!(file = %path.display(), "matching against key file");

            let mut reader =
                match KeyFileReader::open_with_capacity(path, self.config.read_buffer_size) {
                    Ok(reader) => reader,
                    Err(err) => {
                        error!(file = %path.display(), %err, "failed to open key file");
                        continue;
                    },
                };

            while reader.has_next() {
                self.keys_processed = self.keys_processed.wrapping_add(1);

                let key = match reader.next_key() {
                    Ok(key) => key,
                    Err(err) => {
                        // Recoverable decode failures leave the reader on the
                        // next record; terminal ones end the loop via has_next.
                        warn!(file = %path.display(), %err, "skipping unreadable key record");
                        continue;
                    },
                };

                if self.probe(&key.key_data, start_interval(&key)) {
                    matched.push(key);
                }
            }
        }

        if matched.is_empty() {
            info!(processed = self.keys_processed, "matching done, no key matched");
        } else {
            info!(
                processed = self.keys_processed,
                matched = matched.len(),
                "matching done"
            );
        }
        matched
    }

    /// Match an in-memory batch given as parallel key/start slices.
    ///
    /// Returns the indices, in input order, of keys with at least one RPI in
    /// the scan records. Mismatched slice lengths violate the call's input
    /// invariant: the batch is rejected whole and the result is empty. This
    /// path leaves [`last_processed_key_count`](Self::last_processed_key_count)
    /// untouched.
    pub fn match_direct(
        &mut self,
        diagnosis_keys: &[[u8; 16]],
        rolling_starts: &[u32],
    ) -> Vec<usize> {
        if diagnosis_keys.len() != rolling_starts.len() {
            warn!(
                keys = diagnosis_keys.len(),
                starts = rolling_starts.len(),
                "diagnosis key and rolling start counts differ"
            );
            return Vec::new();
        }

        let mut matches = Vec::new();
        for (index, (key, &rolling_start)) in diagnosis_keys.iter().zip(rolling_starts).enumerate()
        {
            if self.probe(key, rolling_start) {
                matches.push(index);
            }
        }

        info!(keys = diagnosis_keys.len(), matched = matches.len(), "direct matching done");
        matches
    }

    /// Keys consumed by the most recent [`match_files`](Self::match_files)
    /// call.
    #[must_use]
    pub fn last_processed_key_count(&self) -> u32 {
        self.keys_processed
    }

    /// Read-only view of the scan-record index.
    #[must_use]
    pub fn index(&self) -> &PrefixIndex {
        &self.index
    }

    /// Derive a key's RPIs and probe them, stopping at the first hit.
    fn probe(&mut self, key_data: &[u8; 16], rolling_start: u32) -> bool {
        let rpis = match self.deriver.derive(key_data, rolling_start) {
            Ok(rpis) => rpis,
            Err(err) => {
                error!(%err, "RPI derivation failed, skipping key");
                return false;
            },
        };

        rpis.iter().any(|rpi| self.index.find(rpi).is_some())
    }
}

/// The derivation window's first interval. Negative interval numbers wrap
/// into the unsigned domain rather than aborting the key.
#[allow(clippy::cast_sign_loss)]
fn start_interval(key: &TemporaryExposureKey) -> u32 {
    key.rolling_start_interval_number as u32
}
