//! Streaming pull iterator over export key files.
//!
//! Mirrors the state machine of the published key-file format: after the
//! header, the reader always sits either at a keys tag (ready to decode one
//! record) or at end of stream. Every other field is skipped in transit, so
//! memory use is independent of file size.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::errors::{ExportError, Result};
use crate::header;
use crate::key_record::TemporaryExposureKey;
use crate::wire::{self, WireType};

/// Field number of `keys` in the export message.
pub const KEYS_FIELD_NUMBER: u32 = 7;

/// Default read buffer: 64 KiB amortises syscalls across a whole archive.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Ceiling on one keys record's declared payload length. A real record is a
/// few tens of bytes; a declared length past this means the stream is
/// garbage, not merely one bad record.
pub const MAX_KEY_RECORD_LEN: usize = 1024;

/// Pull-style reader over the keys records of one export file.
///
/// # State Machine
///
/// `open`/`from_reader` verify the header and scan to the first keys tag.
/// Each [`next_key`](Self::next_key) decodes the record under the current tag
/// and rescans. `next_tag == None` is the terminal state: end of stream, or a
/// failure that makes further reads meaningless.
///
/// # Failure Semantics
///
/// - A keys record that fails to parse is consumed and the reader resyncs to
///   the following keys tag; the `Decode` error is recoverable and
///   [`has_next`](Self::has_next) stays honest.
/// - I/O failures and oversized declared lengths are terminal for this
///   source; `has_next` reports `false` afterwards.
pub struct KeyFileReader<R: Read> {
    input: BufReader<R>,
    /// Wire type of the keys tag the reader is positioned on; `None` once
    /// the stream is exhausted or terminally failed.
    next_tag: Option<WireType>,
}

impl KeyFileReader<File> {
    /// Open a key file, verify its header, and position on the first keys
    /// record.
    ///
    /// # Errors
    ///
    /// - `ExportError::Io` if the file cannot be opened or read
    /// - `ExportError::HeaderMismatch` if the 16-byte literal is absent
    /// - `ExportError::Decode` if the stream is malformed before the first
    ///   keys tag
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_capacity(path, DEFAULT_READ_BUFFER_SIZE)
    }

    /// [`open`](Self::open) with an explicit read-buffer capacity.
    pub fn open_with_capacity(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let file = File::open(path)?;
        Self::with_capacity(file, capacity)
    }
}

impl<R: Read> KeyFileReader<R> {
    /// Wrap an arbitrary byte source carrying the export container.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::with_capacity(reader, DEFAULT_READ_BUFFER_SIZE)
    }

    /// [`from_reader`](Self::from_reader) with an explicit buffer capacity.
    /// The capacity is clamped up to the header width.
    pub fn with_capacity(reader: R, capacity: usize) -> Result<Self> {
        let mut input = BufReader::with_capacity(capacity.max(header::FILE_HEADER_LEN), reader);
        header::read_and_verify(&mut input)?;

        let mut this = Self { input, next_tag: None };
        this.scan_to_next_keys_tag()?;
        Ok(this)
    }

    /// True while the reader is positioned at a keys record.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next_tag.is_some()
    }

    /// Decode the record under the current keys tag and advance.
    ///
    /// # Errors
    ///
    /// - `ExportError::Decode` if this record is malformed; the reader has
    ///   already resynced and the next call can succeed
    /// - `ExportError::Io` / `ExportError::RecordTooLarge` on terminal
    ///   failures; `has_next` reports `false` afterwards
    pub fn next_key(&mut self) -> Result<TemporaryExposureKey> {
        let Some(wire_type) = self.next_tag.take() else {
            return Err(ExportError::Decode { reason: "no keys record left in the stream" });
        };

        if wire_type != WireType::LengthDelimited {
            // Malformed keys tag; drop the scalar and resync.
            wire::skip_field(&mut self.input, wire_type)?;
            self.scan_to_next_keys_tag()?;
            return Err(ExportError::Decode { reason: "keys field is not length-delimited" });
        }

        let len = usize::try_from(wire::read_varint(&mut self.input)?)
            .map_err(|_| ExportError::Decode { reason: "key record length overflows usize" })?;
        if len > MAX_KEY_RECORD_LEN {
            return Err(ExportError::RecordTooLarge { len, max: MAX_KEY_RECORD_LEN });
        }

        let mut payload = vec![0u8; len];
        self.input.read_exact(&mut payload)?;

        // Position on the following record whether or not this one parses;
        // a scan failure outranks the record's own result.
        let parsed = TemporaryExposureKey::decode(&payload);
        self.scan_to_next_keys_tag()?;
        parsed
    }

    /// Advance past non-keys fields until the next keys tag or end of
    /// stream. On failure the reader stays terminal.
    fn scan_to_next_keys_tag(&mut self) -> Result<()> {
        self.next_tag = None;

        while let Some((field, wire_type)) = wire::read_tag(&mut self.input)? {
            if field == KEYS_FIELD_NUMBER {
                self.next_tag = Some(wire_type);
                return Ok(());
            }
            wire::skip_field(&mut self.input, wire_type)?;
        }

        Ok(())
    }
}

impl<R: Read> Iterator for KeyFileReader<R> {
    type Item = Result<TemporaryExposureKey>;

    fn next(&mut self) -> Option<Self::Item> {
        self.has_next().then(|| self.next_key())
    }
}

/// Parse a whole key file in one call.
///
/// Records that fail to parse are skipped, matching the streaming reader's
/// recovery semantics; the first terminal failure propagates.
///
/// # Errors
///
/// As [`KeyFileReader::open`] and the terminal cases of
/// [`KeyFileReader::next_key`].
pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<TemporaryExposureKey>> {
    let mut reader = KeyFileReader::open(path)?;

    let mut keys = Vec::new();
    while reader.has_next() {
        match reader.next_key() {
            Ok(key) => keys.push(key),
            Err(ExportError::Decode { .. }) => continue,
            Err(err) => return Err(err),
        }
    }

    Ok(keys)
}
