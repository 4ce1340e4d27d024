//! Error types for the export container codec.
//!
//! Variants are split by recovery semantics: a `Decode` on a keys record is
//! recoverable (the reader resyncs to the next keys tag), while `Io`,
//! `RecordTooLarge`, and stream-level `Decode` failures are terminal for the
//! source they occurred in.

use std::io;

use thiserror::Error;

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors surfaced while reading or writing export containers.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The source does not begin with the 16-byte export header literal
    #[error("export header mismatch: found {found:02x?}")]
    HeaderMismatch {
        /// The 16 bytes actually read
        found: [u8; 16],
    },

    /// Read failure from the underlying source
    #[error("export stream read failed: {0}")]
    Io(#[from] io::Error),

    /// A record or field violated the wire format
    #[error("malformed export record: {reason}")]
    Decode {
        /// What the decoder was reading when it gave up
        reason: &'static str,
    },

    /// A keys record declared a length far beyond the schema's record size
    #[error("key record of {len} bytes exceeds the {max}-byte limit")]
    RecordTooLarge {
        /// Declared payload length
        len: usize,
        /// Enforced ceiling
        max: usize,
    },
}
