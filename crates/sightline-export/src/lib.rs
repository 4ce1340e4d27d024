//! Sightline export container codec.
//!
//! Decodes the binary container in which health authorities publish diagnosis
//! keys, and re-encodes individual key records for emission to the host.
//!
//! # Wire Layout
//!
//! ```text
//! ┌──────────────── 16 bytes ─────────────────┐
//! │ ASCII literal "EK Export v1    "          │  12 chars + 4 spaces
//! ├───────────────────────────────────────────┤
//! │ tagged record stream                      │
//! │   repeated { tag, wire_type, payload }    │
//! └───────────────────────────────────────────┘
//! ```
//!
//! The record stream is standard length-delimited tagged encoding. Only the
//! `keys` field (field 7 of the export message) is decoded; every other field
//! is skipped by its wire type. Each keys payload is a submessage carrying one
//! [`TemporaryExposureKey`].
//!
//! # Streaming
//!
//! [`KeyFileReader`] is a pull iterator: memory use is independent of file
//! size, and a record that fails to parse is skipped without abandoning the
//! rest of the stream. Reads go through a buffer of at least
//! [`DEFAULT_READ_BUFFER_SIZE`] to amortise per-read syscall cost.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod errors;
mod header;
mod key_record;
mod stream;
mod wire;

pub use errors::{ExportError, Result};
pub use header::{FILE_HEADER, FILE_HEADER_LEN};
pub use key_record::{TemporaryExposureKey, DEFAULT_ROLLING_PERIOD, KEY_DATA_LENGTH};
pub use stream::{
    read_all, KeyFileReader, DEFAULT_READ_BUFFER_SIZE, KEYS_FIELD_NUMBER, MAX_KEY_RECORD_LEN,
};
