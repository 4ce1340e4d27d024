//! Temporary Exposure Key record codec.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use zeroize::Zeroize;

use crate::errors::{ExportError, Result};
use crate::wire::{put_int32, put_tag, put_varint, zigzag_decode, zigzag_encode, RecordCursor, WireType};

/// Byte length of TEK key material.
pub const KEY_DATA_LENGTH: usize = 16;

/// Interval count a key covers when the record omits `rolling_period`.
pub const DEFAULT_ROLLING_PERIOD: i32 = 144;

/// Emission scratch size: the 18-byte key_data field plus five varint fields
/// at their widest realistic width. Only pathological sign-extended negatives
/// in every metadata field could spill past this, and the buffer grows then.
pub(crate) const ENCODED_SCRATCH_LEN: usize = 64;

/// Field numbers of the TEK submessage within the export schema.
mod field {
    pub(super) const KEY_DATA: u32 = 1;
    pub(super) const TRANSMISSION_RISK_LEVEL: u32 = 2;
    pub(super) const ROLLING_START_INTERVAL_NUMBER: u32 = 3;
    pub(super) const ROLLING_PERIOD: u32 = 4;
    pub(super) const REPORT_TYPE: u32 = 5;
    pub(super) const DAYS_SINCE_ONSET_OF_SYMPTOMS: u32 = 6;
}

/// One diagnosis key from a published export.
///
/// The metadata fields ride along for the host's benefit; matching itself
/// only consumes `key_data` and `rolling_start_interval_number`. In
/// particular `rolling_period` is informational: derivation always spans a
/// full day of intervals.
///
/// # Security
///
/// Key material is wiped when the record is dropped, and the `Debug`
/// rendering redacts it so request logs cannot leak diagnosis keys.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryExposureKey {
    /// 16 bytes of key material
    pub key_data: [u8; KEY_DATA_LENGTH],
    /// 10-minute epoch index of the first interval the key covers
    pub rolling_start_interval_number: i32,
    /// Interval count claimed by the publisher (default 144)
    pub rolling_period: i32,
    /// Risk level assigned by the publishing authority (deprecated upstream)
    pub transmission_risk_level: Option<i32>,
    /// Report type enumerator from the export schema
    pub report_type: Option<i32>,
    /// Symptom-onset offset in days; zigzag-encoded on the wire
    pub days_since_onset_of_symptoms: Option<i32>,
}

impl TemporaryExposureKey {
    /// Build a record with default metadata, as test fixtures and in-memory
    /// callers need.
    #[must_use]
    pub fn new(key_data: [u8; KEY_DATA_LENGTH], rolling_start_interval_number: i32) -> Self {
        Self {
            key_data,
            rolling_start_interval_number,
            rolling_period: DEFAULT_ROLLING_PERIOD,
            transmission_risk_level: None,
            report_type: None,
            days_since_onset_of_symptoms: None,
        }
    }

    /// Parse one keys submessage.
    ///
    /// Unknown fields are skipped by wire type; `key_data` is the only
    /// mandatory field and must be exactly 16 bytes.
    ///
    /// # Errors
    ///
    /// `ExportError::Decode` on truncation, malformed varints, a missing or
    /// mis-sized `key_data`, or an unsupported wire type.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let mut cursor = RecordCursor::new(payload);

        let mut key_data: Option<[u8; KEY_DATA_LENGTH]> = None;
        let mut rolling_start_interval_number = 0i32;
        let mut rolling_period = DEFAULT_ROLLING_PERIOD;
        let mut transmission_risk_level = None;
        let mut report_type = None;
        let mut days_since_onset_of_symptoms = None;

        while let Some((field, wire_type)) = cursor.read_tag()? {
            match (field, wire_type) {
                (field::KEY_DATA, WireType::LengthDelimited) => {
                    let len = usize::try_from(cursor.read_varint()?)
                        .map_err(|_| ExportError::Decode { reason: "key_data length overflows" })?;
                    let bytes = cursor.read_bytes(len)?;
                    key_data = Some(
                        bytes
                            .try_into()
                            .map_err(|_| ExportError::Decode { reason: "key_data is not 16 bytes" })?,
                    );
                },
                (field::TRANSMISSION_RISK_LEVEL, WireType::Varint) => {
                    transmission_risk_level = Some(cursor.read_int32()?);
                },
                (field::ROLLING_START_INTERVAL_NUMBER, WireType::Varint) => {
                    rolling_start_interval_number = cursor.read_int32()?;
                },
                (field::ROLLING_PERIOD, WireType::Varint) => {
                    rolling_period = cursor.read_int32()?;
                },
                (field::REPORT_TYPE, WireType::Varint) => {
                    report_type = Some(cursor.read_int32()?);
                },
                (field::DAYS_SINCE_ONSET_OF_SYMPTOMS, WireType::Varint) => {
                    days_since_onset_of_symptoms = Some(zigzag_decode(cursor.read_varint()?));
                },
                (_, other) => cursor.skip_field(other)?,
            }
        }

        let key_data =
            key_data.ok_or(ExportError::Decode { reason: "record is missing key_data" })?;

        Ok(Self {
            key_data,
            rolling_start_interval_number,
            rolling_period,
            transmission_risk_level,
            report_type,
            days_since_onset_of_symptoms,
        })
    }

    /// Serialise the record back to its wire form for emission to the host.
    ///
    /// The host reads the interval number and metadata from this encoding
    /// rather than receiving bare key bytes. Realistic records fit the fixed
    /// 64-byte emission scratch without reallocation.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(ENCODED_SCRATCH_LEN);

        put_tag(&mut out, field::KEY_DATA, WireType::LengthDelimited);
        put_varint(&mut out, KEY_DATA_LENGTH as u64);
        out.put_slice(&self.key_data);

        if let Some(level) = self.transmission_risk_level {
            put_tag(&mut out, field::TRANSMISSION_RISK_LEVEL, WireType::Varint);
            put_int32(&mut out, level);
        }

        put_tag(&mut out, field::ROLLING_START_INTERVAL_NUMBER, WireType::Varint);
        put_int32(&mut out, self.rolling_start_interval_number);

        put_tag(&mut out, field::ROLLING_PERIOD, WireType::Varint);
        put_int32(&mut out, self.rolling_period);

        if let Some(report_type) = self.report_type {
            put_tag(&mut out, field::REPORT_TYPE, WireType::Varint);
            put_int32(&mut out, report_type);
        }

        if let Some(days) = self.days_since_onset_of_symptoms {
            put_tag(&mut out, field::DAYS_SINCE_ONSET_OF_SYMPTOMS, WireType::Varint);
            put_varint(&mut out, zigzag_encode(days));
        }

        out.freeze()
    }
}

impl fmt::Debug for TemporaryExposureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryExposureKey")
            .field("key_data", &"<redacted>")
            .field("rolling_start_interval_number", &self.rolling_start_interval_number)
            .field("rolling_period", &self.rolling_period)
            .field("transmission_risk_level", &self.transmission_risk_level)
            .field("report_type", &self.report_type)
            .field("days_since_onset_of_symptoms", &self.days_since_onset_of_symptoms)
            .finish()
    }
}

impl Drop for TemporaryExposureKey {
    fn drop(&mut self) {
        self.key_data.zeroize();
    }
}
