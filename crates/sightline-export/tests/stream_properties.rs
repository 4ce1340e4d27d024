//! Property-based tests for the export container codec.
//!
//! Verifies that the streaming reader recovers every keys record from
//! arbitrary exports, regardless of the unknown fields interleaved around
//! them, and that emission encoding agrees with decoding for all records.

use std::io::{self, Read};

use proptest::prelude::*;
use sightline_export::{
    ExportError, KeyFileReader, TemporaryExposureKey, FILE_HEADER, KEYS_FIELD_NUMBER,
};

fn varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn keys_record(key: &TemporaryExposureKey, out: &mut Vec<u8>) {
    let encoded = key.encode();
    varint(u64::from(KEYS_FIELD_NUMBER) << 3 | 2, out);
    varint(encoded.len() as u64, out);
    out.extend_from_slice(&encoded);
}

/// An unknown export-level field in one of the three skippable wire shapes.
#[derive(Debug, Clone)]
enum NoiseField {
    Varint(u32, u64),
    Fixed64(u32, u64),
    LengthDelimited(u32, Vec<u8>),
}

impl NoiseField {
    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Varint(field, value) => {
                varint(u64::from(*field) << 3, out);
                varint(*value, out);
            },
            Self::Fixed64(field, value) => {
                varint(u64::from(*field) << 3 | 1, out);
                out.extend_from_slice(&value.to_le_bytes());
            },
            Self::LengthDelimited(field, payload) => {
                varint(u64::from(*field) << 3 | 2, out);
                varint(payload.len() as u64, out);
                out.extend_from_slice(payload);
            },
        }
    }
}

/// Export-level field numbers other than `keys`.
fn non_keys_field() -> impl Strategy<Value = u32> {
    (1u32..=20).prop_filter("keys field carries records, not noise", |field| {
        *field != KEYS_FIELD_NUMBER
    })
}

fn arbitrary_noise() -> impl Strategy<Value = NoiseField> {
    prop_oneof![
        (non_keys_field(), any::<u64>()).prop_map(|(f, v)| NoiseField::Varint(f, v)),
        (non_keys_field(), any::<u64>()).prop_map(|(f, v)| NoiseField::Fixed64(f, v)),
        (non_keys_field(), prop::collection::vec(any::<u8>(), 0..48))
            .prop_map(|(f, p)| NoiseField::LengthDelimited(f, p)),
    ]
}

fn arbitrary_key() -> impl Strategy<Value = TemporaryExposureKey> {
    (
        prop::array::uniform16(any::<u8>()),
        any::<i32>(),
        1i32..=144,
        prop::option::of(0i32..=8),
        prop::option::of(0i32..=5),
        prop::option::of(-14i32..=14),
    )
        .prop_map(|(key_data, start, period, risk, report, days)| TemporaryExposureKey {
            key_data,
            rolling_start_interval_number: start,
            rolling_period: period,
            transmission_risk_level: risk,
            report_type: report,
            days_since_onset_of_symptoms: days,
        })
}

proptest! {
    /// Unknown fields before, between, and after keys records never change
    /// the decoded key set.
    #[test]
    fn keys_survive_arbitrary_interleaved_noise(
        keys in prop::collection::vec(arbitrary_key(), 0..12),
        noise in prop::collection::vec(prop::collection::vec(arbitrary_noise(), 0..3), 0..13),
    ) {
        let mut stream = FILE_HEADER.to_vec();
        for (slot, key) in keys.iter().enumerate() {
            for field in noise.get(slot).into_iter().flatten() {
                field.write(&mut stream);
            }
            keys_record(key, &mut stream);
        }
        for field in noise.get(keys.len()).into_iter().flatten() {
            field.write(&mut stream);
        }

        let decoded: Vec<_> = KeyFileReader::from_reader(stream.as_slice())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        prop_assert_eq!(decoded, keys);
    }

    /// Emission encoding and record decoding agree for every record shape.
    #[test]
    fn emission_round_trip(key in arbitrary_key()) {
        let decoded = TemporaryExposureKey::decode(&key.encode()).unwrap();
        prop_assert_eq!(decoded, key);
    }
}

/// Fails after handing out a fixed prefix of the stream.
struct FailingReader {
    data: Vec<u8>,
    position: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.position >= self.data.len() {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "source went away"));
        }
        let take = buf.len().min(self.data.len() - self.position);
        buf[..take].copy_from_slice(&self.data[self.position..self.position + take]);
        self.position += take;
        Ok(take)
    }
}

#[test]
fn mid_stream_read_failure_is_terminal() {
    let key = TemporaryExposureKey::new([0x42; 16], 288);
    let mut stream = FILE_HEADER.to_vec();
    keys_record(&key, &mut stream);
    // Second record's tag arrives, its payload never does.
    varint(u64::from(KEYS_FIELD_NUMBER) << 3 | 2, &mut stream);

    let mut reader = KeyFileReader::with_capacity(
        FailingReader { data: stream, position: 0 },
        32, // small buffer so the failure surfaces mid-stream, not at open
    )
    .unwrap();

    assert_eq!(reader.next_key().unwrap(), key);
    assert!(reader.has_next(), "the tag was read before the source failed");
    assert!(matches!(reader.next_key(), Err(ExportError::Io(_))));
    assert!(!reader.has_next());
}
