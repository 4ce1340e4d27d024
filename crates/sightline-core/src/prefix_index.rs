//! Prefix-bucketed membership index over observed scan records.
//!
//! Probing dominates matching: every published key costs 144 lookups, so a
//! session with tens of thousands of keys performs millions of probes against
//! a set that was built exactly once. The index trades a fixed 256 KiB table
//! for O(1) candidate narrowing: records sort by their 16-bit little-endian
//! prefix, and a cumulative table maps each prefix to its bucket. With
//! uniformly distributed identifiers a bucket holds `n / 65536` records, so a
//! probe is a table lookup plus a scan of at most a handful of candidates.

use tracing::info;

/// Byte length of one scan record (an observed RPI).
pub const SCAN_RECORD_LENGTH: usize = 16;

/// Number of distinct 16-bit prefixes.
const PREFIX_SPACE: usize = 1 << 16;

/// Immutable prefix-bucketed set of 16-byte scan records.
///
/// # Invariants
///
/// - `records` is non-decreasing by little-endian 16-bit prefix
/// - `prefix_end` is non-decreasing and `prefix_end[65535] == records.len()`
/// - records with prefix exactly `p` occupy
///   `records[prefix_end[p - 1]..prefix_end[p]]` (with `prefix_end[-1] ≡ 0`)
///
/// Built once per matching session and read-only afterwards; safe to share
/// across readers without synchronisation.
pub struct PrefixIndex {
    /// Records sorted by prefix. Order within a bucket is unspecified but
    /// deterministic for a given input.
    records: Vec<[u8; SCAN_RECORD_LENGTH]>,
    /// `prefix_end[p]` = number of records whose prefix is <= `p`.
    prefix_end: Box<[u32; PREFIX_SPACE]>,
}

impl PrefixIndex {
    /// Build the index from the session's scan records.
    ///
    /// Duplicates are preserved; construction is infallible.
    #[must_use]
    pub fn build(mut records: Vec<[u8; SCAN_RECORD_LENGTH]>) -> Self {
        records.sort_unstable_by_key(prefix);

        // INVARIANT: the table stores u32 offsets; realistic scan sets are
        // thousands of records, orders of magnitude below the limit.
        #[allow(clippy::expect_used)]
        let count = u32::try_from(records.len()).expect("scan record count fits u32");

        let table = vec![0u32; PREFIX_SPACE].into_boxed_slice();
        let Ok(mut prefix_end) = <Box<[u32; PREFIX_SPACE]>>::try_from(table) else {
            unreachable!("table was allocated with exactly {PREFIX_SPACE} entries");
        };

        let mut last_prefix = 0usize;
        for (index, record) in (0u32..).zip(records.iter()) {
            let record_prefix = usize::from(prefix(record));
            while last_prefix < record_prefix {
                prefix_end[last_prefix] = index;
                last_prefix += 1;
            }
        }
        while last_prefix < PREFIX_SPACE {
            prefix_end[last_prefix] = count;
            last_prefix += 1;
        }

        info!(records = count, "prefix index loaded");
        Self { records, prefix_end }
    }

    /// Locate `id`, returning its position among the sorted records.
    ///
    /// With duplicates present, which copy's position comes back is
    /// unspecified; membership is what matching consumes.
    #[must_use]
    pub fn find(&self, id: &[u8; SCAN_RECORD_LENGTH]) -> Option<usize> {
        let p = usize::from(prefix(id));
        let start = if p == 0 { 0 } else { self.prefix_end[p - 1] as usize };
        let end = self.prefix_end[p] as usize;

        self.records[start..end]
            .iter()
            .position(|record| record == id)
            .map(|offset| start + offset)
    }

    /// Number of records in the index (duplicates included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records whose prefix is <= `p`.
    #[must_use]
    pub fn prefix_end(&self, p: u16) -> u32 {
        self.prefix_end[usize::from(p)]
    }

    /// Sorted view of the records backing the index.
    #[must_use]
    pub fn records(&self) -> &[[u8; SCAN_RECORD_LENGTH]] {
        &self.records
    }
}

/// Little-endian 16-bit prefix of a record (bytes 0 and 1).
fn prefix(record: &[u8; SCAN_RECORD_LENGTH]) -> u16 {
    u16::from_le_bytes([record[0], record[1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(first: u8, second: u8, fill: u8) -> [u8; SCAN_RECORD_LENGTH] {
        let mut bytes = [fill; SCAN_RECORD_LENGTH];
        bytes[0] = first;
        bytes[1] = second;
        bytes
    }

    #[test]
    fn finds_every_inserted_record() {
        let records =
            vec![record(0, 0, 1), record(0xFF, 0xFF, 2), record(0x34, 0x12, 3), record(1, 0, 4)];
        let index = PrefixIndex::build(records.clone());

        for r in &records {
            let position = index.find(r).expect("inserted record must be found");
            assert_eq!(&index.records()[position], r);
        }
    }

    #[test]
    fn rejects_absent_record_with_colliding_prefix() {
        // Same first two bytes as an indexed record, different tail: the
        // probe must compare all 16 bytes, not just the bucket.
        let present = record(0x12, 0x34, 0xAA);
        let absent = record(0x12, 0x34, 0xBB);

        let index = PrefixIndex::build(vec![present]);
        assert!(index.find(&present).is_some());
        assert_eq!(index.find(&absent), None);
    }

    #[test]
    fn rejects_absent_record_with_empty_bucket() {
        let index = PrefixIndex::build(vec![record(0, 0, 0)]);
        assert_eq!(index.find(&record(0x77, 0x77, 0)), None);
    }

    #[test]
    fn empty_index_finds_nothing() {
        let index = PrefixIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.find(&[0u8; SCAN_RECORD_LENGTH]), None);
        assert_eq!(index.prefix_end(u16::MAX), 0);
    }

    #[test]
    fn duplicates_are_preserved() {
        let twin = record(5, 5, 5);
        let index = PrefixIndex::build(vec![twin, twin, record(6, 6, 6)]);

        assert_eq!(index.len(), 3);
        let position = index.find(&twin).unwrap();
        assert_eq!(index.records()[position], twin);
    }

    #[test]
    fn prefix_boundaries_are_exact() {
        // Prefix values (little-endian): 0x0100=(0,1), 0x0200=(0,2), 0x0200
        let records = vec![record(0, 1, 9), record(0, 2, 9), record(0, 2, 7)];
        let index = PrefixIndex::build(records);

        assert_eq!(index.prefix_end(0x00FF), 0);
        assert_eq!(index.prefix_end(0x0100), 1);
        assert_eq!(index.prefix_end(0x01FF), 1);
        assert_eq!(index.prefix_end(0x0200), 3);
        assert_eq!(index.prefix_end(u16::MAX), 3);
    }

    #[test]
    fn table_is_monotonic_and_complete() {
        let records: Vec<_> = (0u8..200)
            .map(|i| record(i.wrapping_mul(37), i.wrapping_mul(11), i))
            .collect();
        let index = PrefixIndex::build(records);

        let mut previous = 0u32;
        for p in 0..=u16::MAX {
            let current = index.prefix_end(p);
            assert!(current >= previous, "prefix_end must not decrease at {p}");
            previous = current;
        }
        assert_eq!(index.prefix_end(u16::MAX) as usize, index.len());
    }
}
