//! Sightline matching core.
//!
//! Determines which published diagnosis keys generated any of the Bluetooth
//! beacons a device observed. The engine never learns who was nearby; it only
//! answers whether a published key's identifiers intersect the local scan
//! history.
//!
//! # Pipeline
//!
//! ```text
//! scan records ──► PrefixIndex (built once per session)
//!                        ▲
//! key files ──► KeyFileReader ──► TEK ──► RpiDeriver ──► 144 RPIs ──► probe
//!                                                                      │
//!                                              matched TEKs ◄──────────┘
//! ```
//!
//! One [`MatchEngine`] serves one matching session on one thread. The scan
//! index is immutable after construction and could be shared read-only; the
//! deriver's scratch state is exclusively owned.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod engine;
mod prefix_index;

pub use engine::{EngineConfig, MatchEngine};
pub use prefix_index::{PrefixIndex, SCAN_RECORD_LENGTH};
