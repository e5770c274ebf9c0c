//! Adaptive MIPI clock selection.
//!
//! Display MIPI clocks radiate harmonics that can land on an active cellular
//! channel and desense the receiver. This crate listens to the baseband's
//! cell reports and moves the panel to the candidate clock least likely to
//! interfere.
//!
//! # Variants
//!
//! | Variant | Listener | Input | Decision |
//! |---------|----------|-------|----------|
//! | Scored | [`AdaptiveMipi`] | multi-cell report | [`ScoringEngine`], clock x1000 |
//! | Simple | [`FreqHop`] | serving channel | first matching [`FreqHopRow`], verbatim |
//! | SDP v2 | [`SdpAdaptiveMipi`] | multi-cell report | pluggable [`MipiScorer`], verbatim |
//!
//! Every variant parses its tables once from a [`platform::DeviceNode`] and
//! never mutates them afterwards, so listeners are shared read-only with the
//! radio bus.
//!
//! # Example
//!
//! ```
//! use adaptive_mipi::{classify_bandwidth, NARROW_BUCKET, WIDE_BUCKET};
//!
//! assert_eq!(classify_bandwidth(10_000), NARROW_BUCKET);
//! assert_eq!(classify_bandwidth(20_000), WIDE_BUCKET);
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

// Must come first so the log macros are visible to every module below.
#[macro_use]
mod fmt;

pub mod bandwidth;
pub mod clocks;
pub mod config;
pub mod error;
pub mod freq_hop;
pub mod keys;
pub mod notifier;
pub mod parse;
pub mod score;
pub mod sdp;
pub mod table;

pub use bandwidth::{classify_bandwidth, classify_with_threshold, NARROW_BUCKET, WIDE_BUCKET};
pub use clocks::{parse_candidate_clocks, CandidateClockSet};
pub use config::{AdaptiveMipiConfig, ScoringWeights};
pub use error::ParseError;
pub use freq_hop::{FreqHop, FreqHopRow, FreqHopTable, HopError};
pub use notifier::AdaptiveMipi;
pub use parse::{parse_bandwidth_buckets, parse_strided_table, split_strided};
pub use score::{CellScore, ScoreAccumulator, ScoreOutcome, ScoringEngine};
pub use sdp::{
    MipiScorer, SdpAdaptiveMipi, SdpError, SdpMipiRow, SdpOscRow, SdpState, SdpTables,
    WeightedScorer,
};
pub use table::{
    search_matching_row, AdaptiveMipiTable, BandChannelRange, BandwidthBucket, ChannelRow,
    RatingRow,
};
