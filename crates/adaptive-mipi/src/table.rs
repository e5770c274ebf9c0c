//! Band/channel lookup tables of the scored variant.
//!
//! ```text
//! AdaptiveMipiTable
//! ├── clocks   CandidateClockSet   (mipi-freq-lists, osc-freq-lists)
//! └── buckets  [BandwidthBucket]   (rf-table-lists, narrow first)
//!              └── rows [RatingRow]  band + [from, to] -> rating per clock
//! ```
//!
//! Rows keep configuration order. Lookup is a linear scan returning the
//! first row whose band matches and whose inclusive range holds the channel,
//! so an earlier row shadows any later overlapping one.

use core::fmt;

use heapless::Vec;
use platform::DeviceNode;

use crate::bandwidth::bucket_for;
use crate::clocks::{parse_candidate_clocks, CandidateClockSet};
use crate::config::{AdaptiveMipiConfig, MAX_BANDWIDTH_BUCKETS, MAX_MIPI_FREQ, MAX_ROWS_PER_BUCKET};
use crate::error::ParseError;
use crate::keys;
use crate::parse::parse_bandwidth_buckets;

/// An RF carrier allocation: band plus inclusive channel range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BandChannelRange {
    /// Radio access technology; `0` when the table does not key on it.
    pub rat: u32,
    /// Band id.
    pub band: u32,
    /// First channel, inclusive.
    pub from: u32,
    /// Last channel, inclusive.
    pub to: u32,
}

impl BandChannelRange {
    /// Range without a RAT.
    #[must_use]
    pub const fn new(band: u32, from: u32, to: u32) -> Self {
        Self {
            rat: 0,
            band,
            from,
            to,
        }
    }

    /// Same range keyed on `rat`.
    #[must_use]
    pub const fn with_rat(mut self, rat: u32) -> Self {
        self.rat = rat;
        self
    }

    /// Returns `true` if `from <= channel <= to`.
    #[must_use]
    pub const fn contains(&self, channel: u32) -> bool {
        self.from <= channel && channel <= self.to
    }

    /// Returns `true` for a matching band with `channel` in range.
    #[must_use]
    pub const fn matches(&self, band: u32, channel: u32) -> bool {
        self.band == band && self.contains(channel)
    }

    /// Reject inverted ranges.
    pub(crate) const fn validate(self) -> Result<Self, ParseError> {
        if self.from > self.to {
            return Err(ParseError::InvertedRange {
                band: self.band,
                from: self.from,
                to: self.to,
            });
        }
        Ok(self)
    }
}

impl fmt::Display for BandChannelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "band {} [{}, {}]", self.band, self.from, self.to)
    }
}

/// A table row keyed by a [`BandChannelRange`].
pub trait ChannelRow {
    /// The row's carrier allocation.
    fn range(&self) -> &BandChannelRange;
}

/// First row of `rows` matching `band` with `channel` in range.
///
/// `None` is an ordinary outcome (unsupported band, channel outside every
/// range) and callers decide whether it matters.
pub fn search_matching_row<R: ChannelRow>(rows: &[R], band: u32, channel: u32) -> Option<&R> {
    rows.iter().find(|row| row.range().matches(band, channel))
}

/// One row of a bandwidth bucket: interference rating per candidate clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingRow {
    /// Carrier allocation this row rates.
    pub range: BandChannelRange,
    /// Interference rating per candidate display clock; higher is worse.
    pub rating: Vec<u32, MAX_MIPI_FREQ>,
    /// Oscillator clock to use for this allocation, if configured.
    pub osc_override: Option<u32>,
}

impl RatingRow {
    /// Build a row.
    ///
    /// # Errors
    ///
    /// [`ParseError::InvertedRange`] for `from > to`,
    /// [`ParseError::TooMany`] for more than [`MAX_MIPI_FREQ`] ratings.
    pub fn new(range: BandChannelRange, rating: &[u32]) -> Result<Self, ParseError> {
        Ok(Self {
            range: range.validate()?,
            rating: Vec::from_slice(rating).map_err(|_| ParseError::TooMany {
                key: keys::RATING,
                max: MAX_MIPI_FREQ,
                found: rating.len(),
            })?,
            osc_override: None,
        })
    }

    /// Same row with an oscillator override.
    #[must_use]
    pub fn with_osc_override(mut self, osc: u32) -> Self {
        self.osc_override = Some(osc);
        self
    }
}

impl ChannelRow for RatingRow {
    fn range(&self) -> &BandChannelRange {
        &self.range
    }
}

impl fmt::Display for RatingRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rating", self.range)?;
        for r in &self.rating {
            write!(f, " {r}")?;
        }
        if let Some(osc) = self.osc_override {
            write!(f, " osc {osc}")?;
        }
        Ok(())
    }
}

/// Rows rating carriers of one bandwidth class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandwidthBucket {
    rows: Vec<RatingRow, MAX_ROWS_PER_BUCKET>,
}

impl BandwidthBucket {
    /// Empty bucket.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// [`ParseError::TableFull`] past [`MAX_ROWS_PER_BUCKET`] rows.
    pub fn push(&mut self, row: RatingRow) -> Result<(), ParseError> {
        self.rows.push(row).map_err(|_| ParseError::TableFull {
            capacity: MAX_ROWS_PER_BUCKET,
        })
    }

    /// Rows in configuration order.
    pub fn rows(&self) -> &[RatingRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` for a bucket without rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row matching `band` and `channel`.
    pub fn search(&self, band: u32, channel: u32) -> Option<&RatingRow> {
        search_matching_row(&self.rows, band, channel)
    }
}

/// Parsed configuration of the scored variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveMipiTable {
    clocks: CandidateClockSet,
    buckets: Vec<BandwidthBucket, MAX_BANDWIDTH_BUCKETS>,
    config: AdaptiveMipiConfig,
}

impl AdaptiveMipiTable {
    /// Parse clocks and bandwidth buckets from a panel's configuration node.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`]; the table is all or nothing.
    pub fn parse<D: DeviceNode>(node: &D, config: AdaptiveMipiConfig) -> Result<Self, ParseError> {
        let clocks = parse_candidate_clocks(node)?;
        let bucket_count = node
            .count_u32_elems(keys::RF_TABLE_LISTS)
            .map_err(ParseError::config(keys::RF_TABLE_LISTS))?;
        let buckets = parse_bandwidth_buckets(node, bucket_count, clocks.mipi_count())?;
        let table = Self::from_parts(clocks, buckets, config)?;
        info!(
            "adaptive mipi: {} candidate clocks, {} buckets, {} rows",
            table.clocks.mipi_count(),
            table.bucket_count(),
            table.row_count()
        );
        Ok(table)
    }

    /// Assemble a table from already-built parts, applying the same
    /// consistency checks as [`parse`](Self::parse).
    ///
    /// # Errors
    ///
    /// [`ParseError::BucketCount`], [`ParseError::RatingLength`] or
    /// [`ParseError::ClockOverflow`].
    pub fn from_parts(
        clocks: CandidateClockSet,
        buckets: Vec<BandwidthBucket, MAX_BANDWIDTH_BUCKETS>,
        config: AdaptiveMipiConfig,
    ) -> Result<Self, ParseError> {
        if buckets.is_empty() {
            return Err(ParseError::BucketCount {
                max: MAX_BANDWIDTH_BUCKETS,
                found: 0,
            });
        }
        let expected = clocks.mipi_count();
        for row in buckets.iter().flat_map(BandwidthBucket::rows) {
            if row.rating.len() != expected {
                return Err(ParseError::RatingLength {
                    expected,
                    found: row.rating.len(),
                });
            }
        }
        for &clock in &clocks.mipi {
            if clock.checked_mul(config.dsi_clock_scale).is_none() {
                return Err(ParseError::ClockOverflow {
                    clock,
                    scale: config.dsi_clock_scale,
                });
            }
        }
        Ok(Self {
            clocks,
            buckets,
            config,
        })
    }

    /// Candidate clocks.
    pub fn clocks(&self) -> &CandidateClockSet {
        &self.clocks
    }

    /// Buckets, narrow first.
    pub fn buckets(&self) -> &[BandwidthBucket] {
        &self.buckets
    }

    /// Tunables the table was loaded with.
    pub fn config(&self) -> &AdaptiveMipiConfig {
        &self.config
    }

    /// Number of bandwidth buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Rows across all buckets.
    pub fn row_count(&self) -> usize {
        self.buckets.iter().map(BandwidthBucket::len).sum()
    }

    /// Bucket a carrier of `bandwidth_khz` is rated in, if the table has it.
    pub fn bucket_for_bandwidth(&self, bandwidth_khz: u32) -> Option<usize> {
        bucket_for(
            bandwidth_khz,
            self.config.narrow_bandwidth_max_khz,
            self.bucket_count(),
        )
    }

    /// First row of `bucket` matching `band` and `channel`.
    ///
    /// A band id at or above the configured limit, or a bucket the table
    /// does not have, is simply not found.
    pub fn search_matching_row(&self, band: u32, channel: u32, bucket: usize) -> Option<&RatingRow> {
        if band >= self.config.max_band_id {
            return None;
        }
        self.buckets.get(bucket)?.search(band, channel)
    }
}

impl fmt::Display for AdaptiveMipiTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.clocks)?;
        for (index, bucket) in self.buckets.iter().enumerate() {
            writeln!(f, "bucket {index}: {} rows", bucket.len())?;
            for row in bucket.rows() {
                writeln!(f, "  {row}")?;
            }
        }
        Ok(())
    }
}
