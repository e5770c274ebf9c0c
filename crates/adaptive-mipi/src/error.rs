//! Configuration load errors.
//!
//! Every variant is fatal to the feature: a panel whose tables fail to parse
//! runs without adaptive MIPI, the rest of the panel driver is unaffected.

use platform::ConfigError;

/// Why the adaptive-MIPI configuration could not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// A required property is missing or unreadable.
    #[error("{key}: {source}")]
    Config {
        /// Property name.
        key: &'static str,
        /// Underlying read failure.
        source: ConfigError,
    },
    /// A list property holds no values.
    #[error("{key}: empty list")]
    Empty {
        /// Property name.
        key: &'static str,
    },
    /// A list property holds more values than supported.
    #[error("{key}: {found} values, at most {max} supported")]
    TooMany {
        /// Property name.
        key: &'static str,
        /// Supported maximum.
        max: usize,
        /// Values present.
        found: usize,
    },
    /// A fixed-size property has the wrong number of values.
    #[error("{key}: {found} values, expected {expected}")]
    Length {
        /// Property name.
        key: &'static str,
        /// Required count.
        expected: usize,
        /// Values present.
        found: usize,
    },
    /// A rating vector does not have one entry per candidate clock.
    #[error("rating has {found} entries for {expected} candidate clocks")]
    RatingLength {
        /// Candidate clock count.
        expected: usize,
        /// Rating entries present.
        found: usize,
    },
    /// A channel range runs backwards.
    #[error("band {band}: channel range {from}-{to} is inverted")]
    InvertedRange {
        /// Band id of the row.
        band: u32,
        /// Range start.
        from: u32,
        /// Range end.
        to: u32,
    },
    /// The number of bandwidth tables is outside `1..=MAX_BANDWIDTH_BUCKETS`.
    #[error("{found} bandwidth tables, between 1 and {max} supported")]
    BucketCount {
        /// Supported maximum.
        max: usize,
        /// Tables listed.
        found: usize,
    },
    /// A bandwidth table phandle does not resolve.
    #[error("bandwidth table {index} not found")]
    MissingTable {
        /// Position in the table list.
        index: usize,
    },
    /// A table has more rows than its fixed capacity.
    #[error("table exceeds {capacity} rows")]
    TableFull {
        /// Row capacity.
        capacity: usize,
    },
    /// A flat table's length is not a multiple of its row stride.
    #[error("{key}: {len} values do not divide into rows of {stride}")]
    Stride {
        /// Property name.
        key: &'static str,
        /// Values present.
        len: usize,
        /// Row stride.
        stride: usize,
    },
    /// The row stride itself is unusable.
    #[error("row stride {stride} unsupported")]
    InvalidStride {
        /// Requested stride.
        stride: usize,
    },
    /// An oscillator-selection row points past the oscillator clock list.
    #[error("oscillator index {index} out of {count} clocks")]
    OscIndex {
        /// Index in the row.
        index: u32,
        /// Oscillator clocks configured.
        count: usize,
    },
    /// A display clock overflows once scaled for the panel.
    #[error("display clock {clock} overflows when scaled by {scale}")]
    ClockOverflow {
        /// Table clock.
        clock: u32,
        /// Scale factor.
        scale: u32,
    },
}

impl ParseError {
    /// Wrap a read failure of `key`.
    pub(crate) fn config(key: &'static str) -> impl Fn(ConfigError) -> Self {
        move |source| Self::Config { key, source }
    }
}
