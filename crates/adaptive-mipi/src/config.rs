//! Tunables and fixed capacities of the adaptive-MIPI feature.
//!
//! The constants in [`AdaptiveMipiConfig::DEFAULT`] are the values the
//! production panels ship with. They are not read from the device tree;
//! a board that needs different weights builds its own config value.

use ril_bridge::ConnectionStatus;

/// Maximum candidate MIPI DSI clocks.
pub const MAX_MIPI_FREQ: usize = 3;

/// Maximum candidate oscillator clocks.
pub const MAX_OSC_FREQ: usize = 2;

/// Maximum bandwidth-class buckets (narrow, wide).
pub const MAX_BANDWIDTH_BUCKETS: usize = 2;

/// Maximum rows in one bandwidth bucket or simple hop table.
pub const MAX_ROWS_PER_BUCKET: usize = 128;

/// Maximum rows in one SDP strided table.
pub const MAX_SDP_ROWS: usize = MAX_BANDWIDTH_BUCKETS * MAX_ROWS_PER_BUCKET;

/// Leading `<rat band from end>` words of every SDP row.
pub const SDP_ROW_HEADER: usize = 4;

/// Widest strided row: header plus one rating per candidate clock.
pub const MAX_STRIDE: usize = SDP_ROW_HEADER + MAX_MIPI_FREQ;

/// Stride of the SDP oscillator-selection table.
pub const SDP_OSC_STRIDE: usize = SDP_ROW_HEADER + 1;

/// Largest bandwidth (kHz) still classified as narrow.
pub const NARROW_BANDWIDTH_MAX_KHZ: u32 = 10_000;

/// Weights applied to a matched row's ratings.
///
/// A cell contributes `rating * status_weight * signal_weight` to each
/// candidate. Strong cells are weighted *down*: a cell with a healthy SINR
/// is not at risk of desense and must not veto a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScoringWeights {
    /// Weight of the primary serving cell.
    pub primary: u32,
    /// Weight of any other cell.
    pub secondary: u32,
    /// Weight when `sinr >= sinr_threshold`.
    pub strong_signal: u32,
    /// Weight when `sinr < sinr_threshold`.
    pub weak_signal: u32,
    /// SINR (dB) at which a cell counts as strong.
    pub sinr_threshold: i32,
}

impl ScoringWeights {
    /// Production weights: primary 10, secondary 1, strong 0, weak 1, threshold 20 dB.
    pub const DEFAULT: Self = Self {
        primary: 10,
        secondary: 1,
        strong_signal: 0,
        weak_signal: 1,
        sinr_threshold: 20,
    };

    /// Weight for the cell's serving role.
    pub const fn status_weight(&self, status: ConnectionStatus) -> u32 {
        match status {
            ConnectionStatus::Primary => self.primary,
            ConnectionStatus::Secondary => self.secondary,
        }
    }

    /// Weight for the cell's signal quality.
    pub const fn signal_weight(&self, sinr: i32) -> u32 {
        if sinr >= self.sinr_threshold {
            self.strong_signal
        } else {
            self.weak_signal
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Feature configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdaptiveMipiConfig {
    /// Largest bandwidth (kHz) classified into bucket 0.
    pub narrow_bandwidth_max_khz: u32,
    /// Band ids at or above this value never match a row.
    pub max_band_id: u32,
    /// Factor applied to the table clock before it reaches the panel
    /// (scored variant only).
    pub dsi_clock_scale: u32,
    /// Rating weights.
    pub weights: ScoringWeights,
}

impl AdaptiveMipiConfig {
    /// Production configuration.
    pub const DEFAULT: Self = Self {
        narrow_bandwidth_max_khz: NARROW_BANDWIDTH_MAX_KHZ,
        max_band_id: 16,
        dsi_clock_scale: 1000,
        weights: ScoringWeights::DEFAULT,
    };

    /// Same configuration with a different band id limit.
    #[must_use]
    pub const fn with_max_band_id(mut self, max_band_id: u32) -> Self {
        self.max_band_id = max_band_id;
        self
    }

    /// Same configuration with different weights.
    #[must_use]
    pub const fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }
}

impl Default for AdaptiveMipiConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
