//! Multi-cell clock scoring.
//!
//! Every reported cell that matches a rating row adds
//! `rating[i] * status_weight * signal_weight` to candidate `i`. The
//! candidate with the lowest total is the one least likely to desense any
//! active carrier. Equal totals keep the lower index.
//!
//! Scores are `u64` and saturate, so an overflowing total ranks as the
//! worst possible score instead of wrapping.

use heapless::Vec;
use platform::FreqHopParam;
use ril_bridge::{CellReport, MultiCellReport, MAX_CELLS};

use crate::config::{ScoringWeights, MAX_MIPI_FREQ};
use crate::table::AdaptiveMipiTable;

/// Contribution of one matched cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellScore {
    /// Position of the cell in its report.
    pub cell: usize,
    /// Band id of the cell.
    pub band: u32,
    /// Channel of the cell.
    pub channel: u32,
    /// Combined status and signal weight applied to the row's ratings.
    pub weight: u64,
    /// Weighted rating per candidate.
    pub scores: Vec<u64, MAX_MIPI_FREQ>,
}

/// Running per-candidate totals plus the per-cell breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreAccumulator {
    totals: Vec<u64, MAX_MIPI_FREQ>,
    cells: Vec<CellScore, MAX_CELLS>,
}

impl ScoreAccumulator {
    /// Zeroed totals for `candidates` clocks (capped at [`MAX_MIPI_FREQ`]).
    pub fn new(candidates: usize) -> Self {
        let mut totals = Vec::new();
        for _ in 0..candidates.min(MAX_MIPI_FREQ) {
            // bounded by the `min` above
            let _ = totals.push(0);
        }
        Self {
            totals,
            cells: Vec::new(),
        }
    }

    /// Weight a cell gets under `weights`.
    pub fn cell_weight(weights: &ScoringWeights, cell: &CellReport) -> u64 {
        u64::from(weights.status_weight(cell.status))
            .saturating_mul(u64::from(weights.signal_weight(cell.sinr)))
    }

    /// Add `rating * weight` for a cell that matched a row.
    ///
    /// Ratings beyond the candidate count are ignored. The breakdown keeps
    /// at most [`MAX_CELLS`] entries; the totals always include every cell.
    pub fn add(&mut self, index: usize, cell: &CellReport, rating: &[u32], weight: u64) {
        let mut scores = Vec::new();
        for (total, &r) in self.totals.iter_mut().zip(rating) {
            let score = u64::from(r).saturating_mul(weight);
            *total = total.saturating_add(score);
            let _ = scores.push(score);
        }
        let _ = self.cells.push(CellScore {
            cell: index,
            band: cell.band,
            channel: cell.channel,
            weight,
            scores,
        });
    }

    /// Candidate with the lowest total; the lower index wins a tie.
    pub fn optimal(&self) -> usize {
        let mut best = 0usize;
        let mut min = u64::MAX;
        for (index, &total) in self.totals.iter().enumerate() {
            if min > total {
                min = total;
                best = index;
            }
        }
        best
    }

    /// Totals per candidate.
    pub fn totals(&self) -> &[u64] {
        &self.totals
    }

    /// Per-cell breakdown, in report order.
    pub fn cells(&self) -> &[CellScore] {
        &self.cells
    }

    /// Cells that matched a row.
    pub fn matched(&self) -> usize {
        self.cells.len()
    }
}

/// Result of one scoring pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    /// Index of the chosen candidate clock.
    pub candidate: usize,
    /// Parameter to hand to the panel.
    pub param: FreqHopParam,
    /// Scores behind the choice.
    pub scores: ScoreAccumulator,
}

impl ScoreOutcome {
    /// Number of cells that matched a row. Zero means the choice carries no
    /// information about the radio environment.
    pub fn matched(&self) -> usize {
        self.scores.matched()
    }

    /// Totals per candidate.
    pub fn totals(&self) -> &[u64] {
        self.scores.totals()
    }
}

/// Scores multi-cell reports against an [`AdaptiveMipiTable`].
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine<'t> {
    table: &'t AdaptiveMipiTable,
}

impl<'t> ScoringEngine<'t> {
    /// Engine over `table`.
    pub const fn new(table: &'t AdaptiveMipiTable) -> Self {
        Self { table }
    }

    /// Pick the least-interfering candidate clock for `report`.
    ///
    /// Unmatched cells contribute nothing. A report in which no cell
    /// matches still yields candidate 0; check
    /// [`ScoreOutcome::matched`] before acting on it.
    ///
    /// The display clock is scaled by the configured factor; the oscillator
    /// clock is left unset.
    pub fn compute_optimal_clock(&self, report: &MultiCellReport) -> ScoreOutcome {
        let config = self.table.config();
        let mut acc = ScoreAccumulator::new(self.table.clocks().mipi_count());

        for (index, cell) in report.iter().enumerate() {
            let Some(bucket) = self.table.bucket_for_bandwidth(cell.bandwidth_khz) else {
                trace!("cell {}: bandwidth {} has no bucket", index, cell.bandwidth_khz);
                continue;
            };
            let Some(row) = self.table.search_matching_row(cell.band, cell.channel, bucket) else {
                trace!("cell {}: band {} channel {} unmatched", index, cell.band, cell.channel);
                continue;
            };
            let weight = ScoreAccumulator::cell_weight(&config.weights, cell);
            acc.add(index, cell, &row.rating, weight);
            debug!(
                "cell {}: band {} channel {} bucket {} weight {}",
                index, cell.band, cell.channel, bucket, weight
            );
        }

        let candidate = acc.optimal();
        let dsi_freq = self
            .table
            .clocks()
            .mipi_clock(candidate)
            .map_or(0, |clock| clock.saturating_mul(config.dsi_clock_scale));
        ScoreOutcome {
            candidate,
            param: FreqHopParam::new(dsi_freq, 0),
            scores: acc,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clocks::CandidateClockSet;
    use crate::config::AdaptiveMipiConfig;
    use crate::table::{BandChannelRange, BandwidthBucket, RatingRow};
    use ril_bridge::ConnectionStatus;

    fn table(rating: &[u32]) -> AdaptiveMipiTable {
        let mut narrow = BandwidthBucket::new();
        narrow
            .push(RatingRow::new(BandChannelRange::new(7, 3040, 3179), rating).unwrap())
            .unwrap();
        AdaptiveMipiTable::from_parts(
            CandidateClockSet::new(&[1108, 1124, 1141], &[96_500]).unwrap(),
            Vec::from_slice(&[narrow]).unwrap(),
            AdaptiveMipiConfig::DEFAULT,
        )
        .unwrap()
    }

    fn report(cells: &[CellReport]) -> MultiCellReport {
        MultiCellReport::from_slice(cells).unwrap()
    }

    #[test]
    fn single_weak_primary_avoids_rated_clock() {
        let t = table(&[0, 0, 100]);
        let out = ScoringEngine::new(&t).compute_optimal_clock(&report(&[CellReport::new(
            7,
            3100,
            ConnectionStatus::Primary,
            10_000,
            10,
        )]));
        assert_eq!(out.totals(), &[0, 0, 1000]);
        assert_eq!(out.candidate, 0);
        assert_eq!(out.param, FreqHopParam::new(1_108_000, 0));
        assert_eq!(out.matched(), 1);
    }

    #[test]
    fn lowest_total_wins() {
        let t = table(&[30, 5, 20]);
        let out = ScoringEngine::new(&t).compute_optimal_clock(&report(&[CellReport::new(
            7,
            3100,
            ConnectionStatus::Secondary,
            5_000,
            0,
        )]));
        assert_eq!(out.candidate, 1);
        assert_eq!(out.param.dsi_freq, 1_124_000);
    }

    #[test]
    fn breakdown_records_each_matched_cell() {
        let t = table(&[1, 2, 3]);
        let out = ScoringEngine::new(&t).compute_optimal_clock(&report(&[
            CellReport::new(7, 3100, ConnectionStatus::Primary, 10_000, 5),
            CellReport::new(9, 3100, ConnectionStatus::Primary, 10_000, 5),
            CellReport::new(7, 3179, ConnectionStatus::Secondary, 1_400, 5),
        ]));
        let cells = out.scores.cells();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells.first().unwrap().scores.as_slice(), &[10, 20, 30]);
        assert_eq!(cells.get(1).unwrap().cell, 2);
        assert_eq!(out.totals(), &[11, 22, 33]);
    }

    #[test]
    fn wide_cell_without_wide_bucket_is_skipped() {
        let t = table(&[0, 0, 100]);
        let out = ScoringEngine::new(&t).compute_optimal_clock(&report(&[CellReport::new(
            7,
            3100,
            ConnectionStatus::Primary,
            20_000,
            0,
        )]));
        assert_eq!(out.matched(), 0);
        assert_eq!(out.totals(), &[0, 0, 0]);
    }

    #[test]
    fn totals_saturate_instead_of_wrapping() {
        let mut acc = ScoreAccumulator::new(2);
        let cell = CellReport::new(7, 1, ConnectionStatus::Primary, 0, 0);
        acc.add(0, &cell, &[u32::MAX, 0], u64::MAX);
        acc.add(1, &cell, &[u32::MAX, 0], u64::MAX);
        assert_eq!(acc.totals(), &[u64::MAX, 0]);
        assert_eq!(acc.optimal(), 1);
    }

    #[test]
    fn all_saturated_totals_keep_index_zero() {
        let mut acc = ScoreAccumulator::new(3);
        let cell = CellReport::new(7, 1, ConnectionStatus::Primary, 0, 0);
        acc.add(0, &cell, &[u32::MAX; 3], u64::MAX);
        assert_eq!(acc.optimal(), 0);
    }
}
