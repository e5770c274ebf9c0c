//! SDP adaptive MIPI (v2 table format).
//!
//! The v2 format drops the per-bandwidth buckets in favour of two flat
//! strided arrays on the panel node:
//!
//! ```text
//! sdp-mipi-table = <rat band from end  r0 r1 .. rN-1> ...   stride 4 + N
//! sdp-osc-table  = <rat band from end  osc_index>     ...   stride 5
//! ```
//!
//! The decision itself belongs to a [`MipiScorer`]; this module builds its
//! input tables, drives the feature lifecycle and forwards each decision to
//! the panel.
//!
//! ```text
//! Uninitialized ──parse──▶ Parsed ──register──▶ Registered ──decision──▶ Active
//!                            │                      │                      │
//!                            │remove                │remove                │remove
//!                            ▼                      ▼                      │
//!       ┌─────parse───── Removed ◀─────────────────────────────────────────┘
//!       ▼
//!     Parsed
//! ```
//!
//! `remove` is accepted from any of Parsed, Registered or Active, so a
//! feature torn down before its first decision (or before it was ever
//! registered) still ends in Removed. Removed holds no tables; only a new
//! parse leaves it.
//!
//! Tables sit behind a critical-section mutex. `remove` clears them and
//! each decision is scored and applied while holding it, so no clock switch
//! lands after the feature is removed.

use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;
use platform::{DeviceNode, FreqHopParam, PanelError, PanelFreqHop};
use ril_bridge::{
    BridgeMsg, CellReport, MultiCellReport, NotifyAction, RadioListener, DEV_ID_ADAPTIVE_MIPI_INFO,
};

use crate::clocks::{parse_candidate_clocks, CandidateClockSet};
use crate::config::{
    ScoringWeights, MAX_MIPI_FREQ, MAX_SDP_ROWS, MAX_STRIDE, SDP_OSC_STRIDE, SDP_ROW_HEADER,
};
use crate::error::ParseError;
use crate::keys;
use crate::parse::parse_strided_table;
use crate::score::ScoreAccumulator;
use crate::table::{AdaptiveMipiTable, BandChannelRange, ChannelRow};

/// One row of `sdp-mipi-table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpMipiRow {
    /// RAT, band and channel range.
    pub range: BandChannelRange,
    /// Interference rating per candidate display clock.
    pub rating: Vec<u32, MAX_MIPI_FREQ>,
}

impl SdpMipiRow {
    /// Decode one strided row `<rat band from end rating...>`.
    ///
    /// # Errors
    ///
    /// [`ParseError::Length`] for a row shorter than the header,
    /// [`ParseError::TooMany`] for more ratings than candidate clocks fit,
    /// [`ParseError::InvertedRange`] for `from > end`.
    pub fn decode(words: &[u32]) -> Result<Self, ParseError> {
        let (range, rating) = decode_header(keys::SDP_MIPI_TABLE, words)?;
        Ok(Self {
            range,
            rating: Vec::from_slice(rating).map_err(|_| ParseError::TooMany {
                key: keys::SDP_MIPI_TABLE,
                max: MAX_MIPI_FREQ,
                found: rating.len(),
            })?,
        })
    }

    /// Encode back to the strided layout.
    pub fn to_words(&self) -> Vec<u32, MAX_STRIDE> {
        let mut out: Vec<u32, MAX_STRIDE> = header_words(&self.range);
        for &r in &self.rating {
            // header + MAX_MIPI_FREQ ratings always fit
            let _ = out.push(r);
        }
        out
    }
}

impl ChannelRow for SdpMipiRow {
    fn range(&self) -> &BandChannelRange {
        &self.range
    }
}

/// One row of `sdp-osc-table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SdpOscRow {
    /// RAT, band and channel range.
    pub range: BandChannelRange,
    /// Index into the candidate oscillator clocks.
    pub osc_index: u32,
}

impl SdpOscRow {
    /// Decode one strided row `<rat band from end osc_index>`.
    ///
    /// # Errors
    ///
    /// [`ParseError::Length`] unless the row has exactly five values,
    /// [`ParseError::InvertedRange`] for `from > end`.
    pub fn decode(words: &[u32]) -> Result<Self, ParseError> {
        let (range, rest) = decode_header(keys::SDP_OSC_TABLE, words)?;
        match rest {
            [osc_index] => Ok(Self {
                range,
                osc_index: *osc_index,
            }),
            _ => Err(ParseError::Length {
                key: keys::SDP_OSC_TABLE,
                expected: SDP_OSC_STRIDE,
                found: words.len(),
            }),
        }
    }

    /// Encode back to the strided layout.
    pub fn to_words(&self) -> [u32; SDP_OSC_STRIDE] {
        let r = &self.range;
        [r.rat, r.band, r.from, r.to, self.osc_index]
    }
}

impl ChannelRow for SdpOscRow {
    fn range(&self) -> &BandChannelRange {
        &self.range
    }
}

fn decode_header<'w>(
    key: &'static str,
    words: &'w [u32],
) -> Result<(BandChannelRange, &'w [u32]), ParseError> {
    match words {
        [rat, band, from, to, rest @ ..] => {
            let range = BandChannelRange::new(*band, *from, *to)
                .with_rat(*rat)
                .validate()?;
            Ok((range, rest))
        }
        _ => Err(ParseError::Length {
            key,
            expected: SDP_ROW_HEADER,
            found: words.len(),
        }),
    }
}

fn header_words<const N: usize>(range: &BandChannelRange) -> Vec<u32, N> {
    let mut out = Vec::new();
    for w in [range.rat, range.band, range.from, range.to] {
        let _ = out.push(w);
    }
    out
}

/// Input tables of the v2 scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpTables {
    /// Candidate display and oscillator clocks.
    pub clocks: CandidateClockSet,
    /// Rating rows.
    pub mipi_rows: Vec<SdpMipiRow, MAX_SDP_ROWS>,
    /// Oscillator-selection rows.
    pub osc_rows: Vec<SdpOscRow, MAX_SDP_ROWS>,
}

impl SdpTables {
    /// Parse both strided tables and the candidate clocks from `node`.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`]. Beyond the row decoders this checks that every
    /// oscillator index addresses a configured oscillator clock.
    pub fn parse<D: DeviceNode>(node: &D) -> Result<Self, ParseError> {
        let clocks = parse_candidate_clocks(node)?;
        let stride = SDP_ROW_HEADER.saturating_add(clocks.mipi_count());
        let mipi_rows = parse_strided_table(node, keys::SDP_MIPI_TABLE, stride, SdpMipiRow::decode)?;
        let osc_rows = parse_strided_table(node, keys::SDP_OSC_TABLE, SDP_OSC_STRIDE, SdpOscRow::decode)?;
        let tables = Self::new(clocks, mipi_rows, osc_rows)?;
        info!(
            "sdp adaptive mipi: {} mipi rows, {} osc rows",
            tables.mipi_rows.len(),
            tables.osc_rows.len()
        );
        Ok(tables)
    }

    /// Assemble tables, checking rating lengths and oscillator indices.
    ///
    /// # Errors
    ///
    /// [`ParseError::RatingLength`] or [`ParseError::OscIndex`].
    pub fn new(
        clocks: CandidateClockSet,
        mipi_rows: Vec<SdpMipiRow, MAX_SDP_ROWS>,
        osc_rows: Vec<SdpOscRow, MAX_SDP_ROWS>,
    ) -> Result<Self, ParseError> {
        let expected = clocks.mipi_count();
        if let Some(row) = mipi_rows.iter().find(|r| r.rating.len() != expected) {
            return Err(ParseError::RatingLength {
                expected,
                found: row.rating.len(),
            });
        }
        let count = clocks.osc.len();
        if let Some(row) = osc_rows
            .iter()
            .find(|r| usize::try_from(r.osc_index).map_or(true, |i| i >= count))
        {
            return Err(ParseError::OscIndex {
                index: row.osc_index,
                count,
            });
        }
        Ok(Self {
            clocks,
            mipi_rows,
            osc_rows,
        })
    }

    /// Re-shape a bucketed table into v2 rows, one per rating row, RAT 0.
    ///
    /// Narrow rows come first, so on overlap the narrow row wins. Oscillator
    /// overrides have no v2 counterpart and the oscillator table is empty.
    ///
    /// # Errors
    ///
    /// [`ParseError::TableFull`] past [`MAX_SDP_ROWS`] rows.
    pub fn from_adaptive_mipi_table(table: &AdaptiveMipiTable) -> Result<Self, ParseError> {
        let mut mipi_rows = Vec::new();
        for row in table.buckets().iter().flat_map(|b| b.rows()) {
            mipi_rows
                .push(SdpMipiRow {
                    range: BandChannelRange { rat: 0, ..row.range },
                    rating: row.rating.clone(),
                })
                .map_err(|_| ParseError::TableFull {
                    capacity: MAX_SDP_ROWS,
                })?;
        }
        Self::new(table.clocks().clone(), mipi_rows, Vec::new())
    }

    /// Stride of `sdp-mipi-table` for these clocks.
    pub fn mipi_stride(&self) -> usize {
        SDP_ROW_HEADER.saturating_add(self.clocks.mipi_count())
    }
}

impl fmt::Display for SdpTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.clocks)?;
        writeln!(f, "mipi table: {} rows", self.mipi_rows.len())?;
        for row in &self.mipi_rows {
            write!(f, "  rat {} {} rating", row.range.rat, row.range)?;
            for r in &row.rating {
                write!(f, " {r}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "osc table: {} rows", self.osc_rows.len())?;
        for row in &self.osc_rows {
            writeln!(f, "  rat {} {} osc {}", row.range.rat, row.range, row.osc_index)?;
        }
        Ok(())
    }
}

/// Decision library of the v2 variant.
pub trait MipiScorer {
    /// Choose a clock pair for `report`, or `None` to keep the current one.
    fn select(&self, tables: &SdpTables, report: &MultiCellReport) -> Option<FreqHopParam>;
}

/// Reference [`MipiScorer`] using the multi-cell weights.
///
/// A row matches a cell on RAT (row RAT 0 matches any), band and channel.
/// The oscillator comes from the primary cell's oscillator row, falling
/// back to oscillator index 0. Clocks are passed through unscaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeightedScorer {
    weights: ScoringWeights,
}

impl WeightedScorer {
    /// Scorer with `weights`.
    pub const fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    fn row_for<'t, R: ChannelRow>(rows: &'t [R], cell: &CellReport) -> Option<&'t R> {
        rows.iter().find(|row| {
            let range = row.range();
            (range.rat == 0 || range.rat == cell.rat) && range.matches(cell.band, cell.channel)
        })
    }

    fn osc_for(tables: &SdpTables, report: &MultiCellReport) -> u32 {
        let index = report
            .primary()
            .and_then(|cell| Self::row_for(&tables.osc_rows, cell))
            .and_then(|row| usize::try_from(row.osc_index).ok())
            .unwrap_or(0);
        tables.clocks.osc_clock(index).unwrap_or(0)
    }
}

impl MipiScorer for WeightedScorer {
    fn select(&self, tables: &SdpTables, report: &MultiCellReport) -> Option<FreqHopParam> {
        let mut acc = ScoreAccumulator::new(tables.clocks.mipi_count());
        for (index, cell) in report.iter().enumerate() {
            if let Some(row) = Self::row_for(&tables.mipi_rows, cell) {
                let weight = ScoreAccumulator::cell_weight(&self.weights, cell);
                acc.add(index, cell, &row.rating, weight);
            }
        }
        if acc.matched() == 0 {
            return None;
        }
        let dsi_freq = tables.clocks.mipi_clock(acc.optimal())?;
        Some(FreqHopParam::new(dsi_freq, Self::osc_for(tables, report)))
    }
}

/// Lifecycle of an [`SdpAdaptiveMipi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SdpState {
    /// Nothing parsed yet.
    Uninitialized = 0,
    /// Tables built.
    Parsed = 1,
    /// Subscribed, no decision forwarded yet.
    Registered = 2,
    /// Forwarding decisions.
    Active = 3,
    /// Unregistered, tables freed; a new parse rebuilds them.
    Removed = 4,
}

impl SdpState {
    const fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Parsed,
            2 => Self::Registered,
            3 => Self::Active,
            4 => Self::Removed,
            _ => Self::Uninitialized,
        }
    }

    /// Returns `true` while decisions are forwarded.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Registered | Self::Active)
    }
}

/// Errors of the SDP feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SdpError {
    /// The requested transition is not allowed from the current state.
    #[error("cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current state.
        from: SdpState,
        /// Requested state.
        to: SdpState,
    },
    /// Table construction failed.
    #[error("table: {0}")]
    Parse(#[from] ParseError),
    /// The panel rejected a clock switch.
    #[error("panel: {0}")]
    Panel(#[from] PanelError),
}

/// SDP adaptive-MIPI feature of one panel.
///
/// `parse` needs `&mut self`; everything after it works through `&self`,
/// since a registered listener is shared with the radio bus.
pub struct SdpAdaptiveMipi<S, P> {
    state: AtomicU8,
    tables: Mutex<CriticalSectionRawMutex, RefCell<Option<SdpTables>>>,
    scorer: S,
    panel: P,
}

impl<S: MipiScorer, P: PanelFreqHop> SdpAdaptiveMipi<S, P> {
    /// Uninitialized feature.
    pub const fn new(scorer: S, panel: P) -> Self {
        Self {
            state: AtomicU8::new(SdpState::Uninitialized as u8),
            tables: Mutex::new(RefCell::new(None)),
            scorer,
            panel,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SdpState {
        SdpState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Run `f` on the built tables; `None` before parse and after remove.
    pub fn with_tables<R>(&self, f: impl FnOnce(Option<&SdpTables>) -> R) -> R {
        self.tables.lock(|cell| f(cell.borrow().as_ref()))
    }

    /// Returns `true` while tables are held.
    pub fn has_tables(&self) -> bool {
        self.with_tables(|t| t.is_some())
    }

    /// Panel sink.
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Build tables from the device tree (device-tree mode).
    ///
    /// # Errors
    ///
    /// [`SdpError::InvalidTransition`] unless uninitialized or removed,
    /// [`SdpError::Parse`] when the tables do not load.
    pub fn parse<D: DeviceNode>(&mut self, node: &D) -> Result<(), SdpError> {
        self.check_parse()?;
        self.install(SdpTables::parse(node)?);
        Ok(())
    }

    /// Build tables from a bucketed table (adapter mode).
    ///
    /// # Errors
    ///
    /// As [`parse`](Self::parse).
    pub fn initialize_from_adaptive_mipi_table(
        &mut self,
        table: &AdaptiveMipiTable,
    ) -> Result<(), SdpError> {
        self.check_parse()?;
        self.install(SdpTables::from_adaptive_mipi_table(table)?);
        Ok(())
    }

    fn check_parse(&self) -> Result<(), SdpError> {
        match self.state() {
            SdpState::Uninitialized | SdpState::Removed => Ok(()),
            from => Err(SdpError::InvalidTransition {
                from,
                to: SdpState::Parsed,
            }),
        }
    }

    fn install(&mut self, tables: SdpTables) {
        *self.tables.get_mut().get_mut() = Some(tables);
        *self.state.get_mut() = SdpState::Parsed as u8;
        debug!("sdp adaptive mipi: parsed");
    }

    /// Mark the feature registered with the radio bus.
    ///
    /// # Errors
    ///
    /// [`SdpError::InvalidTransition`] unless parsed.
    pub fn register(&self) -> Result<(), SdpError> {
        self.transition(SdpState::Parsed, SdpState::Registered)?;
        debug!("sdp adaptive mipi: registered");
        Ok(())
    }

    /// Stop forwarding decisions and free the tables.
    ///
    /// Accepted from parsed, registered or active.
    ///
    /// # Errors
    ///
    /// [`SdpError::InvalidTransition`] from uninitialized or removed.
    pub fn remove(&self) -> Result<(), SdpError> {
        self.tables.lock(|cell| {
            let mut current = self.state.load(Ordering::Acquire);
            loop {
                let from = SdpState::from_u8(current);
                if !matches!(from, SdpState::Parsed | SdpState::Registered | SdpState::Active) {
                    return Err(SdpError::InvalidTransition {
                        from,
                        to: SdpState::Removed,
                    });
                }
                match self.state.compare_exchange_weak(
                    current,
                    SdpState::Removed as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => break,
                    Err(actual) => current = actual,
                }
            }
            cell.replace(None);
            Ok(())
        })?;
        debug!("sdp adaptive mipi: removed");
        Ok(())
    }

    fn transition(&self, from: SdpState, to: SdpState) -> Result<(), SdpError> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|actual| SdpError::InvalidTransition {
                from: SdpState::from_u8(actual),
                to,
            })
    }

    /// Forward one decision of the scorer to the panel.
    ///
    /// # Errors
    ///
    /// [`SdpError::InvalidTransition`] unless registered or active,
    /// [`SdpError::Panel`] when the panel rejects the switch.
    pub fn apply_frequency(&self, dsi_freq: u32, osc_freq: u32) -> Result<(), SdpError> {
        self.tables
            .lock(|_| self.forward(FreqHopParam::new(dsi_freq, osc_freq)))
    }

    // Caller holds the table lock, so `remove` cannot interleave.
    fn forward(&self, param: FreqHopParam) -> Result<(), SdpError> {
        let state = self.state();
        if !state.is_live() {
            return Err(SdpError::InvalidTransition {
                from: state,
                to: SdpState::Active,
            });
        }
        self.panel.set_freq_hop(param)?;
        if self
            .transition(SdpState::Registered, SdpState::Active)
            .is_ok()
        {
            debug!("sdp adaptive mipi: active");
        }
        Ok(())
    }

    /// Run the scorer on `report` and forward its decision.
    ///
    /// Returns the applied parameter; `Ok(None)` when not live, when the
    /// tables are missing, or when the scorer keeps the current clock.
    ///
    /// # Errors
    ///
    /// [`SdpError::Panel`] when the panel rejects the switch.
    pub fn handle_report(&self, report: &MultiCellReport) -> Result<Option<FreqHopParam>, SdpError> {
        let applied = self.tables.lock(|cell| -> Result<_, SdpError> {
            if !self.state().is_live() {
                return Ok(None);
            }
            let guard = cell.borrow();
            let Some(tables) = guard.as_ref() else {
                return Ok(None);
            };
            let Some(param) = self.scorer.select(tables, report) else {
                return Ok(None);
            };
            self.forward(param)?;
            Ok(Some(param))
        })?;
        let Some(param) = applied else {
            return Ok(None);
        };
        info!(
            "sdp adaptive mipi: dsi {} osc {}",
            param.dsi_freq, param.osc_freq
        );
        Ok(Some(param))
    }
}

impl<S: MipiScorer, P: PanelFreqHop> RadioListener for SdpAdaptiveMipi<S, P> {
    fn on_radio_event(&self, msg: &BridgeMsg<'_>) -> NotifyAction {
        if msg.dev_id != DEV_ID_ADAPTIVE_MIPI_INFO || !self.state().is_live() {
            return NotifyAction::Done;
        }
        let report = match msg.cp_info() {
            Ok(report) => report,
            Err(err) => {
                warn!("sdp adaptive mipi: malformed cell report: {}", err);
                return NotifyAction::Done;
            }
        };
        match self.handle_report(&report) {
            Ok(Some(_)) => NotifyAction::Ok,
            Ok(None) => NotifyAction::Done,
            Err(err) => {
                warn!("sdp adaptive mipi: {}", err);
                NotifyAction::Done
            }
        }
    }
}

impl<S, P> fmt::Debug for SdpAdaptiveMipi<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tables.lock(|cell| {
            f.debug_struct("SdpAdaptiveMipi")
                .field("state", &SdpState::from_u8(self.state.load(Ordering::Relaxed)))
                .field("tables", &*cell.borrow())
                .finish_non_exhaustive()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parse::split_strided;
    use platform::devtree_local::{DeviceTree, DtNode};
    use platform::mocks::MockPanel;
    use ril_bridge::ConnectionStatus;

    const MIPI: &[u32] = &[
        3, 91, 0, 599, 0, 0, 50, //
        3, 91, 2400, 2534, 40, 0, 0, //
        0, 7, 3040, 3179, 0, 30, 0,
    ];
    const OSC: &[u32] = &[3, 91, 0, 599, 1, 3, 91, 2400, 2534, 1];

    fn tree() -> DeviceTree {
        DeviceTree::new(
            DtNode::new("panel")
                .prop(keys::MIPI_FREQ_LISTS, &[1108, 1124, 1141])
                .prop(keys::OSC_FREQ_LISTS, &[96_500, 94_500])
                .prop(keys::SDP_MIPI_TABLE, MIPI)
                .prop(keys::SDP_OSC_TABLE, OSC),
        )
    }

    fn feature() -> SdpAdaptiveMipi<WeightedScorer, MockPanel> {
        let mut f = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());
        f.parse(&tree().root()).unwrap();
        f
    }

    fn cell(rat: u32, band: u32, channel: u32, status: ConnectionStatus) -> CellReport {
        CellReport::new(band, channel, status, 10_000, 5).with_rat(rat)
    }

    #[test]
    fn osc_table_decodes_two_rows() {
        let rows: Vec<SdpOscRow, 4> =
            split_strided(keys::SDP_OSC_TABLE, OSC, SDP_OSC_STRIDE, SdpOscRow::decode).unwrap();
        assert_eq!(
            rows.as_slice(),
            &[
                SdpOscRow {
                    range: BandChannelRange::new(91, 0, 599).with_rat(3),
                    osc_index: 1
                },
                SdpOscRow {
                    range: BandChannelRange::new(91, 2400, 2534).with_rat(3),
                    osc_index: 1
                },
            ]
        );
    }

    #[test]
    fn parse_builds_both_tables() {
        let f = feature();
        f.with_tables(|t| {
            let t = t.unwrap();
            assert_eq!(t.mipi_rows.len(), 3);
            assert_eq!(t.osc_rows.len(), 2);
            assert_eq!(t.mipi_stride(), 7);
        });
        assert_eq!(f.state(), SdpState::Parsed);
    }

    #[test]
    fn osc_index_must_address_a_clock() {
        let dt = DeviceTree::new(
            DtNode::new("panel")
                .prop(keys::MIPI_FREQ_LISTS, &[1108])
                .prop(keys::OSC_FREQ_LISTS, &[96_500])
                .prop(keys::SDP_MIPI_TABLE, &[])
                .prop(keys::SDP_OSC_TABLE, &[0, 1, 0, 9, 1]),
        );
        assert_eq!(
            SdpTables::parse(&dt.root()),
            Err(ParseError::OscIndex { index: 1, count: 1 })
        );
    }

    #[test]
    fn lifecycle_is_linear() {
        let f = feature();
        assert_eq!(
            f.apply_frequency(1, 1),
            Err(SdpError::InvalidTransition {
                from: SdpState::Parsed,
                to: SdpState::Active
            })
        );
        f.register().unwrap();
        assert!(f.register().is_err());
        f.apply_frequency(1108, 94_500).unwrap();
        assert_eq!(f.state(), SdpState::Active);
        f.remove().unwrap();
        assert_eq!(f.state(), SdpState::Removed);
        assert!(!f.has_tables());
        assert!(f.remove().is_err());
        assert!(f.register().is_err());
    }

    #[test]
    fn remove_before_register_frees_tables() {
        let f = feature();
        assert!(f.has_tables());
        f.remove().unwrap();
        assert_eq!(f.state(), SdpState::Removed);
        assert!(!f.has_tables());
        assert!(format!("{f:?}").contains("tables: None"));
    }

    #[test]
    fn remove_from_uninitialized_is_rejected() {
        let f = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());
        assert_eq!(
            f.remove(),
            Err(SdpError::InvalidTransition {
                from: SdpState::Uninitialized,
                to: SdpState::Removed
            })
        );
    }

    #[test]
    fn apply_after_remove_is_rejected() {
        let f = feature();
        f.register().unwrap();
        f.apply_frequency(1108, 94_500).unwrap();
        f.remove().unwrap();
        assert_eq!(
            f.apply_frequency(1124, 96_500),
            Err(SdpError::InvalidTransition {
                from: SdpState::Removed,
                to: SdpState::Active
            })
        );
        assert_eq!(f.panel().apply_count(), 1);
    }

    #[test]
    fn parse_again_only_after_remove() {
        let mut f = feature();
        assert!(matches!(
            f.parse(&tree().root()),
            Err(SdpError::InvalidTransition { .. })
        ));
        f.remove().unwrap();
        f.parse(&tree().root()).unwrap();
        assert_eq!(f.state(), SdpState::Parsed);
    }

    #[test]
    fn scorer_uses_rat_and_primary_osc() {
        let f = feature();
        f.register().unwrap();
        let report = MultiCellReport::from_slice(&[cell(3, 91, 100, ConnectionStatus::Primary)]).unwrap();
        let param = f.handle_report(&report).unwrap().unwrap();
        // rating [0, 0, 50]: candidate 0, osc index 1
        assert_eq!(param, FreqHopParam::new(1108, 94_500));
        assert_eq!(f.state(), SdpState::Active);

        let wrong_rat =
            MultiCellReport::from_slice(&[cell(2, 91, 100, ConnectionStatus::Primary)]).unwrap();
        assert_eq!(f.handle_report(&wrong_rat), Ok(None));
    }

    #[test]
    fn rat_zero_row_matches_any_rat_and_osc_falls_back() {
        let f = feature();
        f.register().unwrap();
        let report = MultiCellReport::from_slice(&[cell(5, 7, 3100, ConnectionStatus::Secondary)]).unwrap();
        let param = f.handle_report(&report).unwrap().unwrap();
        // rating [0, 30, 0]: tie between 0 and 2 resolves to 0; no primary cell
        assert_eq!(param, FreqHopParam::new(1108, 96_500));
    }

    #[test]
    fn removed_feature_ignores_reports() {
        let f = feature();
        f.register().unwrap();
        f.remove().unwrap();
        let report = MultiCellReport::from_slice(&[cell(3, 91, 100, ConnectionStatus::Primary)]).unwrap();
        assert_eq!(f.handle_report(&report), Ok(None));
        assert_eq!(f.panel().apply_count(), 0);
    }

    #[test]
    fn mipi_row_round_trips_through_words() {
        let row = SdpMipiRow::decode(&[3, 91, 0, 599, 0, 0, 50]).unwrap();
        assert_eq!(row.to_words().as_slice(), &[3, 91, 0, 599, 0, 0, 50]);
        assert!(matches!(
            SdpMipiRow::decode(&[3, 91, 0]),
            Err(ParseError::Length { .. })
        ));
    }
}
