//! Radio bus listener of the scored variant.
//!
//! Decodes adaptive-MIPI multi-cell reports, scores them and forwards the
//! chosen clock to the panel. Bad frames and panel failures are logged and
//! absorbed; the panel keeps its last applied clock.

use platform::{DeviceNode, PanelFreqHop};
use ril_bridge::{BridgeMsg, MultiCellReport, NotifyAction, RadioListener, DEV_ID_ADAPTIVE_MIPI_INFO};

use crate::config::AdaptiveMipiConfig;
use crate::error::ParseError;
use crate::score::{ScoreOutcome, ScoringEngine};
use crate::table::AdaptiveMipiTable;

/// Scored adaptive-MIPI feature of one panel.
#[derive(Debug)]
pub struct AdaptiveMipi<P> {
    table: AdaptiveMipiTable,
    panel: P,
}

impl<P: PanelFreqHop> AdaptiveMipi<P> {
    /// Feature over an already-parsed table.
    pub const fn new(table: AdaptiveMipiTable, panel: P) -> Self {
        Self { table, panel }
    }

    /// Parse the panel's configuration node and build the feature.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`] from [`AdaptiveMipiTable::parse`].
    pub fn probe<D: DeviceNode>(
        node: &D,
        config: AdaptiveMipiConfig,
        panel: P,
    ) -> Result<Self, ParseError> {
        Ok(Self::new(AdaptiveMipiTable::parse(node, config)?, panel))
    }

    /// Parsed table.
    pub fn table(&self) -> &AdaptiveMipiTable {
        &self.table
    }

    /// Panel sink.
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Score `report` and apply the result.
    ///
    /// Returns the outcome when a clock was applied. Nothing is applied when
    /// no cell matched a row or the panel rejected the switch.
    pub fn handle_report(&self, report: &MultiCellReport) -> Option<ScoreOutcome> {
        let outcome = ScoringEngine::new(&self.table).compute_optimal_clock(report);
        if outcome.matched() == 0 {
            debug!("adaptive mipi: none of {} cells matched, clock kept", report.len());
            return None;
        }
        match self.panel.set_freq_hop(outcome.param) {
            Ok(()) => {
                info!(
                    "adaptive mipi: candidate {} dsi {} ({} of {} cells matched)",
                    outcome.candidate,
                    outcome.param.dsi_freq,
                    outcome.matched(),
                    report.len()
                );
                Some(outcome)
            }
            Err(err) => {
                warn!("adaptive mipi: panel rejected dsi {}: {}", outcome.param.dsi_freq, err);
                None
            }
        }
    }
}

impl<P: PanelFreqHop> RadioListener for AdaptiveMipi<P> {
    fn on_radio_event(&self, msg: &BridgeMsg<'_>) -> NotifyAction {
        if msg.dev_id != DEV_ID_ADAPTIVE_MIPI_INFO {
            return NotifyAction::Done;
        }
        match msg.cp_info() {
            Ok(report) => match self.handle_report(&report) {
                Some(_) => NotifyAction::Ok,
                None => NotifyAction::Done,
            },
            Err(err) => {
                warn!("adaptive mipi: malformed cell report: {}", err);
                NotifyAction::Done
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clocks::CandidateClockSet;
    use crate::table::{BandChannelRange, BandwidthBucket, RatingRow};
    use heapless::Vec;
    use platform::mocks::MockPanel;
    use platform::{FreqHopParam, PanelError};
    use ril_bridge::msg::encode_cp_info;
    use ril_bridge::{CellReport, ConnectionStatus, DEV_ID_CHANNEL_INFO};

    fn feature(panel: MockPanel) -> AdaptiveMipi<MockPanel> {
        let mut narrow = BandwidthBucket::new();
        narrow
            .push(RatingRow::new(BandChannelRange::new(7, 3040, 3179), &[0, 0, 100]).unwrap())
            .unwrap();
        let table = AdaptiveMipiTable::from_parts(
            CandidateClockSet::new(&[1108, 1124, 1141], &[96_500]).unwrap(),
            Vec::from_slice(&[narrow]).unwrap(),
            AdaptiveMipiConfig::DEFAULT,
        )
        .unwrap();
        AdaptiveMipi::new(table, panel)
    }

    fn frame(cells: &[CellReport]) -> [u8; ril_bridge::msg::CP_INFO_LEN] {
        encode_cp_info(&MultiCellReport::from_slice(cells).unwrap())
    }

    #[test]
    fn matched_report_applies_scaled_clock() {
        let f = feature(MockPanel::new());
        let raw = frame(&[CellReport::new(7, 3100, ConnectionStatus::Primary, 10_000, 10)]);
        let action = f.on_radio_event(&BridgeMsg::new(DEV_ID_ADAPTIVE_MIPI_INFO, &raw));
        assert_eq!(action, NotifyAction::Ok);
        assert_eq!(f.panel().last(), Some(FreqHopParam::new(1_108_000, 0)));
    }

    #[test]
    fn unmatched_report_keeps_clock() {
        let f = feature(MockPanel::new());
        let raw = frame(&[CellReport::new(7, 3180, ConnectionStatus::Primary, 10_000, 10)]);
        let action = f.on_radio_event(&BridgeMsg::new(DEV_ID_ADAPTIVE_MIPI_INFO, &raw));
        assert_eq!(action, NotifyAction::Done);
        assert_eq!(f.panel().apply_count(), 0);
    }

    #[test]
    fn malformed_frame_is_absorbed() {
        let f = feature(MockPanel::new());
        let action = f.on_radio_event(&BridgeMsg::new(DEV_ID_ADAPTIVE_MIPI_INFO, &[1, 2, 3]));
        assert_eq!(action, NotifyAction::Done);
        assert_eq!(f.panel().apply_count(), 0);
    }

    #[test]
    fn other_messages_are_ignored() {
        let f = feature(MockPanel::new());
        let raw = frame(&[CellReport::new(7, 3100, ConnectionStatus::Primary, 10_000, 10)]);
        let action = f.on_radio_event(&BridgeMsg::new(DEV_ID_CHANNEL_INFO, &raw));
        assert_eq!(action, NotifyAction::Done);
        assert_eq!(f.panel().apply_count(), 0);
    }

    #[test]
    fn panel_failure_is_not_reported_as_consumed() {
        let f = feature(MockPanel::failing(PanelError::NotActive));
        let report =
            MultiCellReport::from_slice(&[CellReport::new(7, 3100, ConnectionStatus::Primary, 10_000, 10)])
                .unwrap();
        assert!(f.handle_report(&report).is_none());
    }
}
