//! SDP (v2) feature driven through the radio bus: table construction in
//! both modes, lifecycle gating and the scorer seam.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::atomic::{AtomicUsize, Ordering};

use adaptive_mipi::{
    AdaptiveMipiConfig, AdaptiveMipiTable, MipiScorer, SdpAdaptiveMipi, SdpError, SdpState,
    SdpTables, WeightedScorer,
};
use platform::devtree_local::DeviceTree;
use platform::mocks::MockPanel;
use platform::FreqHopParam;
use ril_bridge::msg::encode_cp_info;
use ril_bridge::{
    BridgeMsg, CellReport, ConnectionStatus, MultiCellReport, NotifyAction, RadioBus, RadioListener,
    DEV_ID_ADAPTIVE_MIPI_INFO,
};

const SDP_PANEL: &str = include_str!("fixtures/sdp_panel.json");
const SCORED_PANEL: &str = include_str!("fixtures/scored_panel.json");

fn frame(cells: &[CellReport]) -> [u8; ril_bridge::msg::CP_INFO_LEN] {
    encode_cp_info(&MultiCellReport::from_slice(cells).unwrap())
}

/// Scorer that always answers the same pair and counts calls.
struct Fixed {
    calls: AtomicUsize,
    param: FreqHopParam,
}

impl MipiScorer for Fixed {
    fn select(&self, _tables: &SdpTables, _report: &MultiCellReport) -> Option<FreqHopParam> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Some(self.param)
    }
}

#[test]
fn device_tree_mode_forwards_weighted_decision() {
    let dt = DeviceTree::from_json_str(SDP_PANEL).unwrap();
    let mut sdp = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());
    sdp.parse(&dt.root()).unwrap();
    sdp.register().unwrap();

    let mut bus: RadioBus<'_, 2> = RadioBus::new();
    bus.subscribe(&sdp).unwrap();

    let raw = frame(&[CellReport::new(91, 2500, ConnectionStatus::Primary, 20_000, 8).with_rat(3)]);
    assert_eq!(bus.publish(&BridgeMsg::new(DEV_ID_ADAPTIVE_MIPI_INFO, &raw)), 1);
    // rating [40, 0, 0]: candidate 1 unscaled, osc index 1
    assert_eq!(sdp.panel().last(), Some(FreqHopParam::new(1124, 94_500)));
    assert_eq!(sdp.state(), SdpState::Active);
}

#[test]
fn decisions_stop_after_remove() {
    let dt = DeviceTree::from_json_str(SDP_PANEL).unwrap();
    let mut sdp = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());
    sdp.parse(&dt.root()).unwrap();
    sdp.register().unwrap();
    sdp.remove().unwrap();

    let raw = frame(&[CellReport::new(91, 100, ConnectionStatus::Primary, 5_000, 8).with_rat(3)]);
    let action = sdp.on_radio_event(&BridgeMsg::new(DEV_ID_ADAPTIVE_MIPI_INFO, &raw));
    assert_eq!(action, NotifyAction::Done);
    assert_eq!(sdp.panel().apply_count(), 0);
}

#[test]
fn adapter_mode_reshapes_bucketed_rows() {
    let dt = DeviceTree::from_json_str(SCORED_PANEL).unwrap();
    let table = AdaptiveMipiTable::parse(&dt.root(), AdaptiveMipiConfig::DEFAULT).unwrap();

    let tables = SdpTables::from_adaptive_mipi_table(&table).unwrap();
    assert_eq!(tables.mipi_rows.len(), table.row_count());
    assert!(tables.mipi_rows.iter().all(|r| r.range.rat == 0));
    assert!(tables.osc_rows.is_empty());
    assert_eq!(tables.mipi_rows[0].rating.as_slice(), &[0, 0, 100]);
    // narrow rows precede wide rows
    assert_eq!(tables.mipi_rows[3].range.from, 2750);

    let mut sdp = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());
    sdp.initialize_from_adaptive_mipi_table(&table).unwrap();
    assert_eq!(sdp.state(), SdpState::Parsed);
}

#[test]
fn scorer_is_not_consulted_before_register() {
    let dt = DeviceTree::from_json_str(SDP_PANEL).unwrap();
    let scorer = Fixed {
        calls: AtomicUsize::new(0),
        param: FreqHopParam::new(1141, 96_500),
    };
    let mut sdp = SdpAdaptiveMipi::new(scorer, MockPanel::new());
    sdp.parse(&dt.root()).unwrap();

    let raw = frame(&[CellReport::new(1, 1, ConnectionStatus::Primary, 5_000, 0)]);
    let msg = BridgeMsg::new(DEV_ID_ADAPTIVE_MIPI_INFO, &raw);
    assert_eq!(sdp.on_radio_event(&msg), NotifyAction::Done);
    assert_eq!(sdp.panel().apply_count(), 0);

    sdp.register().unwrap();
    assert_eq!(sdp.on_radio_event(&msg), NotifyAction::Ok);
    assert_eq!(sdp.panel().last(), Some(FreqHopParam::new(1141, 96_500)));
}

#[test]
fn register_without_tables_is_rejected() {
    let sdp = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());
    assert_eq!(
        sdp.register(),
        Err(SdpError::InvalidTransition {
            from: SdpState::Uninitialized,
            to: SdpState::Registered
        })
    );
    assert!(sdp.remove().is_err());
}

#[test]
fn stride_mismatch_fails_parse_and_leaves_state() {
    let dt = DeviceTree::from_json_str(
        r#"{
            "name": "panel",
            "properties": {
                "mipi-freq-lists": [1108, 1124],
                "osc-freq-lists": [96500],
                "sdp-mipi-table": [0, 7, 0, 10, 1, 2, 3],
                "sdp-osc-table": []
            }
        }"#,
    )
    .unwrap();
    let mut sdp = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());
    assert!(matches!(sdp.parse(&dt.root()), Err(SdpError::Parse(_))));
    assert_eq!(sdp.state(), SdpState::Uninitialized);
}

#[test]
fn remove_frees_tables_until_reparsed() {
    let dt = DeviceTree::from_json_str(SDP_PANEL).unwrap();
    let mut sdp = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());
    sdp.parse(&dt.root()).unwrap();
    sdp.register().unwrap();
    let raw = frame(&[CellReport::new(91, 2500, ConnectionStatus::Primary, 20_000, 8).with_rat(3)]);
    let action = sdp.on_radio_event(&BridgeMsg::new(DEV_ID_ADAPTIVE_MIPI_INFO, &raw));
    assert_eq!(action, NotifyAction::Ok);
    assert_eq!(sdp.state(), SdpState::Active);

    sdp.remove().unwrap();
    assert!(!sdp.has_tables());
    assert!(sdp.with_tables(|t| t.is_none()));

    sdp.parse(&dt.root()).unwrap();
    assert!(sdp.has_tables());
    assert_eq!(sdp.state(), SdpState::Parsed);
}

#[test]
fn teardown_before_first_decision_ends_in_removed() {
    let dt = DeviceTree::from_json_str(SDP_PANEL).unwrap();
    let mut sdp = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());

    // parsed, never registered
    sdp.parse(&dt.root()).unwrap();
    sdp.remove().unwrap();
    assert_eq!(sdp.state(), SdpState::Removed);
    assert!(!sdp.has_tables());

    // registered, no decision yet
    sdp.parse(&dt.root()).unwrap();
    sdp.register().unwrap();
    sdp.remove().unwrap();
    assert_eq!(sdp.state(), SdpState::Removed);
    assert!(!sdp.has_tables());
    assert_eq!(sdp.panel().apply_count(), 0);
}

#[test]
fn no_switch_lands_after_concurrent_remove() {
    let dt = DeviceTree::from_json_str(SDP_PANEL).unwrap();
    let mut sdp = SdpAdaptiveMipi::new(WeightedScorer::default(), MockPanel::new());
    sdp.parse(&dt.root()).unwrap();
    sdp.register().unwrap();
    let cell = CellReport::new(91, 2500, ConnectionStatus::Primary, 20_000, 8).with_rat(3);
    let report = MultiCellReport::from_slice(&[cell]).unwrap();

    let at_remove = std::thread::scope(|s| {
        let sdp = &sdp;
        let report = &report;
        let decider = s.spawn(move || {
            for _ in 0..2_000 {
                let _ = sdp.handle_report(report);
            }
        });
        while sdp.panel().apply_count() == 0 {
            std::thread::yield_now();
        }
        sdp.remove().unwrap();
        let at_remove = sdp.panel().apply_count();
        decider.join().unwrap();
        at_remove
    });

    assert_eq!(sdp.state(), SdpState::Removed);
    assert_eq!(sdp.panel().apply_count(), at_remove);
    assert_eq!(sdp.handle_report(&report), Ok(None));
}
