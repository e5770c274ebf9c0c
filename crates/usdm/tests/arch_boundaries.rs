//! Architecture boundary tests: run with `cargo test -p usdm --test arch_boundaries`
// Architecture test file: unwrap/expect are intentional test mechanisms.
#![allow(clippy::unwrap_used, clippy::expect_used)]
//!
//! Layering rules:
//!   Rule 1: platform (HAL) depends on no workspace crate
//!   Rule 2: ril-bridge knows nothing about panels or clock tables
//!   Rule 3: adaptive-mipi reaches the panel only through `PanelFreqHop`
//!   Rule 4: usdm is the only crate that names concrete panels
//!
//! The rules are enforced by the workspace dependency graph. The tests below
//! are compile-time sanity checks: each names only the items its layer may
//! see, so a boundary violation shows up as a type or link error here.

use platform::{DeviceNode, FreqHopParam, PanelError, PanelFreqHop};

/// The HAL traits are reachable without any feature or application type.
#[test]
fn platform_hal_is_independent() {
    fn _assert_panel_sink<T: PanelFreqHop>() {}
    fn _assert_config_node<T: DeviceNode>() {}
    assert!(!platform::config::SUBSYSTEM_NAME.is_empty());
}

/// The bridge decodes frames without knowing what consumes them.
#[test]
fn ril_bridge_is_panel_agnostic() {
    let frame = ril_bridge::msg::encode_cp_info(&ril_bridge::MultiCellReport::new());
    let msg = ril_bridge::BridgeMsg::new(ril_bridge::DEV_ID_ADAPTIVE_MIPI_INFO, &frame);
    assert!(msg.cp_info().unwrap().is_empty());
}

/// Any `PanelFreqHop` works as the feature's sink, including one defined
/// outside every workspace crate.
#[test]
fn adaptive_mipi_accepts_any_panel_sink() {
    struct Sink;
    impl PanelFreqHop for Sink {
        fn set_freq_hop(&self, _param: FreqHopParam) -> Result<(), PanelError> {
            Ok(())
        }
    }

    let table = adaptive_mipi::FreqHopTable::from_rows(
        &[adaptive_mipi::FreqHopRow {
            range: adaptive_mipi::BandChannelRange::new(7, 3040, 3179),
            dsi_freq: 1124,
            osc_freq: 96_500,
        }],
        adaptive_mipi::AdaptiveMipiConfig::DEFAULT,
    )
    .unwrap();
    let hop = adaptive_mipi::FreqHop::new(table, Sink);
    let info = ril_bridge::ChannelInfo {
        rat: 3,
        band: 7,
        channel: 3100,
    };
    assert_eq!(
        hop.apply_channel(info).unwrap(),
        FreqHopParam::new(1124, 96_500)
    );
}

/// The application layer owns the concrete panel.
#[test]
fn usdm_supplies_the_concrete_panel() {
    fn _assert_sink<T: PanelFreqHop + Sync>() {}
    _assert_sink::<usdm::SimulatedPanel>();
    let ctx: usdm::PanelContext<usdm::SimulatedPanel> = usdm::PanelContext::default();
    assert!(ctx.registry().is_empty());
}
