//! Simple frequency hop: one serving channel, one configured clock pair.
//!
//! The panel node's `freq-hop-table` phandle points at a node whose children
//! each map a band and channel range straight to a `dsi-freq`/`osc-freq`
//! pair. There is no scoring and no bandwidth split; the first matching row
//! is applied verbatim.

use core::fmt;

use heapless::Vec;
use platform::{DeviceNode, FreqHopParam, PanelError, PanelFreqHop};
use ril_bridge::{BridgeMsg, ChannelInfo, NotifyAction, RadioListener, DEV_ID_CHANNEL_INFO};

use crate::config::{AdaptiveMipiConfig, MAX_ROWS_PER_BUCKET};
use crate::error::ParseError;
use crate::keys;
use crate::parse::parse_range;
use crate::table::{search_matching_row, BandChannelRange, ChannelRow};

/// One row of the simple hop table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FreqHopRow {
    /// Carrier allocation.
    pub range: BandChannelRange,
    /// DSI clock to switch to.
    pub dsi_freq: u32,
    /// Oscillator clock to switch to.
    pub osc_freq: u32,
}

impl FreqHopRow {
    /// Clock pair of this row, unscaled.
    pub const fn param(&self) -> FreqHopParam {
        FreqHopParam::new(self.dsi_freq, self.osc_freq)
    }

    fn parse<D: DeviceNode>(entry: &D) -> Result<Self, ParseError> {
        let range = parse_range(entry)?;
        let dsi_freq = entry
            .read_u32(keys::DSI_FREQ)
            .map_err(ParseError::config(keys::DSI_FREQ))?;
        let osc_freq = entry
            .read_u32(keys::OSC_FREQ)
            .map_err(ParseError::config(keys::OSC_FREQ))?;
        Ok(Self {
            range,
            dsi_freq,
            osc_freq,
        })
    }
}

impl ChannelRow for FreqHopRow {
    fn range(&self) -> &BandChannelRange {
        &self.range
    }
}

/// Parsed simple hop table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreqHopTable {
    rows: Vec<FreqHopRow, MAX_ROWS_PER_BUCKET>,
    max_band_id: u32,
}

impl FreqHopTable {
    /// Table from rows already in memory.
    ///
    /// # Errors
    ///
    /// [`ParseError::TableFull`] or [`ParseError::InvertedRange`].
    pub fn from_rows(rows: &[FreqHopRow], config: AdaptiveMipiConfig) -> Result<Self, ParseError> {
        let mut table = Self {
            rows: Vec::new(),
            max_band_id: config.max_band_id,
        };
        for row in rows {
            row.range.validate()?;
            table.push(*row)?;
        }
        Ok(table)
    }

    /// Follow the panel's `freq-hop-table` phandle and parse its rows.
    ///
    /// # Errors
    ///
    /// [`ParseError::MissingTable`] for a missing or dangling phandle, or
    /// the first row error.
    pub fn parse<D: DeviceNode>(panel: &D, config: AdaptiveMipiConfig) -> Result<Self, ParseError> {
        let node = panel
            .parse_phandle(keys::FREQ_HOP_TABLE, 0)
            .ok_or(ParseError::MissingTable { index: 0 })?;
        Self::parse_rows(&node, config)
    }

    /// Parse the children of `node` as hop rows.
    ///
    /// # Errors
    ///
    /// The first row error, or [`ParseError::TableFull`].
    pub fn parse_rows<D: DeviceNode>(node: &D, config: AdaptiveMipiConfig) -> Result<Self, ParseError> {
        let mut table = Self {
            rows: Vec::new(),
            max_band_id: config.max_band_id,
        };
        for entry in node.children() {
            table.push(FreqHopRow::parse(&entry)?)?;
        }
        info!("freq hop: {} rows from {}", table.rows.len(), node.name());
        Ok(table)
    }

    fn push(&mut self, row: FreqHopRow) -> Result<(), ParseError> {
        self.rows.push(row).map_err(|_| ParseError::TableFull {
            capacity: MAX_ROWS_PER_BUCKET,
        })
    }

    /// Rows in configuration order.
    pub fn rows(&self) -> &[FreqHopRow] {
        &self.rows
    }

    /// First row matching `band` and `channel`; band ids past the limit
    /// never match.
    pub fn search_matching_row(&self, band: u32, channel: u32) -> Option<&FreqHopRow> {
        if band >= self.max_band_id {
            return None;
        }
        search_matching_row(&self.rows, band, channel)
    }
}

impl fmt::Display for FreqHopTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "freq hop: {} rows", self.rows.len())?;
        for row in &self.rows {
            writeln!(f, "  {} dsi {} osc {}", row.range, row.dsi_freq, row.osc_freq)?;
        }
        Ok(())
    }
}

/// Why a channel notification did not produce a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HopError {
    /// No row covers the serving channel.
    #[error("no hop row for band {band} channel {channel}")]
    NoMatch {
        /// Reported band.
        band: u32,
        /// Reported channel.
        channel: u32,
    },
    /// The panel rejected the switch.
    #[error("panel: {0}")]
    Panel(#[from] PanelError),
}

/// Simple frequency hop feature of one panel.
#[derive(Debug)]
pub struct FreqHop<P> {
    table: FreqHopTable,
    panel: P,
}

impl<P: PanelFreqHop> FreqHop<P> {
    /// Feature over an already-parsed table.
    pub const fn new(table: FreqHopTable, panel: P) -> Self {
        Self { table, panel }
    }

    /// Parse the panel's configuration node and build the feature.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`] from [`FreqHopTable::parse`].
    pub fn probe<D: DeviceNode>(
        node: &D,
        config: AdaptiveMipiConfig,
        panel: P,
    ) -> Result<Self, ParseError> {
        Ok(Self::new(FreqHopTable::parse(node, config)?, panel))
    }

    /// Parsed table.
    pub fn table(&self) -> &FreqHopTable {
        &self.table
    }

    /// Panel sink.
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Look up the serving channel and apply its clock pair.
    ///
    /// # Errors
    ///
    /// [`HopError::NoMatch`] when no row covers the channel (nothing is
    /// applied), [`HopError::Panel`] when the panel rejects the switch.
    pub fn apply_channel(&self, info: ChannelInfo) -> Result<FreqHopParam, HopError> {
        let row = self
            .table
            .search_matching_row(info.band, info.channel)
            .ok_or(HopError::NoMatch {
                band: info.band,
                channel: info.channel,
            })?;
        let param = row.param();
        self.panel.set_freq_hop(param)?;
        info!(
            "freq hop: band {} channel {} -> dsi {} osc {}",
            info.band, info.channel, param.dsi_freq, param.osc_freq
        );
        Ok(param)
    }
}

impl<P: PanelFreqHop> RadioListener for FreqHop<P> {
    fn on_radio_event(&self, msg: &BridgeMsg<'_>) -> NotifyAction {
        if msg.dev_id != DEV_ID_CHANNEL_INFO {
            return NotifyAction::Done;
        }
        let info = match msg.channel_info() {
            Ok(info) => info,
            Err(err) => {
                warn!("freq hop: malformed channel info: {}", err);
                return NotifyAction::Done;
            }
        };
        match self.apply_channel(info) {
            Ok(_) => NotifyAction::Ok,
            Err(err) => {
                error!("freq hop: {}", err);
                NotifyAction::Done
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::devtree_local::{DeviceTree, DtNode};
    use platform::mocks::MockPanel;
    use ril_bridge::msg::encode_channel_info;

    fn hop_row(band: u32, range: &[u32], dsi: u32, osc: u32) -> DtNode {
        DtNode::new("hop")
            .prop(keys::RF_BAND_ID, &[band])
            .prop(keys::RF_CHANNEL_RANGE, range)
            .prop(keys::DSI_FREQ, &[dsi])
            .prop(keys::OSC_FREQ, &[osc])
    }

    fn tree() -> DeviceTree {
        DeviceTree::new(
            DtNode::new("panel")
                .prop(keys::FREQ_HOP_TABLE, &[5])
                .child(
                    DtNode::new("hop-table")
                        .phandle(5)
                        .child(hop_row(1, &[0, 599], 1_108_000, 96_500))
                        .child(hop_row(3, &[1200, 1949], 1_124_000, 94_500)),
                ),
        )
    }

    fn feature() -> FreqHop<MockPanel> {
        FreqHop::probe(&tree().root(), AdaptiveMipiConfig::DEFAULT, MockPanel::new()).unwrap()
    }

    #[test]
    fn parses_rows_through_phandle() {
        let f = feature();
        assert_eq!(f.table().rows().len(), 2);
        assert_eq!(
            f.table().search_matching_row(3, 1949).map(FreqHopRow::param),
            Some(FreqHopParam::new(1_124_000, 94_500))
        );
    }

    #[test]
    fn match_applies_stored_pair_unscaled() {
        let f = feature();
        let raw = encode_channel_info(ChannelInfo {
            rat: 1,
            band: 1,
            channel: 300,
        });
        let action = f.on_radio_event(&BridgeMsg::new(DEV_ID_CHANNEL_INFO, &raw));
        assert_eq!(action, NotifyAction::Ok);
        assert_eq!(f.panel().last(), Some(FreqHopParam::new(1_108_000, 96_500)));
    }

    #[test]
    fn no_match_applies_nothing() {
        let f = feature();
        let info = ChannelInfo {
            rat: 1,
            band: 3,
            channel: 1950,
        };
        assert_eq!(
            f.apply_channel(info),
            Err(HopError::NoMatch {
                band: 3,
                channel: 1950
            })
        );
        assert_eq!(f.panel().apply_count(), 0);
    }

    #[test]
    fn missing_table_phandle_fails_probe() {
        let dt = DeviceTree::new(DtNode::new("panel"));
        assert_eq!(
            FreqHopTable::parse(&dt.root(), AdaptiveMipiConfig::DEFAULT),
            Err(ParseError::MissingTable { index: 0 })
        );
    }

    #[test]
    fn missing_osc_freq_fails_probe() {
        let dt = DeviceTree::new(
            DtNode::new("table").child(
                DtNode::new("hop")
                    .prop(keys::RF_BAND_ID, &[1])
                    .prop(keys::RF_CHANNEL_RANGE, &[0, 10])
                    .prop(keys::DSI_FREQ, &[1]),
            ),
        );
        assert!(matches!(
            FreqHopTable::parse_rows(&dt.root(), AdaptiveMipiConfig::DEFAULT),
            Err(ParseError::Config {
                key: keys::OSC_FREQ,
                ..
            })
        ));
    }

    #[test]
    fn panel_error_surfaces() {
        let f = FreqHop::probe(
            &tree().root(),
            AdaptiveMipiConfig::DEFAULT,
            MockPanel::failing(PanelError::Communication),
        )
        .unwrap();
        let info = ChannelInfo {
            rat: 1,
            band: 1,
            channel: 0,
        };
        assert_eq!(
            f.apply_channel(info),
            Err(HopError::Panel(PanelError::Communication))
        );
    }
}
