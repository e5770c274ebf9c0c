//! Manual radio-event injection for bring-up and desktop runs.
//!
//! [`CpInfoInjector`] accumulates cells, from structs or from text lines,
//! then encodes them as one adaptive-MIPI frame and publishes it on the
//! bus exactly as the baseband bridge would.
//!
//! Text line layout, whitespace separated, decimal:
//!
//! ```text
//! rat band channel status bandwidth_khz sinr [rsrp rsrq cqi dl_mcs pusch_power]
//! ```
//!
//! `status` is the wire value: `1` primary, anything else secondary. The
//! five trailing diagnostic fields are optional and default to zero.

use core::str::{FromStr, SplitAsciiWhitespace};

use ril_bridge::msg::{encode_channel_info, encode_cp_info, CP_INFO_LEN};
use ril_bridge::{
    BridgeMsg, CellReport, ChannelInfo, ConnectionStatus, MultiCellReport, RadioBus,
    DEV_ID_ADAPTIVE_MIPI_INFO, DEV_ID_CHANNEL_INFO, MAX_CELLS,
};

use crate::error::InjectError;

/// Number of fields a full cell line carries.
pub const CELL_LINE_FIELDS: usize = 11;

/// Pending multi-cell report waiting to be fired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpInfoInjector {
    report: MultiCellReport,
}

impl CpInfoInjector {
    /// Empty injector.
    pub const fn new() -> Self {
        Self {
            report: MultiCellReport::new(),
        }
    }

    /// Append one cell.
    ///
    /// # Errors
    ///
    /// [`InjectError::Full`] once [`MAX_CELLS`] cells are pending.
    pub fn push(&mut self, cell: CellReport) -> Result<(), InjectError> {
        self.report
            .push(cell)
            .map_err(|_| InjectError::Full { max: MAX_CELLS })
    }

    /// Parse a text line and append the cell it describes.
    ///
    /// # Errors
    ///
    /// Any error from [`parse_cell_line`] or [`Self::push`].
    pub fn push_line(&mut self, line: &str) -> Result<(), InjectError> {
        self.push(parse_cell_line(line)?)
    }

    /// Drop every pending cell.
    pub fn clear(&mut self) {
        self.report.clear();
    }

    /// Pending cells.
    pub fn report(&self) -> &MultiCellReport {
        &self.report
    }

    /// Number of pending cells.
    pub fn len(&self) -> usize {
        self.report.len()
    }

    /// Returns `true` when no cell is pending.
    pub fn is_empty(&self) -> bool {
        self.report.is_empty()
    }

    /// Encode the pending cells as an adaptive-MIPI payload.
    pub fn frame(&self) -> [u8; CP_INFO_LEN] {
        encode_cp_info(&self.report)
    }

    /// Publish the pending cells on `bus`.
    ///
    /// The cells stay pending, so the same report can be fired again.
    /// Returns how many listeners consumed the frame.
    pub fn fire<const N: usize>(&self, bus: &RadioBus<'_, N>) -> usize {
        let frame = self.frame();
        let consumed = bus.publish(&BridgeMsg::new(DEV_ID_ADAPTIVE_MIPI_INFO, &frame));
        info!("cp info: fired {} cells, {} consumers", self.report.len(), consumed);
        consumed
    }
}

/// Publish a single serving-channel notification on `bus`.
///
/// Returns how many listeners consumed it.
pub fn fire_channel_info<const N: usize>(bus: &RadioBus<'_, N>, info: ChannelInfo) -> usize {
    let frame = encode_channel_info(info);
    let consumed = bus.publish(&BridgeMsg::new(DEV_ID_CHANNEL_INFO, &frame));
    info!(
        "channel info: band {} channel {}, {} consumers",
        info.band, info.channel, consumed
    );
    consumed
}

/// Parse one cell from a whitespace-separated text line.
///
/// # Errors
///
/// [`InjectError::MissingField`] when one of the six leading fields is
/// absent, [`InjectError::BadNumber`] when a field does not parse and
/// [`InjectError::Trailing`] when more than [`CELL_LINE_FIELDS`] are given.
pub fn parse_cell_line(line: &str) -> Result<CellReport, InjectError> {
    let mut fields = line.split_ascii_whitespace();

    let rat = required::<u32>(&mut fields, "rat")?;
    let band = required::<u32>(&mut fields, "band")?;
    let channel = required::<u32>(&mut fields, "channel")?;
    let status = required::<u32>(&mut fields, "status")?;
    let bandwidth_khz = required::<u32>(&mut fields, "bandwidth_khz")?;
    let sinr = required::<i32>(&mut fields, "sinr")?;

    let cell = CellReport {
        rsrp: optional(&mut fields, "rsrp")?,
        rsrq: optional(&mut fields, "rsrq")?,
        cqi: optional(&mut fields, "cqi")?,
        dl_mcs: optional(&mut fields, "dl_mcs")?,
        pusch_power: optional(&mut fields, "pusch_power")?,
        ..CellReport::new(
            band,
            channel,
            ConnectionStatus::from_wire(status),
            bandwidth_khz,
            sinr,
        )
        .with_rat(rat)
    };

    if fields.next().is_some() {
        return Err(InjectError::Trailing {
            fields: CELL_LINE_FIELDS,
        });
    }
    Ok(cell)
}

fn required<T: FromStr>(
    fields: &mut SplitAsciiWhitespace<'_>,
    name: &'static str,
) -> Result<T, InjectError> {
    fields
        .next()
        .ok_or(InjectError::MissingField(name))?
        .parse()
        .map_err(|_| InjectError::BadNumber(name))
}

fn optional<T: FromStr + Default>(
    fields: &mut SplitAsciiWhitespace<'_>,
    name: &'static str,
) -> Result<T, InjectError> {
    fields.next().map_or(Ok(T::default()), |f| {
        f.parse().map_err(|_| InjectError::BadNumber(name))
    })
}
