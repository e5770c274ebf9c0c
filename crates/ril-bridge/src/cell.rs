//! Decoded baseband cell reports.
//!
//! A [`CellReport`] is one serving or neighbouring cell observation. Reports
//! are built fresh from each radio message, consumed by one decision cycle,
//! and never stored beyond it.

use heapless::Vec;

/// Maximum cells the baseband reports in one snapshot.
pub const MAX_CELLS: usize = 16;

/// Role of a cell in carrier aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionStatus {
    /// Primary serving cell.
    Primary,
    /// Secondary serving cell, or any non-primary observation.
    Secondary,
}

impl ConnectionStatus {
    /// Wire value for a primary serving cell.
    pub const WIRE_PRIMARY: u32 = 1;
    /// Wire value for a secondary serving cell.
    pub const WIRE_SECONDARY: u32 = 2;

    /// Decode the wire value: `1` is primary, everything else secondary.
    #[must_use]
    pub const fn from_wire(value: u32) -> Self {
        if value == Self::WIRE_PRIMARY {
            Self::Primary
        } else {
            Self::Secondary
        }
    }

    /// Encode to the wire value.
    #[must_use]
    pub const fn to_wire(self) -> u32 {
        match self {
            Self::Primary => Self::WIRE_PRIMARY,
            Self::Secondary => Self::WIRE_SECONDARY,
        }
    }
}

/// One cell observation from the baseband.
///
/// `rsrp`, `rsrq`, `cqi`, `dl_mcs` and `pusch_power` are carried for
/// diagnostics; clock selection only reads band, channel, status,
/// bandwidth and SINR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellReport {
    /// Radio access technology.
    pub rat: u32,
    /// RF band id.
    pub band: u32,
    /// Channel number (EARFCN / NR-ARFCN style).
    pub channel: u32,
    /// Serving role.
    pub status: ConnectionStatus,
    /// Occupied channel bandwidth in kHz.
    pub bandwidth_khz: u32,
    /// Signal to interference plus noise ratio, dB.
    pub sinr: i32,
    /// Reference signal received power.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rsrp: i32,
    /// Reference signal received quality.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rsrq: i32,
    /// Channel quality indicator.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cqi: u32,
    /// Downlink modulation and coding scheme.
    #[cfg_attr(feature = "serde", serde(default))]
    pub dl_mcs: u32,
    /// Uplink shared channel transmit power.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pusch_power: i32,
}

impl CellReport {
    /// Number of 32-bit words one cell occupies on the wire.
    pub const WORDS: usize = 11;

    /// Report with only the fields clock selection reads; auxiliary fields are zero.
    #[must_use]
    pub const fn new(
        band: u32,
        channel: u32,
        status: ConnectionStatus,
        bandwidth_khz: u32,
        sinr: i32,
    ) -> Self {
        Self {
            rat: 0,
            band,
            channel,
            status,
            bandwidth_khz,
            sinr,
            rsrp: 0,
            rsrq: 0,
            cqi: 0,
            dl_mcs: 0,
            pusch_power: 0,
        }
    }

    /// Same report with `rat` set.
    #[must_use]
    pub const fn with_rat(mut self, rat: u32) -> Self {
        self.rat = rat;
        self
    }

    /// Returns `true` for the primary serving cell.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        matches!(self.status, ConnectionStatus::Primary)
    }

    /// Decode from wire words, in declaration order.
    #[must_use]
    pub fn from_words(w: [u32; Self::WORDS]) -> Self {
        let [rat, band, channel, status, bandwidth_khz, sinr, rsrp, rsrq, cqi, dl_mcs, pusch] = w;
        Self {
            rat,
            band,
            channel,
            status: ConnectionStatus::from_wire(status),
            bandwidth_khz,
            sinr: signed(sinr),
            rsrp: signed(rsrp),
            rsrq: signed(rsrq),
            cqi,
            dl_mcs,
            pusch_power: signed(pusch),
        }
    }

    /// Encode to wire words, in declaration order.
    #[must_use]
    pub fn to_words(&self) -> [u32; Self::WORDS] {
        [
            self.rat,
            self.band,
            self.channel,
            self.status.to_wire(),
            self.bandwidth_khz,
            unsigned(self.sinr),
            unsigned(self.rsrp),
            unsigned(self.rsrq),
            self.cqi,
            self.dl_mcs,
            unsigned(self.pusch_power),
        ]
    }
}

fn signed(w: u32) -> i32 {
    i32::from_ne_bytes(w.to_ne_bytes())
}

fn unsigned(v: i32) -> u32 {
    u32::from_ne_bytes(v.to_ne_bytes())
}

/// One simultaneous snapshot of up to [`MAX_CELLS`] cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiCellReport {
    cells: Vec<CellReport, MAX_CELLS>,
}

impl MultiCellReport {
    /// Empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Build from a slice; `None` if it holds more than [`MAX_CELLS`] cells.
    #[must_use]
    pub fn from_slice(cells: &[CellReport]) -> Option<Self> {
        Vec::from_slice(cells).ok().map(|cells| Self { cells })
    }

    /// Append a cell; hands it back when the report is full.
    pub fn push(&mut self, cell: CellReport) -> Result<(), CellReport> {
        self.cells.push(cell)
    }

    /// Cells in report order.
    #[must_use]
    pub fn cells(&self) -> &[CellReport] {
        &self.cells
    }

    /// Iterate cells in report order.
    pub fn iter(&self) -> core::slice::Iter<'_, CellReport> {
        self.cells.iter()
    }

    /// The primary serving cell, if reported.
    #[must_use]
    pub fn primary(&self) -> Option<&CellReport> {
        self.cells.iter().find(|c| c.is_primary())
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` when no cells were reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Remove all cells.
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

impl<'r> IntoIterator for &'r MultiCellReport {
    type Item = &'r CellReport;
    type IntoIter = core::slice::Iter<'r, CellReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Single-cell band/channel notification used by the simple hop table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelInfo {
    /// Radio access technology.
    pub rat: u8,
    /// RF band id.
    pub band: u32,
    /// Channel number.
    pub channel: u32,
}
