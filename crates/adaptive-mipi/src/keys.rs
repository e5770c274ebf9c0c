//! Device-tree property names read by the panel features.

/// Band id of one rating / hop row.
pub const RF_BAND_ID: &str = "rf-band-id";
/// Inclusive `<from to>` channel range of one row.
pub const RF_CHANNEL_RANGE: &str = "rf-channel-range";
/// Per-candidate interference rating of one row.
pub const RATING: &str = "rating";
/// Optional oscillator clock carried by a rating row.
pub const OSC_FREQ_OVERRIDE: &str = "osc-freq-override";
/// Candidate MIPI DSI clocks.
pub const MIPI_FREQ_LISTS: &str = "mipi-freq-lists";
/// Candidate oscillator clocks.
pub const OSC_FREQ_LISTS: &str = "osc-freq-lists";
/// Phandles of the per-bandwidth rating tables, narrow first.
pub const RF_TABLE_LISTS: &str = "rf-table-lists";

/// Flat `<rat band from end rating...>` table of the SDP variant.
pub const SDP_MIPI_TABLE: &str = "sdp-mipi-table";
/// Flat `<rat band from end osc_index>` table of the SDP variant.
pub const SDP_OSC_TABLE: &str = "sdp-osc-table";

/// Phandle of the simple hop table.
pub const FREQ_HOP_TABLE: &str = "freq-hop-table";
/// DSI clock of one simple hop row.
pub const DSI_FREQ: &str = "dsi-freq";
/// Oscillator clock of one simple hop row.
pub const OSC_FREQ: &str = "osc-freq";
