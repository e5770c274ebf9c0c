//! Application-layer errors

use adaptive_mipi::{ParseError, SdpError};
use ril_bridge::BusError;

/// Panel probe, registration and removal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeError {
    /// The context already manages its maximum number of panels
    #[error("panel context is full ({max} panels)")]
    TooManyPanels {
        /// Context capacity
        max: usize,
    },
    /// The node carries none of the keys that select a variant
    #[error("no adaptive-mipi table on the panel node")]
    NoFeature,
    /// Listeners are already on a bus
    #[error("panel listeners are already registered")]
    AlreadyRegistered,
    /// Table parsing failed
    #[error("table: {0}")]
    Parse(#[from] ParseError),
    /// SDP lifecycle transition failed
    #[error("sdp: {0}")]
    Sdp(#[from] SdpError),
    /// The radio bus has no free listener slot
    #[error("bus: {0}")]
    Bus(#[from] BusError),
}

/// Debug cell-injection errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InjectError {
    /// The pending report already holds the maximum number of cells
    #[error("cell report is full ({max} cells)")]
    Full {
        /// Report capacity
        max: usize,
    },
    /// A required field is absent from the text line
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// A field is not a decimal integer
    #[error("field `{0}` is not a number")]
    BadNumber(&'static str),
    /// The line carries more fields than a cell has
    #[error("trailing input after {fields} fields")]
    Trailing {
        /// Number of fields a cell line holds
        fields: usize,
    },
}
