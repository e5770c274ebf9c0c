//! Panel frequency-hop abstraction layer

/// Clock pair handed to the panel command layer on a frequency hop.
///
/// Units are whatever the issuing variant emits: the scored adaptive-MIPI
/// variant scales its table clock by 1000, the simple and SDP variants pass
/// the configured value through unchanged. The panel layer does not convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FreqHopParam {
    /// MIPI DSI high-speed clock.
    pub dsi_freq: u32,
    /// Panel oscillator clock; `0` means "leave unchanged".
    pub osc_freq: u32,
}

impl FreqHopParam {
    /// Build a parameter from a DSI clock and an oscillator clock.
    pub const fn new(dsi_freq: u32, osc_freq: u32) -> Self {
        Self { dsi_freq, osc_freq }
    }

    /// Returns `true` when the oscillator clock is left unchanged.
    pub const fn osc_unset(&self) -> bool {
        self.osc_freq == 0
    }
}

/// Sink for clock-switch commands.
///
/// Implemented by whichever component owns the live panel connection. The
/// call reaches shared panel state, so an implementation serialises itself;
/// callers may invoke it from any radio-event thread.
pub trait PanelFreqHop {
    /// Switch the panel to `param`.
    fn set_freq_hop(&self, param: FreqHopParam) -> Result<(), PanelError>;
}

impl<T: PanelFreqHop + ?Sized> PanelFreqHop for &T {
    fn set_freq_hop(&self, param: FreqHopParam) -> Result<(), PanelError> {
        (**self).set_freq_hop(param)
    }
}

/// Panel command errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    /// Panel is powered off or not yet initialised
    #[error("panel is not active")]
    NotActive,
    /// The command sequence could not be transmitted
    #[error("panel command transfer failed")]
    Communication,
    /// The requested clock is not supported by the panel
    #[error("unsupported clock {dsi_freq}/{osc_freq}")]
    UnsupportedClock {
        /// Requested DSI clock
        dsi_freq: u32,
        /// Requested oscillator clock
        osc_freq: u32,
    },
}
