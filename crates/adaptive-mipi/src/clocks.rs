//! Candidate clock lists.

use core::fmt;

use heapless::Vec;
use platform::DeviceNode;

use crate::config::{MAX_MIPI_FREQ, MAX_OSC_FREQ};
use crate::error::ParseError;
use crate::keys;

/// The discrete display and oscillator clocks a panel can run at.
///
/// Rating vectors are indexed by position in [`mipi`](Self::mipi); the SDP
/// oscillator table indexes [`osc`](Self::osc).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateClockSet {
    /// Candidate MIPI DSI clocks, in rating-vector order.
    pub mipi: Vec<u32, MAX_MIPI_FREQ>,
    /// Candidate oscillator clocks.
    pub osc: Vec<u32, MAX_OSC_FREQ>,
}

impl CandidateClockSet {
    /// Build from slices.
    ///
    /// # Errors
    ///
    /// [`ParseError::Empty`] or [`ParseError::TooMany`] when a list is
    /// empty or longer than its capacity.
    pub fn new(mipi: &[u32], osc: &[u32]) -> Result<Self, ParseError> {
        Ok(Self {
            mipi: bounded(keys::MIPI_FREQ_LISTS, mipi)?,
            osc: bounded(keys::OSC_FREQ_LISTS, osc)?,
        })
    }

    /// Number of candidate display clocks.
    pub fn mipi_count(&self) -> usize {
        self.mipi.len()
    }

    /// Display clock `index`.
    pub fn mipi_clock(&self, index: usize) -> Option<u32> {
        self.mipi.get(index).copied()
    }

    /// Oscillator clock `index`.
    pub fn osc_clock(&self, index: usize) -> Option<u32> {
        self.osc.get(index).copied()
    }
}

impl fmt::Display for CandidateClockSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mipi:")?;
        for clock in &self.mipi {
            write!(f, " {clock}")?;
        }
        write!(f, ", osc:")?;
        for clock in &self.osc {
            write!(f, " {clock}")?;
        }
        Ok(())
    }
}

fn bounded<const N: usize>(key: &'static str, values: &[u32]) -> Result<Vec<u32, N>, ParseError> {
    if values.is_empty() {
        return Err(ParseError::Empty { key });
    }
    Vec::from_slice(values).map_err(|_| ParseError::TooMany {
        key,
        max: N,
        found: values.len(),
    })
}

/// Read a whole `u32` list property of at most `N` values.
pub(crate) fn read_list<D: DeviceNode, const N: usize>(
    node: &D,
    key: &'static str,
) -> Result<Vec<u32, N>, ParseError> {
    let count = node.count_u32_elems(key).map_err(ParseError::config(key))?;
    if count == 0 {
        return Err(ParseError::Empty { key });
    }
    if count > N {
        return Err(ParseError::TooMany {
            key,
            max: N,
            found: count,
        });
    }
    let mut out = Vec::new();
    for index in 0..count {
        let value = node
            .read_u32_index(key, index)
            .map_err(ParseError::config(key))?;
        // count <= N was checked above
        out.push(value).map_err(|_| ParseError::TooMany {
            key,
            max: N,
            found: count,
        })?;
    }
    Ok(out)
}

/// Read the candidate display and oscillator clock lists of `node`.
///
/// # Errors
///
/// [`ParseError::Config`] when either list is missing,
/// [`ParseError::Empty`] or [`ParseError::TooMany`] when a list has no
/// values or more than [`MAX_MIPI_FREQ`] / [`MAX_OSC_FREQ`].
pub fn parse_candidate_clocks<D: DeviceNode>(node: &D) -> Result<CandidateClockSet, ParseError> {
    let mipi = read_list::<_, MAX_MIPI_FREQ>(node, keys::MIPI_FREQ_LISTS)?;
    let osc = read_list::<_, MAX_OSC_FREQ>(node, keys::OSC_FREQ_LISTS)?;
    debug!(
        "candidate clocks: {} mipi, {} osc",
        mipi.len(),
        osc.len()
    );
    Ok(CandidateClockSet { mipi, osc })
}
