//! Mock implementations for testing
//!
//! This module provides mock implementations of the platform traits
//! for use in unit and integration tests.

#![cfg(any(test, feature = "std"))]

use std::sync::Mutex;
use std::vec::Vec;

use crate::panel::{FreqHopParam, PanelError, PanelFreqHop};

/// Mock panel recording every frequency hop it receives
#[derive(Debug, Default)]
pub struct MockPanel {
    applied: Mutex<Vec<FreqHopParam>>,
    fail_with: Option<PanelError>,
}

impl MockPanel {
    /// Create a mock panel that accepts every hop
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock panel that rejects every hop with `err`
    pub fn failing(err: PanelError) -> Self {
        Self {
            applied: Mutex::new(Vec::new()),
            fail_with: Some(err),
        }
    }

    /// Hops applied so far, oldest first
    pub fn applied(&self) -> Vec<FreqHopParam> {
        self.applied
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Number of hops applied
    pub fn apply_count(&self) -> usize {
        self.applied.lock().map(|v| v.len()).unwrap_or(0)
    }

    /// Most recent hop
    pub fn last(&self) -> Option<FreqHopParam> {
        self.applied.lock().ok().and_then(|v| v.last().copied())
    }
}

impl PanelFreqHop for MockPanel {
    fn set_freq_hop(&self, param: FreqHopParam) -> Result<(), PanelError> {
        if let Some(err) = self.fail_with {
            return Err(err);
        }
        if let Ok(mut v) = self.applied.lock() {
            v.push(param);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_panel_records_hops_in_order() {
        let panel = MockPanel::new();
        panel.set_freq_hop(FreqHopParam::new(1, 0)).ok();
        panel.set_freq_hop(FreqHopParam::new(2, 3)).ok();
        assert_eq!(panel.apply_count(), 2);
        assert_eq!(panel.last(), Some(FreqHopParam::new(2, 3)));
    }

    #[test]
    fn failing_panel_records_nothing() {
        let panel = MockPanel::failing(PanelError::NotActive);
        assert_eq!(
            panel.set_freq_hop(FreqHopParam::new(1, 0)),
            Err(PanelError::NotActive)
        );
        assert_eq!(panel.apply_count(), 0);
    }
}
