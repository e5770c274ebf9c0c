//! Simulated panel for desktop runs and tests.
//!
//! Radio events may arrive on any thread, so the apply path is serialised
//! with an `embassy-sync` blocking mutex over a critical-section raw mutex,
//! the same primitive target builds use for state shared with interrupts.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use platform::{FreqHopParam, PanelError, PanelFreqHop};

#[derive(Debug, Clone, Copy)]
struct PanelState {
    powered: bool,
    last: Option<FreqHopParam>,
    apply_count: u32,
}

/// Panel stand-in that records the clock pairs it is switched to.
pub struct SimulatedPanel {
    name: &'static str,
    state: Mutex<CriticalSectionRawMutex, Cell<PanelState>>,
}

impl SimulatedPanel {
    /// Powered panel with no clock applied yet.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(Cell::new(PanelState {
                powered: true,
                last: None,
                apply_count: 0,
            })),
        }
    }

    /// Panel name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Power the panel off; later hops fail with [`PanelError::NotActive`].
    pub fn power_off(&self) {
        self.update(|s| s.powered = false);
    }

    /// Power the panel back on. The last applied clock is kept.
    pub fn power_on(&self) {
        self.update(|s| s.powered = true);
    }

    /// Returns `true` while the panel accepts hops.
    pub fn is_powered(&self) -> bool {
        self.snapshot().powered
    }

    /// Most recently applied clock pair.
    pub fn last_applied(&self) -> Option<FreqHopParam> {
        self.snapshot().last
    }

    /// Number of hops applied since creation.
    pub fn apply_count(&self) -> u32 {
        self.snapshot().apply_count
    }

    fn snapshot(&self) -> PanelState {
        self.state.lock(Cell::get)
    }

    fn update(&self, f: impl FnOnce(&mut PanelState)) {
        self.state.lock(|cell| {
            let mut s = cell.get();
            f(&mut s);
            cell.set(s);
        });
    }
}

impl PanelFreqHop for SimulatedPanel {
    fn set_freq_hop(&self, param: FreqHopParam) -> Result<(), PanelError> {
        self.state.lock(|cell| {
            let mut s = cell.get();
            if !s.powered {
                return Err(PanelError::NotActive);
            }
            s.last = Some(param);
            s.apply_count = s.apply_count.saturating_add(1);
            cell.set(s);
            Ok(())
        })?;
        debug!(
            "{}: dsi {} osc {}",
            self.name, param.dsi_freq, param.osc_freq
        );
        Ok(())
    }
}

impl core::fmt::Debug for SimulatedPanel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = self.snapshot();
        f.debug_struct("SimulatedPanel")
            .field("name", &self.name)
            .field("powered", &s.powered)
            .field("last", &s.last)
            .field("apply_count", &s.apply_count)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn records_last_hop_and_count() {
        let panel = SimulatedPanel::new("panel0");
        panel.set_freq_hop(FreqHopParam::new(1_108_000, 0)).unwrap();
        panel.set_freq_hop(FreqHopParam::new(1_124_000, 0)).unwrap();
        assert_eq!(panel.last_applied(), Some(FreqHopParam::new(1_124_000, 0)));
        assert_eq!(panel.apply_count(), 2);
    }

    #[test]
    fn powered_off_panel_rejects_hops() {
        let panel = SimulatedPanel::new("panel0");
        panel.power_off();
        assert_eq!(
            panel.set_freq_hop(FreqHopParam::new(1141, 96_500)),
            Err(PanelError::NotActive)
        );
        assert_eq!(panel.apply_count(), 0);
        assert_eq!(panel.last_applied(), None);

        panel.power_on();
        assert!(panel.is_powered());
        panel.set_freq_hop(FreqHopParam::new(1141, 96_500)).unwrap();
        assert_eq!(panel.apply_count(), 1);
    }

    #[test]
    fn concurrent_hops_are_all_counted() {
        let panel = SimulatedPanel::new("panel0");
        std::thread::scope(|s| {
            for t in 0..4u32 {
                let panel = &panel;
                s.spawn(move || {
                    for i in 0..100u32 {
                        panel
                            .set_freq_hop(FreqHopParam::new(t.saturating_mul(1000).saturating_add(i), 0))
                            .unwrap();
                    }
                });
            }
        });
        assert_eq!(panel.apply_count(), 400);
    }
}
