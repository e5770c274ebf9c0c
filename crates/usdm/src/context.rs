//! Panel context: the explicit owner of every panel's adaptive-MIPI state.
//!
//! Lifecycle:
//!
//! 1. [`PanelContext::probe`] once per panel node (`&mut self`),
//! 2. [`PanelRegistry::register`] puts every listener on the radio bus,
//! 3. radio events flow,
//! 4. [`PanelRegistry::remove`] takes them off again.
//!
//! Registration borrows the registry for as long as the bus lives, so no
//! panel can be probed or dropped while its listener is reachable.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use adaptive_mipi::{
    keys, AdaptiveMipi, AdaptiveMipiConfig, FreqHop, SdpAdaptiveMipi, SdpError, SdpState,
    WeightedScorer,
};
use heapless::{String, Vec};
use platform::config::MAX_PANELS;
use platform::{DeviceNode, PanelFreqHop};
use ril_bridge::{BridgeMsg, BusError, NotifyAction, RadioBus, RadioListener, SubscriptionId};

use crate::debug::CpInfoInjector;
use crate::error::ProbeError;

/// Longest panel name kept for logs; longer names are cut.
pub const MAX_PANEL_NAME: usize = 32;

/// Which adaptive-MIPI flavour a panel node configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    /// Multi-cell scoring over bucketed rating tables.
    Scored,
    /// Serving-channel lookup in a fixed hop table.
    Simple,
    /// SDP v2 tables handed to a pluggable scorer.
    Sdp,
}

impl Variant {
    /// Variant selected by the keys present on `node`.
    ///
    /// `sdp-mipi-table` wins over `rf-table-lists`, which wins over
    /// `freq-hop-table`.
    pub fn detect<D: DeviceNode>(node: &D) -> Option<Self> {
        if node.has_property(keys::SDP_MIPI_TABLE) {
            Some(Self::Sdp)
        } else if node.has_property(keys::RF_TABLE_LISTS) {
            Some(Self::Scored)
        } else if node.has_property(keys::FREQ_HOP_TABLE) {
            Some(Self::Simple)
        } else {
            None
        }
    }

    /// Short name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scored => "scored",
            Self::Simple => "simple",
            Self::Sdp => "sdp",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One panel's adaptive-MIPI feature.
#[allow(clippy::large_enum_variant)]
#[derive(Debug)]
pub enum MipiFeature<P> {
    /// Scored variant.
    Scored(AdaptiveMipi<P>),
    /// Simple hop-table variant.
    Simple(FreqHop<P>),
    /// SDP variant with the reference scorer.
    Sdp(SdpAdaptiveMipi<WeightedScorer, P>),
}

impl<P: PanelFreqHop> MipiFeature<P> {
    /// Parse `node` as `variant` and build the feature.
    pub fn probe<D: DeviceNode>(
        variant: Variant,
        node: &D,
        config: AdaptiveMipiConfig,
        panel: P,
    ) -> Result<Self, ProbeError> {
        Ok(match variant {
            Variant::Scored => Self::Scored(AdaptiveMipi::probe(node, config, panel)?),
            Variant::Simple => Self::Simple(FreqHop::probe(node, config, panel)?),
            Variant::Sdp => {
                let mut sdp = SdpAdaptiveMipi::new(WeightedScorer::new(config.weights), panel);
                sdp.parse(node)?;
                Self::Sdp(sdp)
            }
        })
    }

    /// Which variant this is.
    pub const fn variant(&self) -> Variant {
        match self {
            Self::Scored(_) => Variant::Scored,
            Self::Simple(_) => Variant::Simple,
            Self::Sdp(_) => Variant::Sdp,
        }
    }

    /// Panel sink.
    pub fn panel(&self) -> &P {
        match self {
            Self::Scored(f) => f.panel(),
            Self::Simple(f) => f.panel(),
            Self::Sdp(f) => f.panel(),
        }
    }

    /// Number of table rows the feature parsed.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Scored(f) => f.table().row_count(),
            Self::Simple(f) => f.table().rows().len(),
            Self::Sdp(f) => f.with_tables(|t| {
                t.map_or(0, |t| t.mipi_rows.len().saturating_add(t.osc_rows.len()))
            }),
        }
    }
}

impl<P: PanelFreqHop> RadioListener for MipiFeature<P> {
    fn on_radio_event(&self, msg: &BridgeMsg<'_>) -> NotifyAction {
        match self {
            Self::Scored(f) => f.on_radio_event(msg),
            Self::Simple(f) => f.on_radio_event(msg),
            Self::Sdp(f) => f.on_radio_event(msg),
        }
    }
}

/// Table dump of the feature.
impl<P: PanelFreqHop> fmt::Display for MipiFeature<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scored(m) => write!(f, "{}", m.table()),
            Self::Simple(m) => write!(f, "{}", m.table()),
            Self::Sdp(m) => m.with_tables(|t| match t {
                Some(t) => write!(f, "{t}"),
                None => f.write_str("sdp: no tables"),
            }),
        }
    }
}

/// A probed panel.
#[derive(Debug)]
pub struct PanelEntry<P> {
    name: String<MAX_PANEL_NAME>,
    feature: MipiFeature<P>,
}

impl<P> PanelEntry<P> {
    /// Node name the panel was probed from.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The panel's feature.
    pub fn feature(&self) -> &MipiFeature<P> {
        &self.feature
    }
}

/// Bus subscriptions made by [`PanelRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    ids: Vec<SubscriptionId, MAX_PANELS>,
}

impl Registration {
    /// Subscription handles, in panel order.
    pub fn ids(&self) -> &[SubscriptionId] {
        &self.ids
    }
}

/// Every probed panel of a context.
#[derive(Debug)]
pub struct PanelRegistry<P> {
    panels: Vec<PanelEntry<P>, MAX_PANELS>,
    registered: AtomicBool,
}

impl<P: PanelFreqHop + Sync> PanelRegistry<P> {
    const fn new() -> Self {
        Self {
            panels: Vec::new(),
            registered: AtomicBool::new(false),
        }
    }

    /// Probed panels, in probe order.
    pub fn panels(&self) -> &[PanelEntry<P>] {
        &self.panels
    }

    /// Panel at `index`.
    pub fn get(&self, index: usize) -> Option<&PanelEntry<P>> {
        self.panels.get(index)
    }

    /// Number of probed panels.
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    /// Returns `true` when nothing has been probed.
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Returns `true` while listeners are on a bus.
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Subscribe every panel's listener to `bus`, in probe order.
    ///
    /// SDP features move from parsed to registered first. Nothing is
    /// subscribed unless every panel can be.
    ///
    /// # Errors
    ///
    /// [`ProbeError::AlreadyRegistered`] on a second call without
    /// [`Self::remove`], [`ProbeError::Bus`] when `bus` lacks room for every
    /// panel, [`ProbeError::Sdp`] when an SDP feature is not freshly parsed.
    pub fn register<'a, const N: usize>(
        &'a self,
        bus: &mut RadioBus<'a, N>,
    ) -> Result<Registration, ProbeError> {
        if self
            .registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ProbeError::AlreadyRegistered);
        }
        match self.subscribe_all(bus) {
            Ok(reg) => Ok(reg),
            Err(e) => {
                self.registered.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    fn subscribe_all<'a, const N: usize>(
        &'a self,
        bus: &mut RadioBus<'a, N>,
    ) -> Result<Registration, ProbeError> {
        if N.saturating_sub(bus.len()) < self.panels.len() {
            return Err(BusError::Full.into());
        }
        for entry in &self.panels {
            if let MipiFeature::Sdp(sdp) = &entry.feature {
                let from = sdp.state();
                if from != SdpState::Parsed {
                    return Err(SdpError::InvalidTransition {
                        from,
                        to: SdpState::Registered,
                    }
                    .into());
                }
            }
        }

        let mut ids = Vec::new();
        for entry in &self.panels {
            if let MipiFeature::Sdp(sdp) = &entry.feature {
                sdp.register()?;
            }
            let id = bus.subscribe(&entry.feature)?;
            ids.push(id).map_err(|_| BusError::Full)?;
            debug!(
                "{}: {} listener registered",
                entry.name.as_str(),
                entry.feature.variant().as_str()
            );
        }
        info!("{} panel listeners registered", ids.len());
        Ok(Registration { ids })
    }

    /// Take every listener of `registration` off `bus`.
    ///
    /// Listeners are unsubscribed first; SDP features then move to removed
    /// and drop their tables.
    ///
    /// # Errors
    ///
    /// [`ProbeError::Sdp`] for the first SDP feature that refuses to move
    /// to removed. Every listener is off the bus regardless.
    pub fn remove<const N: usize>(
        &self,
        bus: &mut RadioBus<'_, N>,
        registration: Registration,
    ) -> Result<(), ProbeError> {
        for id in registration.ids {
            if !bus.unsubscribe(id) {
                warn!("remove: listener was not subscribed");
            }
        }
        self.registered.store(false, Ordering::Release);

        let mut result = Ok(());
        for entry in &self.panels {
            if let MipiFeature::Sdp(sdp) = &entry.feature {
                if let Err(e) = sdp.remove() {
                    warn!("{}: sdp remove failed", entry.name.as_str());
                    if result.is_ok() {
                        result = Err(e.into());
                    }
                }
            }
        }
        result
    }
}

/// Owner of every panel, the bus-facing registry and the debug injector.
///
/// Replaces file-scope panel lists: all state hangs off one value passed by
/// reference.
#[derive(Debug)]
pub struct PanelContext<P> {
    config: AdaptiveMipiConfig,
    registry: PanelRegistry<P>,
    injector: CpInfoInjector,
}

impl<P: PanelFreqHop + Sync> PanelContext<P> {
    /// Empty context using `config` for every panel.
    pub const fn new(config: AdaptiveMipiConfig) -> Self {
        Self {
            config,
            registry: PanelRegistry::new(),
            injector: CpInfoInjector::new(),
        }
    }

    /// Tunables shared by every panel.
    pub fn config(&self) -> &AdaptiveMipiConfig {
        &self.config
    }

    /// Probe one panel node and take ownership of its sink.
    ///
    /// Returns the panel's index.
    ///
    /// # Errors
    ///
    /// [`ProbeError::TooManyPanels`] past [`MAX_PANELS`],
    /// [`ProbeError::NoFeature`] when the node configures no variant, and
    /// the variant's parse error otherwise.
    pub fn probe<D: DeviceNode>(&mut self, node: &D, panel: P) -> Result<usize, ProbeError> {
        if self.registry.panels.is_full() {
            return Err(ProbeError::TooManyPanels { max: MAX_PANELS });
        }
        let variant = Variant::detect(node).ok_or(ProbeError::NoFeature)?;
        let feature = MipiFeature::probe(variant, node, self.config, panel)?;

        let mut name = String::new();
        for c in node.name().chars() {
            if name.push(c).is_err() {
                break;
            }
        }
        info!(
            "{}: {} adaptive-mipi, {} rows",
            name.as_str(),
            variant.as_str(),
            feature.row_count()
        );

        let index = self.registry.panels.len();
        self.registry
            .panels
            .push(PanelEntry { name, feature })
            .map_err(|_| ProbeError::TooManyPanels { max: MAX_PANELS })?;
        Ok(index)
    }

    /// Probe every child of `parent` that configures a variant.
    ///
    /// `make_panel` builds the sink for each probed child from its index.
    /// Children without any variant key are skipped.
    ///
    /// # Errors
    ///
    /// The first probe error; panels probed before it stay in the context.
    pub fn probe_children<D: DeviceNode>(
        &mut self,
        parent: &D,
        mut make_panel: impl FnMut(usize) -> P,
    ) -> Result<usize, ProbeError> {
        let mut probed = 0usize;
        for child in parent.children() {
            if Variant::detect(&child).is_none() {
                continue;
            }
            let index = self.registry.panels.len();
            self.probe(&child, make_panel(index))?;
            probed = probed.saturating_add(1);
        }
        Ok(probed)
    }

    /// Probed panels.
    pub fn registry(&self) -> &PanelRegistry<P> {
        &self.registry
    }

    /// Debug injector.
    pub fn injector(&self) -> &CpInfoInjector {
        &self.injector
    }

    /// Debug injector, for queueing cells.
    pub fn injector_mut(&mut self) -> &mut CpInfoInjector {
        &mut self.injector
    }

    /// Borrow the registry for the bus and the injector for writing at once.
    pub fn split(&mut self) -> (&PanelRegistry<P>, &mut CpInfoInjector) {
        (&self.registry, &mut self.injector)
    }
}

impl<P: PanelFreqHop + Sync> Default for PanelContext<P> {
    fn default() -> Self {
        Self::new(AdaptiveMipiConfig::DEFAULT)
    }
}
