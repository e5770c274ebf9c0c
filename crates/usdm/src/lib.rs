//! USDM panel driver: application layer of the adaptive-MIPI feature
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     usdm (this crate)                    │
//! │   PanelContext ─ PanelRegistry ─ CpInfoInjector          │
//! └──────────────┬──────────────────────────┬────────────────┘
//!                │ probe / register         │ fire
//!                ▼                          ▼
//! ┌───────────────────────────┐   ┌──────────────────────────┐
//! │ adaptive-mipi             │◄──│ ril-bridge               │
//! │ Scored / Simple / SDP     │   │ RadioBus, frame codecs   │
//! └──────────────┬────────────┘   └──────────────────────────┘
//!                │ set_freq_hop
//!                ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ platform: PanelFreqHop, DeviceNode                       │
//! │   SimulatedPanel (here) / MockPanel (tests)              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Features
//!
//! - `std` (default): host builds, std critical-section implementation
//! - `emulator`: JSON device trees and the `radio_sim` desktop example
//! - `defmt`: route logs to defmt
//!
//! # Example
//!
//! ```
//! use platform::devtree_local::{DeviceTree, DtNode};
//! use ril_bridge::{ChannelInfo, RadioBus};
//! use usdm::{debug::fire_channel_info, PanelContext, SimulatedPanel};
//!
//! let tree = DeviceTree::new(
//!     DtNode::new("root")
//!         .child(DtNode::new("panel0").prop("freq-hop-table", &[1]))
//!         .child(
//!             DtNode::new("hop").phandle(1).child(
//!                 DtNode::new("lb07")
//!                     .prop("rf-band-id", &[7])
//!                     .prop("rf-channel-range", &[3040, 3179])
//!                     .prop("dsi-freq", &[1124])
//!                     .prop("osc-freq", &[96500]),
//!             ),
//!         ),
//! );
//!
//! let mut ctx = PanelContext::default();
//! ctx.probe(&tree.node("panel0").unwrap(), SimulatedPanel::new("panel0")).unwrap();
//!
//! let mut bus: RadioBus<'_, 8> = RadioBus::new();
//! ctx.registry().register(&mut bus).unwrap();
//! fire_channel_info(&bus, ChannelInfo { rat: 3, band: 7, channel: 3100 });
//!
//! let panel = ctx.registry().get(0).unwrap().feature().panel();
//! assert_eq!(panel.last_applied().unwrap().dsi_freq, 1124);
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Must come first so the log macros are visible to every module below.
#[macro_use]
mod fmt;

pub mod context;
pub mod debug;
pub mod error;
pub mod panel;

pub use context::{MipiFeature, PanelContext, PanelEntry, PanelRegistry, Registration, Variant};
pub use debug::{parse_cell_line, CpInfoInjector};
pub use error::{InjectError, ProbeError};
pub use panel::SimulatedPanel;

/// Maximum listeners on the application's radio bus.
pub const BUS_CAPACITY: usize = 8;
