//! Hardware Abstraction Layer (HAL) for the USDM panel driver
//!
//! This crate provides trait-based abstractions for the two hardware-facing
//! seams of the adaptive-MIPI feature, enabling development and testing
//! without a physical panel or device tree.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (usdm crate: panel context, debug injector)
//!         ↓
//! Feature Layers (adaptive-mipi, ril-bridge)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Panel command sequencer / device tree
//! ```
//!
//! # Abstractions
//!
//! - [`PanelFreqHop`] - clock-switch sink owned by the live panel
//! - [`DeviceNode`] - device-tree style configuration node
//!
//! # Features
//!
//! - `std`: Enable standard library support, [`devtree_local`] and [`mocks`]
//! - `serde`: JSON loading for the in-memory device tree
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```
//! use platform::{FreqHopParam, PanelFreqHop};
//!
//! fn hop<P: PanelFreqHop>(panel: &P) {
//!     panel.set_freq_hop(FreqHopParam::new(1_108_000, 0)).ok();
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod devtree;
#[cfg(feature = "std")]
pub mod devtree_local;
pub mod mocks;
pub mod panel;

// Re-export main traits
pub use devtree::{ConfigError, DeviceNode};
pub use panel::{FreqHopParam, PanelError, PanelFreqHop};
