//! Subsystem identity and constants
//!
//! Names and versions reported by the panel driver in logs and table dumps.
//! Reference these constants rather than hardcoding values.

/// Subsystem name
pub const SUBSYSTEM_NAME: &str = "usdm";

/// Subsystem version (synchronized with Cargo.toml)
pub const SUBSYSTEM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of panels a single driver context manages
pub const MAX_PANELS: usize = 4;

/// Banner printed when the desktop simulation starts
pub const fn sim_banner() -> &'static str {
    "usdm adaptive-mipi - simulation mode"
}
