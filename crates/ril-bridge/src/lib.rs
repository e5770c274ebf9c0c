//! Radio interface layer bridge: baseband cell reports and their broadcast bus.
//!
//! The baseband processor pushes cell telemetry to the application processor
//! as tagged binary messages. This crate owns the wire format ([`msg`]), the
//! decoded report types ([`cell`]) and the synchronous subscribe/publish
//! channel that fans messages out to interested drivers ([`bus`]).
//!
//! This crate is `no_std` unless `std` is enabled; it only uses `core` +
//! `heapless`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod bus;
pub mod cell;
pub mod msg;

pub use bus::{BusError, NotifyAction, RadioBus, RadioListener, SubscriptionId};
pub use cell::{CellReport, ChannelInfo, ConnectionStatus, MultiCellReport, MAX_CELLS};
pub use msg::{BridgeError, BridgeMsg, RadioEvent, DEV_ID_ADAPTIVE_MIPI_INFO, DEV_ID_CHANNEL_INFO};
