//! Radio bridge message framing.
//!
//! Every broadcast carries a `dev_id` discriminator and an opaque payload.
//! Two payloads are understood, both little-endian:
//!
//! - [`DEV_ID_CHANNEL_INFO`]: packed `{ rat: u8, band: u32, channel: u32 }`,
//!   exactly [`CHANNEL_INFO_LEN`] bytes.
//! - [`DEV_ID_ADAPTIVE_MIPI_INFO`]: `{ cell_count: u32, cells: [Cell; 16] }`
//!   where each cell is [`CellReport::WORDS`] 32-bit words, exactly
//!   [`CP_INFO_LEN`] bytes. Slots past `cell_count` are ignored.


// ─────────────────────────────────────────────────────────────────────────────
// Public types
// ─────────────────────────────────────────────────────────────────────────────

use crate::cell::{CellReport, ChannelInfo, MultiCellReport, MAX_CELLS};

/// Discriminator of the single-cell channel notification.
pub const DEV_ID_CHANNEL_INFO: u32 = 0x01;

/// Discriminator of the multi-cell adaptive-MIPI report.
pub const DEV_ID_ADAPTIVE_MIPI_INFO: u32 = 0x05;

/// Payload length of a channel notification.
pub const CHANNEL_INFO_LEN: usize = 9;

/// Payload length of a multi-cell report: count word plus 16 cell slots.
pub const CP_INFO_LEN: usize = 4 + MAX_CELLS * CellReport::WORDS * 4;

/// One broadcast message as delivered by the radio bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeMsg<'a> {
    /// Payload discriminator.
    pub dev_id: u32,
    /// Raw payload.
    pub data: &'a [u8],
}

/// Decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    /// Single-cell band/channel notification.
    ChannelInfo(ChannelInfo),
    /// Multi-cell snapshot.
    CpInfo(MultiCellReport),
}

/// Reasons a message is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// The discriminator is not one this decoder handles.
    #[error("unexpected dev_id {found:#x}, expected {expected:#x}")]
    WrongDevice {
        /// Discriminator the decoder expects.
        expected: u32,
        /// Discriminator received.
        found: u32,
    },
    /// The discriminator is not known at all.
    #[error("unknown dev_id {0:#x}")]
    UnknownDevice(u32),
    /// The payload length does not match the discriminator's layout.
    #[error("payload is {found} bytes, expected {expected}")]
    BadLength {
        /// Layout length.
        expected: usize,
        /// Received length.
        found: usize,
    },
    /// `cell_count` exceeds [`MAX_CELLS`].
    #[error("cell count {0} exceeds capacity")]
    TooManyCells(u32),
}

impl<'a> BridgeMsg<'a> {
    /// Wrap a payload.
    #[must_use]
    pub const fn new(dev_id: u32, data: &'a [u8]) -> Self {
        Self { dev_id, data }
    }

    /// Payload length in bytes.
    #[must_use]
    pub const fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Decode according to the discriminator.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownDevice`] for an unrecognised discriminator,
    /// otherwise whatever the matching decoder reports.
    pub fn decode(&self) -> Result<RadioEvent, BridgeError> {
        match self.dev_id {
            DEV_ID_CHANNEL_INFO => self.channel_info().map(RadioEvent::ChannelInfo),
            DEV_ID_ADAPTIVE_MIPI_INFO => self.cp_info().map(RadioEvent::CpInfo),
            other => Err(BridgeError::UnknownDevice(other)),
        }
    }

    /// Decode a channel notification.
    pub fn channel_info(&self) -> Result<ChannelInfo, BridgeError> {
        self.expect(DEV_ID_CHANNEL_INFO, CHANNEL_INFO_LEN)?;
        let rat = self.data.first().copied().ok_or(BridgeError::BadLength {
            expected: CHANNEL_INFO_LEN,
            found: 0,
        })?;
        Ok(ChannelInfo {
            rat,
            band: self.word_at(1)?,
            channel: self.word_at(5)?,
        })
    }

    /// Decode a multi-cell report.
    pub fn cp_info(&self) -> Result<MultiCellReport, BridgeError> {
        self.expect(DEV_ID_ADAPTIVE_MIPI_INFO, CP_INFO_LEN)?;
        let mut words = self
            .data
            .chunks_exact(4)
            .filter_map(|c| c.try_into().ok().map(u32::from_le_bytes));

        let count = words.next().unwrap_or(0);
        if count > MAX_CELLS as u32 {
            return Err(BridgeError::TooManyCells(count));
        }

        let mut report = MultiCellReport::new();
        for _ in 0..count {
            let mut cell = [0u32; CellReport::WORDS];
            for slot in &mut cell {
                *slot = words.next().ok_or(BridgeError::BadLength {
                    expected: CP_INFO_LEN,
                    found: self.data.len(),
                })?;
            }
            // count <= MAX_CELLS, so the report cannot be full here.
            report
                .push(CellReport::from_words(cell))
                .map_err(|_| BridgeError::TooManyCells(count))?;
        }
        Ok(report)
    }

    fn expect(&self, dev_id: u32, len: usize) -> Result<(), BridgeError> {
        if self.dev_id != dev_id {
            return Err(BridgeError::WrongDevice {
                expected: dev_id,
                found: self.dev_id,
            });
        }
        if self.data.len() != len {
            return Err(BridgeError::BadLength {
                expected: len,
                found: self.data.len(),
            });
        }
        Ok(())
    }

    fn word_at(&self, offset: usize) -> Result<u32, BridgeError> {
        offset
            .checked_add(4)
            .and_then(|end| self.data.get(offset..end))
            .and_then(|b| b.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or(BridgeError::BadLength {
                expected: offset.saturating_add(4),
                found: self.data.len(),
            })
    }
}

/// Encode a channel notification payload.
#[must_use]
pub fn encode_channel_info(info: ChannelInfo) -> [u8; CHANNEL_INFO_LEN] {
    let mut out = [0u8; CHANNEL_INFO_LEN];
    let bytes = core::iter::once(info.rat)
        .chain(info.band.to_le_bytes())
        .chain(info.channel.to_le_bytes());
    for (slot, b) in out.iter_mut().zip(bytes) {
        *slot = b;
    }
    out
}

/// Encode a multi-cell report payload; unused cell slots are zero.
#[must_use]
pub fn encode_cp_info(report: &MultiCellReport) -> [u8; CP_INFO_LEN] {
    let mut out = [0u8; CP_INFO_LEN];
    let count = u32::try_from(report.len()).unwrap_or(0);
    let words = core::iter::once(count).chain(report.iter().flat_map(CellReport::to_words));
    for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    out
}
