//! CAN frame type carried over the adapter link

use crate::error::{CanUsbError, CanUsbResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mask for a standard (11-bit) CAN identifier
pub const STANDARD_ID_MASK: u32 = 0x0000_07FF;

/// Mask for an extended (29-bit) CAN identifier
pub const EXTENDED_ID_MASK: u32 = 0x1FFF_FFFF;

/// Maximum data length code of a classic CAN frame
pub const MAX_DLC: usize = 8;

/// CAN identifier kind
///
/// The discriminants are the values the adapter expects in the id-kind byte
/// of a configuration record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdKind {
    /// 11-bit identifier
    #[default]
    Standard = 1,
    /// 29-bit identifier
    Extended = 2,
}

impl IdKind {
    /// Wire value of this kind
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Largest identifier representable by this kind
    pub fn max_id(&self) -> u32 {
        match self {
            IdKind::Standard => STANDARD_ID_MASK,
            IdKind::Extended => EXTENDED_ID_MASK,
        }
    }

    /// Number of identifier bytes this kind occupies in a data frame
    pub fn id_len(&self) -> usize {
        match self {
            IdKind::Standard => 2,
            IdKind::Extended => 4,
        }
    }
}

impl TryFrom<u8> for IdKind {
    type Error = CanUsbError;

    fn try_from(value: u8) -> CanUsbResult<Self> {
        match value {
            1 => Ok(IdKind::Standard),
            2 => Ok(IdKind::Extended),
            _ => Err(CanUsbError::InvalidArgument(format!(
                "Unknown identifier kind: 0x{:02X}",
                value
            ))),
        }
    }
}

/// CAN data frame
///
/// Construction does not validate the identifier range or the payload
/// length. The encoder rejects payloads longer than [`MAX_DLC`] and passes
/// identifier bits outside the kind's range through uninterpreted; the
/// decoder only ever produces frames for which [`CanFrame::has_valid_id`]
/// holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanFrame {
    kind: IdKind,
    id: u32,
    data: Vec<u8>,
}

impl CanFrame {
    /// Create a new frame
    pub fn new(kind: IdKind, id: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            id,
            data: data.into(),
        }
    }

    /// Create a frame with a standard identifier
    pub fn standard(id: u32, data: impl Into<Vec<u8>>) -> Self {
        Self::new(IdKind::Standard, id, data)
    }

    /// Create a frame with an extended identifier
    pub fn extended(id: u32, data: impl Into<Vec<u8>>) -> Self {
        Self::new(IdKind::Extended, id, data)
    }

    pub fn kind(&self) -> IdKind {
        self.kind
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Data length code (number of payload bytes)
    pub fn dlc(&self) -> usize {
        self.data.len()
    }

    pub fn is_extended(&self) -> bool {
        self.kind == IdKind::Extended
    }

    /// Check that the identifier fits in the 11 or 29 bits of its kind
    pub fn has_valid_id(&self) -> bool {
        self.id <= self.kind.max_id()
    }
}

impl fmt::Display for CanFrame {
    /// Renders the frame in candump style, e.g. `200#1122` or `00012345#`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IdKind::Standard => write!(f, "{:03X}#", self.id)?,
            IdKind::Extended => write!(f, "{:08X}#", self.id)?,
        }
        for byte in &self.data {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}
