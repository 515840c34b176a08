//! Adapter configuration record

use crate::error::{CanUsbError, CanUsbResult};
use crate::frame::IdKind;
use serde::{Deserialize, Serialize};

/// CAN controller operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanMode {
    #[default]
    Normal = 0,
    Loopback = 1,
    Silent = 2,
    LoopbackSilent = 3,
}

impl CanMode {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for CanMode {
    type Error = CanUsbError;

    fn try_from(value: u8) -> CanUsbResult<Self> {
        match value {
            0 => Ok(CanMode::Normal),
            1 => Ok(CanMode::Loopback),
            2 => Ok(CanMode::Silent),
            3 => Ok(CanMode::LoopbackSilent),
            _ => Err(CanUsbError::InvalidArgument(format!(
                "Unknown CAN mode: {}",
                value
            ))),
        }
    }
}

/// CAN bus bit rate selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanBaudrate {
    Rate1000k = 0x01,
    Rate800k = 0x02,
    Rate500k = 0x03,
    Rate400k = 0x04,
    Rate250k = 0x05,
    Rate200k = 0x06,
    Rate125k = 0x07,
    Rate100k = 0x08,
    Rate50k = 0x09,
    Rate20k = 0x0A,
    Rate10k = 0x0B,
    Rate5k = 0x0C,
}

impl CanBaudrate {
    /// Every selector, fastest first
    pub const ALL: [CanBaudrate; 12] = [
        CanBaudrate::Rate1000k,
        CanBaudrate::Rate800k,
        CanBaudrate::Rate500k,
        CanBaudrate::Rate400k,
        CanBaudrate::Rate250k,
        CanBaudrate::Rate200k,
        CanBaudrate::Rate125k,
        CanBaudrate::Rate100k,
        CanBaudrate::Rate50k,
        CanBaudrate::Rate20k,
        CanBaudrate::Rate10k,
        CanBaudrate::Rate5k,
    ];

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Bus bit rate in bit/s
    pub fn bit_rate(&self) -> u32 {
        match self {
            CanBaudrate::Rate1000k => 1_000_000,
            CanBaudrate::Rate800k => 800_000,
            CanBaudrate::Rate500k => 500_000,
            CanBaudrate::Rate400k => 400_000,
            CanBaudrate::Rate250k => 250_000,
            CanBaudrate::Rate200k => 200_000,
            CanBaudrate::Rate125k => 125_000,
            CanBaudrate::Rate100k => 100_000,
            CanBaudrate::Rate50k => 50_000,
            CanBaudrate::Rate20k => 20_000,
            CanBaudrate::Rate10k => 10_000,
            CanBaudrate::Rate5k => 5_000,
        }
    }

    /// Find the selector for a bit rate in bit/s
    pub fn from_bit_rate(bit_rate: u32) -> CanUsbResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|rate| rate.bit_rate() == bit_rate)
            .ok_or_else(|| {
                CanUsbError::InvalidArgument(format!("Unsupported CAN bit rate: {}", bit_rate))
            })
    }
}

impl Default for CanBaudrate {
    fn default() -> Self {
        CanBaudrate::Rate250k
    }
}

impl TryFrom<u8> for CanBaudrate {
    type Error = CanUsbError;

    fn try_from(value: u8) -> CanUsbResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|rate| rate.as_u8() == value)
            .ok_or_else(|| {
                CanUsbError::InvalidArgument(format!("Unknown baud rate selector: 0x{:02X}", value))
            })
    }
}

/// Adapter configuration
///
/// Consumed once by the encoder to produce a configuration command. The
/// default accepts every identifier (zero filter, zero mask) on a 250 kbit/s
/// bus in normal mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanConfig {
    pub mode: CanMode,
    pub id_kind: IdKind,
    pub baudrate: CanBaudrate,
    pub filter_id: u32,
    pub mask_id: u32,
}

impl CanConfig {
    pub fn new(mode: CanMode, id_kind: IdKind, baudrate: CanBaudrate) -> Self {
        Self {
            mode,
            id_kind,
            baudrate,
            filter_id: 0,
            mask_id: 0,
        }
    }

    pub fn with_mode(mut self, mode: CanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_id_kind(mut self, id_kind: IdKind) -> Self {
        self.id_kind = id_kind;
        self
    }

    pub fn with_baudrate(mut self, baudrate: CanBaudrate) -> Self {
        self.baudrate = baudrate;
        self
    }

    /// Set the acceptance filter and mask applied by the adapter
    pub fn with_filter(mut self, filter_id: u32, mask_id: u32) -> Self {
        self.filter_id = filter_id;
        self.mask_id = mask_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CanConfig::default();
        assert_eq!(config.mode, CanMode::Normal);
        assert_eq!(config.id_kind, IdKind::Standard);
        assert_eq!(config.baudrate, CanBaudrate::Rate250k);
        assert_eq!(config.filter_id, 0);
        assert_eq!(config.mask_id, 0);
    }

    #[test]
    fn test_baudrate_selectors() {
        assert_eq!(CanBaudrate::Rate1000k.as_u8(), 0x01);
        assert_eq!(CanBaudrate::Rate5k.as_u8(), 0x0C);
        assert_eq!(CanBaudrate::try_from(0x05).unwrap(), CanBaudrate::Rate250k);
        assert!(CanBaudrate::try_from(0x00).is_err());
        assert!(CanBaudrate::try_from(0x0D).is_err());
    }

    #[test]
    fn test_baudrate_bit_rate() {
        assert_eq!(
            CanBaudrate::from_bit_rate(500_000).unwrap(),
            CanBaudrate::Rate500k
        );
        assert_eq!(CanBaudrate::Rate125k.bit_rate(), 125_000);
        assert!(CanBaudrate::from_bit_rate(33_333).is_err());
    }

    #[test]
    fn test_mode_conversion() {
        assert_eq!(CanMode::try_from(3).unwrap(), CanMode::LoopbackSilent);
        assert!(matches!(
            CanMode::try_from(4),
            Err(CanUsbError::InvalidArgument(_))
        ));
        let config = CanConfig::default()
            .with_mode(CanMode::Silent)
            .with_filter(0x100, 0x7FF);
        assert_eq!(config.mode.as_u8(), 2);
        assert_eq!(config.filter_id, 0x100);
        assert_eq!(config.mask_id, 0x7FF);
    }
}
