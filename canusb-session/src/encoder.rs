//! Encoders for outgoing frames and adapter commands
//!
//! All functions are pure: they validate their input and return the bytes to
//! put on the wire. Nothing is emitted for input that fails validation.

use crate::error::{CanUsbError, CanUsbResult};
use crate::wire::{
    self, CANCEL_FILTER_LIST, CMD_CONFIGURE, CMD_FILTER_LIST, COMMAND_MARKER, CONFIG_LEN,
    CONFIG_TRAILER, PACKET_END, PACKET_START,
};
use bytes::{BufMut, Bytes, BytesMut};
use canusb_core::{CanConfig, CanFrame, IdKind, MAX_DLC};

/// Maximum number of ids in one filter-list command (the count is one byte)
pub const MAX_FILTER_IDS: usize = u8::MAX as usize;

/// Encode a CAN data frame
///
/// Produces `5 + DLC` bytes for a standard identifier and `7 + DLC` bytes for
/// an extended one. The identifier is written little-endian and truncated to
/// the 2 or 4 bytes of the id field without further interpretation.
///
/// # Errors
/// `InvalidArgument` if the frame carries more than 8 data bytes.
pub fn encode_frame(frame: &CanFrame) -> CanUsbResult<Bytes> {
    let dlc = frame.dlc();
    if dlc > MAX_DLC {
        return Err(CanUsbError::InvalidArgument(format!(
            "DLC {} exceeds maximum of {}",
            dlc, MAX_DLC
        )));
    }

    let id_len = frame.kind().id_len();
    let mut buf = BytesMut::with_capacity(wire::frame_overhead(id_len) + dlc);
    buf.put_u8(PACKET_START);
    buf.put_u8(wire::control_byte(frame.is_extended(), dlc as u8));
    match frame.kind() {
        IdKind::Standard => buf.put_u16_le(frame.id() as u16),
        IdKind::Extended => buf.put_u32_le(frame.id()),
    }
    buf.put_slice(frame.data());
    buf.put_u8(PACKET_END);

    Ok(buf.freeze())
}

/// Encode the 20-byte adapter configuration record
///
/// Selectors are written as-is; the checksum covers bytes 2 through 18.
pub fn encode_configuration(config: &CanConfig) -> Bytes {
    let mut buf = BytesMut::with_capacity(CONFIG_LEN);
    buf.put_u8(PACKET_START);
    buf.put_u8(COMMAND_MARKER);
    buf.put_u8(CMD_CONFIGURE);
    buf.put_u8(config.baudrate.as_u8());
    buf.put_u8(config.id_kind.as_u8());
    buf.put_u32_le(config.filter_id);
    buf.put_u32_le(config.mask_id);
    buf.put_u8(config.mode.as_u8());
    buf.put_u8(CONFIG_TRAILER);
    buf.put_bytes(0, 4);

    let sum = wire::checksum(&buf[2..]);
    buf.put_u8(sum);

    debug_assert_eq!(buf.len(), CONFIG_LEN);
    buf.freeze()
}

/// Encode a filter-list enable command
///
/// After this command the adapter forwards only frames whose identifier is
/// in `ids`.
///
/// # Errors
/// `InvalidArgument` if `ids` is empty or holds more than 255 entries.
pub fn encode_filter_list(ids: &[u32]) -> CanUsbResult<Bytes> {
    if ids.is_empty() {
        return Err(CanUsbError::InvalidArgument(
            "Filter id list is empty".to_string(),
        ));
    }
    if ids.len() > MAX_FILTER_IDS {
        return Err(CanUsbError::InvalidArgument(format!(
            "Filter id list has {} entries, maximum is {}",
            ids.len(),
            MAX_FILTER_IDS
        )));
    }

    let mut buf = BytesMut::with_capacity(5 + 4 * ids.len());
    buf.put_u8(PACKET_START);
    buf.put_u8(COMMAND_MARKER);
    buf.put_u8(CMD_FILTER_LIST);
    buf.put_u8(ids.len() as u8);
    for &id in ids {
        buf.put_u32_le(id);
    }

    let sum = wire::checksum(&buf[2..]);
    buf.put_u8(sum);

    Ok(buf.freeze())
}

/// Encode the fixed filter-list cancel command (receive all identifiers)
pub fn encode_cancel_filter_list() -> Bytes {
    Bytes::from_static(&CANCEL_FILTER_LIST)
}
