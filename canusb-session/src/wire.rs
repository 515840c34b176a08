//! Byte layouts shared by the encoder and the receive state machine
//!
//! ```text
//! Data frame      AA | ctrl | id (2 or 4, LE) | data (DLC) | 55
//! Configuration   AA 55 12 | baud | kind | filter (4, LE) | mask (4, LE) | mode | 01 | 00 00 00 00 | sum
//! Filter enable   AA 55 10 | count | count x id (4, LE) | sum
//! Filter cancel   AA 55 10 00 10
//! Status report   AA 55 04 | rsv | rxErr | txErr | rsv x 13 | sum
//! ```
//!
//! Checksums are the wrapping 8-bit sum of every byte after the two start
//! bytes, up to the byte preceding the checksum.

/// First byte of every message
pub const PACKET_START: u8 = 0xAA;

/// Data frame terminator, also the second byte of command/status messages
pub const PACKET_END: u8 = 0x55;

/// Second byte of configuration, filter and status messages
pub const COMMAND_MARKER: u8 = 0x55;

/// Fixed bits 7 and 6 of a data-frame control byte
pub const CONTROL_FLAGS: u8 = 0xC0;

/// Extended-identifier flag (bit 5) of a data-frame control byte
pub const CONTROL_EXTENDED: u8 = 0x20;

/// DLC field of a data-frame control byte
pub const CONTROL_DLC_MASK: u8 = 0x0F;

/// Command byte of a configuration record
pub const CMD_CONFIGURE: u8 = 0x12;

/// Command byte of a filter-list enable or cancel
pub const CMD_FILTER_LIST: u8 = 0x10;

/// Discriminator byte (index 2) of a controller status report
pub const STATUS_DISCRIMINATOR: u8 = 0x04;

/// Constant byte following the mode in a configuration record
pub const CONFIG_TRAILER: u8 = 0x01;

/// Total length of a configuration record
pub const CONFIG_LEN: usize = 20;

/// Total length of a controller status report
pub const STATUS_LEN: usize = 20;

/// Buffer index of the rx error counter in a status report
pub const STATUS_RX_ERR_INDEX: usize = 4;

/// Buffer index of the tx error counter in a status report
pub const STATUS_TX_ERR_INDEX: usize = 5;

/// Filter-list cancel sequence; its last byte is a literal, not a checksum
pub const CANCEL_FILTER_LIST: [u8; 5] = [PACKET_START, COMMAND_MARKER, CMD_FILTER_LIST, 0x00, 0x10];

/// Length of a data frame without payload: start, control, terminator plus id bytes
pub fn frame_overhead(id_len: usize) -> usize {
    3 + id_len
}

/// Build a data-frame control byte
pub fn control_byte(extended: bool, dlc: u8) -> u8 {
    let kind = if extended { CONTROL_EXTENDED } else { 0 };
    CONTROL_FLAGS | kind | (dlc & CONTROL_DLC_MASK)
}

/// Check whether a byte carries the data-frame control flags
pub fn is_control_byte(byte: u8) -> bool {
    byte & CONTROL_FLAGS == CONTROL_FLAGS
}

/// Wrapping 8-bit sum over a byte range
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}
