//! Incremental receive state machine
//!
//! Bytes arrive from the UART one at a time with no guarantee about how the
//! transport chunked them. [`FrameReceiver::push`] advances the machine by
//! exactly one byte and yields a message when that byte completes one.
//!
//! Malformed input never produces an error. The partial message is discarded,
//! the drop is counted in [`ReceiveStatistics`], and the machine resumes
//! hunting for the next start byte.

use crate::state::DetectState;
use crate::statistics::ReceiveStatistics;
use crate::wire::{
    self, COMMAND_MARKER, CONTROL_DLC_MASK, CONTROL_EXTENDED, PACKET_END, PACKET_START,
    STATUS_DISCRIMINATOR, STATUS_LEN, STATUS_RX_ERR_INDEX, STATUS_TX_ERR_INDEX,
};
use canusb_core::{CanFrame, ControllerStatus, IdKind, MAX_DLC};

/// Capacity of the receive buffer, sized for the largest message (status report)
pub const RX_BUFFER_CAPACITY: usize = 20;

/// Buffer index of the first identifier byte
const ID_OFFSET: usize = 2;

/// Message completed by a byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Frame(CanFrame),
    Status(ControllerStatus),
}

/// Receive state machine
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    state: DetectState,
    buffer: [u8; RX_BUFFER_CAPACITY],
    cursor: usize,
    kind: IdKind,
    dlc: usize,
    id: [u8; 4],
    rx_errors: u8,
    tx_errors: u8,
    statistics: ReceiveStatistics,
}

impl FrameReceiver {
    /// Create a receiver waiting for a start byte
    pub fn new() -> Self {
        Self {
            state: DetectState::WaitStart,
            buffer: [0u8; RX_BUFFER_CAPACITY],
            cursor: 0,
            kind: IdKind::Standard,
            dlc: 0,
            id: [0u8; 4],
            rx_errors: 0,
            tx_errors: 0,
            statistics: ReceiveStatistics::new(),
        }
    }

    /// Current detection state
    pub fn state(&self) -> DetectState {
        self.state
    }

    /// Number of bytes of the in-progress message held in the buffer
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn statistics(&self) -> &ReceiveStatistics {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut ReceiveStatistics {
        &mut self.statistics
    }

    /// Abandon any partial message and wait for the next start byte
    pub fn reset(&mut self) {
        self.state = DetectState::WaitStart;
        self.cursor = 0;
        self.dlc = 0;
        self.id = [0u8; 4];
        self.rx_errors = 0;
        self.tx_errors = 0;
    }

    /// Advance the state machine by one byte
    ///
    /// Returns the message this byte completed, if any.
    pub fn push(&mut self, byte: u8) -> Option<Received> {
        self.statistics.bytes_received += 1;

        match self.state {
            DetectState::WaitStart => {
                if byte == PACKET_START {
                    self.cursor = 0;
                    self.record(byte);
                    self.state = DetectState::FrameInfo;
                }
                None
            }
            DetectState::FrameInfo => {
                self.on_frame_info(byte);
                None
            }
            DetectState::IdStd | DetectState::IdExt => {
                self.on_id(byte);
                None
            }
            DetectState::Data => {
                if self.record(byte) && self.cursor == self.data_offset() + self.dlc {
                    self.state = DetectState::Eof;
                }
                None
            }
            DetectState::Eof => self.on_eof(byte),
            DetectState::ControllerStatus => self.on_status(byte),
        }
    }

    fn on_frame_info(&mut self, byte: u8) {
        if byte == COMMAND_MARKER {
            self.record(byte);
            self.state = DetectState::ControllerStatus;
        } else if wire::is_control_byte(byte) {
            let dlc = (byte & CONTROL_DLC_MASK) as usize;
            if dlc > MAX_DLC {
                self.statistics.rejected_dlc += 1;
                log::debug!("Dropping frame with DLC {} (control byte 0x{:02X})", dlc, byte);
                self.reset();
                return;
            }

            self.record(byte);
            self.dlc = dlc;
            if byte & CONTROL_EXTENDED != 0 {
                self.kind = IdKind::Extended;
                self.state = DetectState::IdExt;
            } else {
                self.kind = IdKind::Standard;
                self.state = DetectState::IdStd;
            }
        } else {
            // Stay in FrameInfo: the next control byte still belongs to the
            // start byte already seen.
            self.statistics.invalid_control_bytes += 1;
            log::debug!("Ignoring invalid control byte 0x{:02X}", byte);
        }
    }

    fn on_id(&mut self, byte: u8) {
        if !self.record(byte) {
            return;
        }
        self.id[self.cursor - 1 - ID_OFFSET] = byte;

        if self.cursor == self.data_offset() {
            self.state = if self.dlc == 0 {
                DetectState::Eof
            } else {
                DetectState::Data
            };
        }
    }

    fn on_eof(&mut self, byte: u8) -> Option<Received> {
        // The terminator is stored without advancing the cursor.
        self.buffer[self.cursor] = byte;

        let result = if byte == PACKET_END {
            let id = u32::from_le_bytes(self.id);
            let start = self.data_offset();
            let frame = CanFrame::new(self.kind, id, &self.buffer[start..start + self.dlc]);
            if frame.has_valid_id() {
                self.statistics.frames_received += 1;
                log::trace!("Received frame {}", frame);
                Some(Received::Frame(frame))
            } else {
                self.statistics.invalid_identifiers += 1;
                log::debug!("Dropping frame with out-of-range identifier 0x{:X}", id);
                None
            }
        } else {
            self.statistics.bad_terminators += 1;
            log::debug!("Dropping frame with terminator 0x{:02X}", byte);
            None
        };

        self.reset();
        result
    }

    fn on_status(&mut self, byte: u8) -> Option<Received> {
        if !self.record(byte) {
            return None;
        }

        match self.cursor {
            3 => {
                if byte != STATUS_DISCRIMINATOR {
                    self.statistics.bad_status_discriminators += 1;
                    log::debug!("Dropping status report with discriminator 0x{:02X}", byte);
                    self.reset();
                }
                None
            }
            c if c == STATUS_RX_ERR_INDEX + 1 => {
                self.rx_errors = byte;
                None
            }
            c if c == STATUS_TX_ERR_INDEX + 1 => {
                self.tx_errors = byte;
                None
            }
            STATUS_LEN => {
                let expected = wire::checksum(&self.buffer[2..STATUS_LEN - 1]);
                let result = if byte == expected {
                    let status = ControllerStatus::new(self.tx_errors, self.rx_errors);
                    self.statistics.status_reports += 1;
                    log::trace!("Received controller status ({})", status);
                    Some(Received::Status(status))
                } else {
                    self.statistics.checksum_errors += 1;
                    log::debug!(
                        "Dropping status report: checksum 0x{:02X}, expected 0x{:02X}",
                        byte,
                        expected
                    );
                    None
                };
                self.reset();
                result
            }
            _ => None,
        }
    }

    /// Store a byte at the cursor and advance it
    ///
    /// A message that would overrun the buffer is abandoned.
    fn record(&mut self, byte: u8) -> bool {
        if self.cursor >= RX_BUFFER_CAPACITY {
            log::debug!(
                "Receive buffer overrun in state {}, dropping message",
                self.state.as_str()
            );
            self.reset();
            return false;
        }
        self.buffer[self.cursor] = byte;
        self.cursor += 1;
        true
    }

    /// Buffer index of the first data byte
    fn data_offset(&self) -> usize {
        ID_OFFSET + self.kind.id_len()
    }
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}
