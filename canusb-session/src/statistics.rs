//! Receive-side statistics collection

/// Receive statistics
///
/// Malformed input is dropped silently by the state machine; these counters
/// are the only place the drops become visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveStatistics {
    /// Total number of bytes fed into the state machine
    pub bytes_received: u64,
    /// Number of data frames delivered
    pub frames_received: u64,
    /// Number of checksum-valid controller status reports delivered
    pub status_reports: u64,
    /// Bytes after a start byte that were neither a control byte nor the status marker
    pub invalid_control_bytes: u64,
    /// Control bytes announcing a DLC above 8
    pub rejected_dlc: u64,
    /// Data frames whose terminator was not 0x55
    pub bad_terminators: u64,
    /// Status reports with a wrong discriminator byte
    pub bad_status_discriminators: u64,
    /// Status reports with a checksum mismatch
    pub checksum_errors: u64,
    /// Data frames whose identifier exceeded the range of its kind
    pub invalid_identifiers: u64,
}

impl ReceiveStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of messages abandoned after they had started
    pub fn dropped_messages(&self) -> u64 {
        self.rejected_dlc
            + self.bad_terminators
            + self.bad_status_discriminators
            + self.checksum_errors
            + self.invalid_identifiers
    }
}
