//! CAN controller status report

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error counters reported by the adapter's CAN controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerStatus {
    /// Transmit error counter (TEC)
    pub tx_errors: u8,
    /// Receive error counter (REC)
    pub rx_errors: u8,
}

impl ControllerStatus {
    pub fn new(tx_errors: u8, rx_errors: u8) -> Self {
        Self {
            tx_errors,
            rx_errors,
        }
    }
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxErr: {}, RxErr: {}", self.tx_errors, self.rx_errors)
    }
}
