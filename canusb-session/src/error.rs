//! Error re-exports for the session layer

pub use canusb_core::error::{CanUsbError, CanUsbResult};
