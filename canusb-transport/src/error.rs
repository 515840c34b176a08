//! Error re-exports for the transport layer

pub use canusb_core::error::{CanUsbError, CanUsbResult};
