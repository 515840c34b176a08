//! Transport layer for the USB-CAN adapter
//!
//! The adapter enumerates as a USB serial device. This crate provides the
//! async stream abstraction the adapter driver reads from and writes to, and
//! its serial-port implementation.

pub mod error;
pub mod serial;
pub mod stream;

pub use error::{CanUsbError, CanUsbResult};
pub use serial::{SerialSettings, SerialTransport, DEFAULT_UART_BAUD_RATE};
pub use stream::{StreamAccessor, TransportLayer};
