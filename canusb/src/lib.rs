//! canusb - Rust driver for UART USB-CAN adapters
//!
//! Cheap USB-CAN analyzers expose a virtual COM port and speak a compact
//! binary protocol over it. This library encodes frames and adapter
//! commands, decodes the adapter's byte stream one byte at a time, and binds
//! both to a serial port.
//!
//! # Architecture
//!
//! - `canusb-core`: error type, frames, configuration and status values
//! - `canusb-session`: wire layout, encoder, receive state machine, session handle
//! - `canusb-transport`: async stream abstraction and serial transport
//! - `canusb` (this crate): [`CanUsbAdapter`], a session bound to a transport
//!
//! # Usage
//!
//! ```no_run
//! use canusb::{CanConfig, CanFrame, CanUsbAdapter, CanUsbSession};
//!
//! # async fn run() -> canusb::CanUsbResult<()> {
//! let session = CanUsbSession::builder()
//!     .frame_sink(|frame: &CanFrame| println!("Rx {}", frame));
//! let mut adapter = CanUsbAdapter::serial("/dev/ttyUSB0", session);
//! adapter.open_with(&CanConfig::default()).await?;
//! adapter.send_frame(&CanFrame::standard(0x200, vec![0x11, 0x22])).await?;
//! adapter.receive_until_eof().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;

pub use adapter::{CanUsbAdapter, DEFAULT_READ_CHUNK};

pub use canusb_core::{
    CanBaudrate, CanConfig, CanFrame, CanMode, CanUsbError, CanUsbResult, ControllerStatus,
    IdKind,
};

pub use canusb_session::{
    ByteSink, CanUsbSession, DetectState, FrameSink, ReceiveStatistics, SessionBuilder,
    StatusSink,
};

pub use canusb_transport::{SerialSettings, SerialTransport, StreamAccessor, TransportLayer};

// Re-export the layers
pub mod codec {
    pub use canusb_session::*;
}

pub mod transport {
    pub use canusb_transport::*;
}
