//! Session layer for the USB-CAN adapter UART protocol
//!
//! The adapter speaks a small binary protocol over its virtual COM port:
//! CAN data frames in both directions, configuration and filter-list
//! commands from the host, and periodic controller status reports from the
//! adapter. This crate provides:
//!
//! - [`wire`]: byte layouts and the checksum shared by both directions
//! - [`encoder`]: pure encoders for frames and commands
//! - [`receiver`]: the byte-at-a-time receive state machine
//! - [`session`]: the session handle owning the state machine and its sinks

pub mod encoder;
pub mod error;
pub mod receiver;
pub mod session;
pub mod sink;
pub mod state;
pub mod statistics;
pub mod wire;

pub use encoder::{
    encode_cancel_filter_list, encode_configuration, encode_filter_list, encode_frame,
    MAX_FILTER_IDS,
};
pub use error::{CanUsbError, CanUsbResult};
pub use receiver::{FrameReceiver, Received, RX_BUFFER_CAPACITY};
pub use session::{CanUsbSession, SessionBuilder};
pub use sink::{ByteSink, ChannelByteSink, FrameSink, StatusSink};
pub use state::DetectState;
pub use statistics::ReceiveStatistics;
