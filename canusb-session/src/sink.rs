//! Sinks through which a session emits decoded messages and outgoing bytes
//!
//! Each sink is supplied by the application and lives as long as the session.
//! Closures implement the traits directly; the `tokio::sync::mpsc` impls let
//! a session hand its output to async tasks.

use crate::error::{CanUsbError, CanUsbResult};
use bytes::Bytes;
use canusb_core::{CanFrame, ControllerStatus};
use tokio::sync::mpsc;

/// Receives every successfully decoded data frame
pub trait FrameSink {
    fn on_frame(&mut self, frame: &CanFrame);
}

/// Receives every checksum-valid controller status report
pub trait StatusSink {
    fn on_status(&mut self, status: ControllerStatus);
}

/// Writes encoded bytes to the transport
///
/// The result is returned unchanged from the session's send operations.
pub trait ByteSink {
    fn send(&mut self, bytes: &[u8]) -> CanUsbResult<()>;
}

impl<F> FrameSink for F
where
    F: FnMut(&CanFrame),
{
    fn on_frame(&mut self, frame: &CanFrame) {
        self(frame)
    }
}

impl<F> StatusSink for F
where
    F: FnMut(ControllerStatus),
{
    fn on_status(&mut self, status: ControllerStatus) {
        self(status)
    }
}

impl<F> ByteSink for F
where
    F: FnMut(&[u8]) -> CanUsbResult<()>,
{
    fn send(&mut self, bytes: &[u8]) -> CanUsbResult<()> {
        self(bytes)
    }
}

impl FrameSink for mpsc::UnboundedSender<CanFrame> {
    fn on_frame(&mut self, frame: &CanFrame) {
        if self.send(frame.clone()).is_err() {
            log::debug!("Frame receiver dropped, discarding {}", frame);
        }
    }
}

impl StatusSink for mpsc::UnboundedSender<ControllerStatus> {
    fn on_status(&mut self, status: ControllerStatus) {
        if self.send(status).is_err() {
            log::debug!("Status receiver dropped, discarding ({})", status);
        }
    }
}

/// Byte sink that queues outgoing bytes on an unbounded channel
///
/// The receiving half is drained by whoever owns the transport.
#[derive(Debug, Clone)]
pub struct ChannelByteSink {
    sender: mpsc::UnboundedSender<Bytes>,
}

impl ChannelByteSink {
    pub fn new(sender: mpsc::UnboundedSender<Bytes>) -> Self {
        Self { sender }
    }

    /// Create a sink together with the receiver that drains it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl ByteSink for ChannelByteSink {
    fn send(&mut self, bytes: &[u8]) -> CanUsbResult<()> {
        self.sender
            .send(Bytes::copy_from_slice(bytes))
            .map_err(|_| CanUsbError::Sink("Outgoing byte queue closed".to_string()))
    }
}
