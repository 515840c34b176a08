//! Session handle binding the codec to its sinks
//!
//! A session owns the receive state machine and the three sinks for its whole
//! lifetime. It is the single entry point for one adapter connection: bytes
//! read from the UART go in through [`CanUsbSession::feed_byte`], and the
//! send operations encode a command and forward it to the byte sink.
//!
//! # Usage Example
//! ```rust
//! use canusb_core::{CanFrame, CanUsbResult, ControllerStatus};
//! use canusb_session::CanUsbSession;
//!
//! let mut session = CanUsbSession::builder()
//!     .frame_sink(|frame: &CanFrame| println!("Rx {}", frame))
//!     .status_sink(|status: ControllerStatus| println!("{}", status))
//!     .byte_sink(|bytes: &[u8]| -> CanUsbResult<()> {
//!         println!("Tx {:02X?}", bytes);
//!         Ok(())
//!     })
//!     .build();
//!
//! session.send_frame(&CanFrame::standard(0x200, vec![0x11, 0x22]))?;
//! session.feed(&[0xAA, 0xC1, 0x00, 0x01, 0x42, 0x55]);
//! # Ok::<(), canusb_core::CanUsbError>(())
//! ```
//!
//! # Concurrency
//! A session is not synchronized. Callers that share one between threads
//! must serialize access themselves, e.g. behind a mutex. Sinks are invoked
//! synchronously from `feed_byte` and cannot reach the session that invokes
//! them.

use crate::encoder;
use crate::error::CanUsbResult;
use crate::receiver::{FrameReceiver, Received};
use crate::sink::{ByteSink, FrameSink, StatusSink};
use crate::state::DetectState;
use crate::statistics::ReceiveStatistics;
use canusb_core::{CanConfig, CanFrame};
use std::fmt;

/// Session with a USB-CAN adapter
pub struct CanUsbSession {
    receiver: FrameReceiver,
    frame_sink: Option<Box<dyn FrameSink + Send>>,
    status_sink: Option<Box<dyn StatusSink + Send>>,
    byte_sink: Option<Box<dyn ByteSink + Send>>,
    commands_sent: u64,
    send_failures: u64,
}

impl CanUsbSession {
    /// Create a session with all three sinks attached
    pub fn new<F, S, B>(frame_sink: F, status_sink: S, byte_sink: B) -> Self
    where
        F: FrameSink + Send + 'static,
        S: StatusSink + Send + 'static,
        B: ByteSink + Send + 'static,
    {
        Self::builder()
            .frame_sink(frame_sink)
            .status_sink(status_sink)
            .byte_sink(byte_sink)
            .build()
    }

    /// Start building a session; sinks left unset are treated as absent
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Encode a CAN frame and forward it to the byte sink
    ///
    /// # Errors
    /// `InvalidArgument` for a DLC above 8; otherwise whatever the byte sink
    /// returns.
    pub fn send_frame(&mut self, frame: &CanFrame) -> CanUsbResult<()> {
        let bytes = encoder::encode_frame(frame)?;
        self.emit(&bytes)
    }

    /// Encode an adapter configuration record and forward it to the byte sink
    pub fn configure(&mut self, config: &CanConfig) -> CanUsbResult<()> {
        let bytes = encoder::encode_configuration(config);
        self.emit(&bytes)
    }

    /// Restrict reception to the given identifiers
    ///
    /// # Errors
    /// `InvalidArgument` for an empty or oversized list; otherwise whatever
    /// the byte sink returns.
    pub fn enable_receive_selected(&mut self, ids: &[u32]) -> CanUsbResult<()> {
        let bytes = encoder::encode_filter_list(ids)?;
        self.emit(&bytes)
    }

    /// Lift the identifier filter list so every frame is received
    pub fn cancel_receive_selected(&mut self) -> CanUsbResult<()> {
        let bytes = encoder::encode_cancel_filter_list();
        self.emit(&bytes)
    }

    /// Advance the receive state machine by one byte
    ///
    /// Invokes the frame or status sink when the byte completes a message.
    pub fn feed_byte(&mut self, byte: u8) {
        match self.receiver.push(byte) {
            Some(Received::Frame(frame)) => {
                if let Some(sink) = self.frame_sink.as_mut() {
                    sink.on_frame(&frame);
                }
            }
            Some(Received::Status(status)) => {
                if let Some(sink) = self.status_sink.as_mut() {
                    sink.on_status(status);
                }
            }
            None => {}
        }
    }

    /// Feed a chunk of received bytes, one at a time
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.feed_byte(byte);
        }
    }

    /// Abandon any partially received message
    pub fn reset_receiver(&mut self) {
        self.receiver.reset();
    }

    pub fn receive_state(&self) -> DetectState {
        self.receiver.state()
    }

    pub fn statistics(&self) -> &ReceiveStatistics {
        self.receiver.statistics()
    }

    pub fn clear_statistics(&mut self) {
        self.receiver.statistics_mut().clear();
        self.commands_sent = 0;
        self.send_failures = 0;
    }

    /// Number of encoded messages the byte sink accepted
    pub fn commands_sent(&self) -> u64 {
        self.commands_sent
    }

    /// Number of encoded messages the byte sink refused
    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }

    /// Move commands the byte sink accepted but the link then failed to
    /// deliver from `commands_sent` to `send_failures`
    pub fn record_lost_commands(&mut self, count: u64) {
        let count = count.min(self.commands_sent);
        self.commands_sent -= count;
        self.send_failures += count;
    }

    /// Release the session (deinit)
    pub fn close(self) {
        log::debug!(
            "Closing CAN-USB session after {} commands, {} frames received",
            self.commands_sent,
            self.receiver.statistics().frames_received
        );
    }

    fn emit(&mut self, bytes: &[u8]) -> CanUsbResult<()> {
        let Some(sink) = self.byte_sink.as_mut() else {
            return Ok(());
        };

        match sink.send(bytes) {
            Ok(()) => {
                self.commands_sent += 1;
                Ok(())
            }
            Err(e) => {
                self.send_failures += 1;
                log::warn!("Failed to send {} bytes: {}", bytes.len(), e);
                Err(e)
            }
        }
    }
}

impl fmt::Debug for CanUsbSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanUsbSession")
            .field("receiver", &self.receiver)
            .field("frame_sink", &self.frame_sink.is_some())
            .field("status_sink", &self.status_sink.is_some())
            .field("byte_sink", &self.byte_sink.is_some())
            .field("commands_sent", &self.commands_sent)
            .field("send_failures", &self.send_failures)
            .finish()
    }
}

/// Builder for [`CanUsbSession`]
#[derive(Default)]
pub struct SessionBuilder {
    frame_sink: Option<Box<dyn FrameSink + Send>>,
    status_sink: Option<Box<dyn StatusSink + Send>>,
    byte_sink: Option<Box<dyn ByteSink + Send>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sink for decoded data frames
    pub fn frame_sink(mut self, sink: impl FrameSink + Send + 'static) -> Self {
        self.frame_sink = Some(Box::new(sink));
        self
    }

    /// Set the sink for controller status reports
    pub fn status_sink(mut self, sink: impl StatusSink + Send + 'static) -> Self {
        self.status_sink = Some(Box::new(sink));
        self
    }

    /// Set the sink for outgoing bytes; without one, sends succeed as no-ops
    pub fn byte_sink(mut self, sink: impl ByteSink + Send + 'static) -> Self {
        self.byte_sink = Some(Box::new(sink));
        self
    }

    /// Create the session (init)
    pub fn build(self) -> CanUsbSession {
        CanUsbSession {
            receiver: FrameReceiver::new(),
            frame_sink: self.frame_sink,
            status_sink: self.status_sink,
            byte_sink: self.byte_sink,
            commands_sent: 0,
            send_failures: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CanUsbError;
    use crate::sink::ChannelByteSink;
    use canusb_core::ControllerStatus;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        frames: Vec<CanFrame>,
        statuses: Vec<ControllerStatus>,
        sent: Vec<Vec<u8>>,
    }

    fn recording_session() -> (CanUsbSession, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let frames = Arc::clone(&recorded);
        let statuses = Arc::clone(&recorded);
        let sent = Arc::clone(&recorded);
        let session = CanUsbSession::new(
            move |frame: &CanFrame| frames.lock().unwrap().frames.push(frame.clone()),
            move |status: ControllerStatus| statuses.lock().unwrap().statuses.push(status),
            move |bytes: &[u8]| -> CanUsbResult<()> {
                sent.lock().unwrap().sent.push(bytes.to_vec());
                Ok(())
            },
        );
        (session, recorded)
    }

    #[test]
    fn test_send_frame_end_to_end() {
        let (mut session, recorded) = recording_session();
        let frame = CanFrame::standard(
            0x200,
            vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88],
        );
        session.send_frame(&frame).unwrap();

        let sent = recorded.lock().unwrap().sent[0].clone();
        assert_eq!(
            sent,
            vec![0xAA, 0xC8, 0x00, 0x02, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x55]
        );

        session.feed(&sent);
        assert_eq!(recorded.lock().unwrap().frames, vec![frame]);
        assert_eq!(session.commands_sent(), 1);
    }

    #[test]
    fn test_status_sink_invoked_once() {
        let (mut session, recorded) = recording_session();
        let mut report = vec![0xAA, 0x55, 0x04, 0x00, 0x03, 0x02];
        report.extend_from_slice(&[0u8; 13]);
        report.push(0x04 + 0x03 + 0x02);
        session.feed(&report);

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.statuses, vec![ControllerStatus::new(2, 3)]);
        assert!(recorded.frames.is_empty());
    }

    #[test]
    fn test_invalid_arguments_emit_nothing() {
        let (mut session, recorded) = recording_session();
        assert!(matches!(
            session.send_frame(&CanFrame::extended(0x1, vec![0u8; 9])),
            Err(CanUsbError::InvalidArgument(_))
        ));
        assert!(matches!(
            session.enable_receive_selected(&[]),
            Err(CanUsbError::InvalidArgument(_))
        ));
        assert!(recorded.lock().unwrap().sent.is_empty());
        assert_eq!(session.commands_sent(), 0);
        assert_eq!(session.send_failures(), 0);
    }

    #[test]
    fn test_commands_forwarded() {
        let (mut session, recorded) = recording_session();
        session.configure(&CanConfig::default()).unwrap();
        session.enable_receive_selected(&[0x100]).unwrap();
        session.cancel_receive_selected().unwrap();

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.sent.len(), 3);
        assert_eq!(recorded.sent[0].len(), 20);
        assert_eq!(recorded.sent[1].len(), 9);
        assert_eq!(recorded.sent[2], vec![0xAA, 0x55, 0x10, 0x00, 0x10]);
    }

    #[test]
    fn test_without_byte_sink_sends_are_noops() {
        let mut session = CanUsbSession::builder().build();
        session.send_frame(&CanFrame::standard(0x1, vec![1])).unwrap();
        session.configure(&CanConfig::default()).unwrap();
        session.enable_receive_selected(&[0x1, 0x2]).unwrap();
        session.cancel_receive_selected().unwrap();
        assert_eq!(session.commands_sent(), 0);

        // Decoding still works without frame or status sinks
        session.feed(&[0xAA, 0xC0, 0x01, 0x00, 0x55]);
        assert_eq!(session.statistics().frames_received, 1);
    }

    #[test]
    fn test_byte_sink_error_propagates() {
        let mut session = CanUsbSession::builder()
            .byte_sink(|_: &[u8]| -> CanUsbResult<()> { Err(CanUsbError::not_connected("port")) })
            .build();
        let result = session.cancel_receive_selected();
        assert!(matches!(result, Err(CanUsbError::Connection(_))));
        assert_eq!(session.send_failures(), 1);
    }

    #[test]
    fn test_record_lost_commands() {
        let (byte_sink, _outgoing) = ChannelByteSink::channel();
        let mut session = CanUsbSession::builder().byte_sink(byte_sink).build();
        session.configure(&CanConfig::default()).unwrap();
        session.cancel_receive_selected().unwrap();
        assert_eq!(session.commands_sent(), 2);

        session.record_lost_commands(1);
        assert_eq!(session.commands_sent(), 1);
        assert_eq!(session.send_failures(), 1);

        session.record_lost_commands(5);
        assert_eq!(session.commands_sent(), 0);
        assert_eq!(session.send_failures(), 2);
    }

    #[test]
    fn test_channel_sinks() {
        let (byte_sink, mut outgoing) = ChannelByteSink::channel();
        let (frame_tx, mut frames) = tokio::sync::mpsc::unbounded_channel::<CanFrame>();
        let (status_tx, _statuses) = tokio::sync::mpsc::unbounded_channel::<ControllerStatus>();
        let mut session = CanUsbSession::new(frame_tx, status_tx, byte_sink);

        let frame = CanFrame::extended(0x18FF_50E5, vec![0x01, 0x02, 0x03]);
        session.send_frame(&frame).unwrap();
        let bytes = outgoing.try_recv().unwrap();
        session.feed(&bytes);
        assert_eq!(frames.try_recv().unwrap(), frame);
    }

    #[test]
    fn test_chunking_invariance() {
        let frames: Vec<CanFrame> = vec![
            CanFrame::standard(0x123, vec![0xAA, 0x55]),
            CanFrame::extended(0x0ABC_DEF0, Vec::new()),
            CanFrame::standard(0x7FF, vec![0x55; 8]),
        ];
        let mut stream = Vec::new();
        for frame in &frames {
            stream.extend_from_slice(&encoder::encode_frame(frame).unwrap());
        }

        for chunk_size in [1usize, 2, 3, 7, stream.len()] {
            let (mut session, recorded) = recording_session();
            for chunk in stream.chunks(chunk_size) {
                session.feed(chunk);
            }
            assert_eq!(recorded.lock().unwrap().frames, frames);
        }
    }

    #[test]
    fn test_reset_receiver() {
        let (mut session, recorded) = recording_session();
        session.feed(&[0xAA, 0xC3, 0x10]);
        assert_eq!(session.receive_state(), DetectState::IdStd);
        session.reset_receiver();
        assert_eq!(session.receive_state(), DetectState::WaitStart);
        session.feed(&[0x00, 0x55]);
        assert!(recorded.lock().unwrap().frames.is_empty());

        session.clear_statistics();
        assert_eq!(session.statistics().bytes_received, 0);
    }
}
