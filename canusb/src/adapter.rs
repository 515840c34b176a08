//! USB-CAN adapter driver
//!
//! Binds a [`CanUsbSession`] to a transport. Outgoing commands are encoded by
//! the session into a channel-backed byte sink and then written to the
//! transport; bytes read from the transport are fed to the session, which
//! hands decoded frames and status reports to the application's sinks.

use bytes::Bytes;
use canusb_core::{CanConfig, CanFrame, CanUsbError, CanUsbResult};
use canusb_session::{CanUsbSession, ChannelByteSink, SessionBuilder};
use canusb_transport::{SerialSettings, SerialTransport, StreamAccessor, TransportLayer};
use tokio::sync::mpsc;

/// Maximum number of bytes taken from the transport per read
pub const DEFAULT_READ_CHUNK: usize = 256;

/// A USB-CAN adapter reachable through a transport
#[derive(Debug)]
pub struct CanUsbAdapter<T: TransportLayer> {
    transport: T,
    session: CanUsbSession,
    outgoing: mpsc::UnboundedReceiver<Bytes>,
    read_chunk: usize,
}

impl CanUsbAdapter<SerialTransport> {
    /// Create an adapter on a serial port at the adapter's default line rate
    pub fn serial(port_name: impl Into<String>, session: SessionBuilder) -> Self {
        Self::new(
            SerialTransport::new(SerialSettings::adapter(port_name)),
            session,
        )
    }
}

impl<T: TransportLayer> CanUsbAdapter<T> {
    /// Create an adapter on a transport
    ///
    /// Any byte sink configured on `session` is replaced: outgoing bytes
    /// always go to the transport.
    pub fn new(transport: T, session: SessionBuilder) -> Self {
        let (byte_sink, outgoing) = ChannelByteSink::channel();
        Self {
            transport,
            session: session.byte_sink(byte_sink).build(),
            outgoing,
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }

    /// Set the maximum number of bytes taken from the transport per read
    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk.max(1);
        self
    }

    /// Open the transport
    pub async fn open(&mut self) -> CanUsbResult<()> {
        self.transport.open().await?;
        self.session.reset_receiver();
        log::info!("USB-CAN adapter opened");
        Ok(())
    }

    /// Open the transport and send the adapter its configuration
    pub async fn open_with(&mut self, config: &CanConfig) -> CanUsbResult<()> {
        self.open().await?;
        self.configure(config).await
    }

    /// Transmit a CAN frame on the bus
    pub async fn send_frame(&mut self, frame: &CanFrame) -> CanUsbResult<()> {
        self.ensure_open()?;
        self.session.send_frame(frame)?;
        self.flush_outgoing().await
    }

    /// Send the adapter a configuration record
    pub async fn configure(&mut self, config: &CanConfig) -> CanUsbResult<()> {
        self.ensure_open()?;
        self.session.configure(config)?;
        self.flush_outgoing().await
    }

    /// Ask the adapter to forward only the given identifiers
    pub async fn enable_receive_selected(&mut self, ids: &[u32]) -> CanUsbResult<()> {
        self.ensure_open()?;
        self.session.enable_receive_selected(ids)?;
        self.flush_outgoing().await
    }

    /// Ask the adapter to forward every identifier again
    pub async fn cancel_receive_selected(&mut self) -> CanUsbResult<()> {
        self.ensure_open()?;
        self.session.cancel_receive_selected()?;
        self.flush_outgoing().await
    }

    /// Read one chunk from the transport and feed it to the session
    ///
    /// Returns the number of bytes consumed; 0 means the transport reached
    /// end of stream.
    pub async fn receive(&mut self) -> CanUsbResult<usize> {
        self.ensure_open()?;
        let chunk = self.transport.read_chunk(self.read_chunk).await?;
        log::trace!("Read {} bytes from adapter", chunk.len());
        self.session.feed(&chunk);
        Ok(chunk.len())
    }

    /// Feed the session until the transport reaches end of stream
    ///
    /// Returns the total number of bytes consumed.
    pub async fn receive_until_eof(&mut self) -> CanUsbResult<u64> {
        let mut total = 0u64;
        loop {
            let n = self.receive().await?;
            if n == 0 {
                return Ok(total);
            }
            total += n as u64;
        }
    }

    /// Close the transport, discarding any unsent bytes
    pub async fn close(&mut self) -> CanUsbResult<()> {
        while self.outgoing.try_recv().is_ok() {}
        self.session.reset_receiver();
        self.transport.close().await?;
        log::info!("USB-CAN adapter closed");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        !self.transport.is_closed()
    }

    pub fn session(&self) -> &CanUsbSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CanUsbSession {
        &mut self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn ensure_open(&self) -> CanUsbResult<()> {
        if self.transport.is_closed() {
            Err(CanUsbError::not_connected("USB-CAN adapter"))
        } else {
            Ok(())
        }
    }

    async fn flush_outgoing(&mut self) -> CanUsbResult<()> {
        while let Ok(bytes) = self.outgoing.try_recv() {
            if let Err(e) = self.transport.write_all(&bytes).await {
                let mut lost = 1;
                while self.outgoing.try_recv().is_ok() {
                    lost += 1;
                }
                self.session.record_lost_commands(lost);
                log::error!("Failed to write {} bytes to adapter: {}", bytes.len(), e);
                return Err(e);
            }
        }
        self.transport.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use canusb_core::ControllerStatus;
    use canusb_session::{encode_configuration, encode_filter_list, encode_frame};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Transport over a scripted tokio-test mock stream
    struct MockTransport {
        io: Mutex<tokio_test::io::Mock>,
        closed: bool,
    }

    impl MockTransport {
        fn new(io: tokio_test::io::Mock) -> Self {
            Self {
                io: Mutex::new(io),
                closed: true,
            }
        }
    }

    impl std::fmt::Debug for MockTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockTransport")
                .field("closed", &self.closed)
                .finish()
        }
    }

    #[async_trait]
    impl StreamAccessor for MockTransport {
        async fn set_timeout(&mut self, _timeout: Option<Duration>) -> CanUsbResult<()> {
            Ok(())
        }

        async fn read(&mut self, buf: &mut [u8]) -> CanUsbResult<usize> {
            let io = self.io.get_mut().unwrap();
            Ok(io.read(buf).await?)
        }

        async fn write(&mut self, buf: &[u8]) -> CanUsbResult<usize> {
            let io = self.io.get_mut().unwrap();
            Ok(io.write(buf).await?)
        }

        async fn flush(&mut self) -> CanUsbResult<()> {
            let io = self.io.get_mut().unwrap();
            Ok(io.flush().await?)
        }

        fn is_closed(&self) -> bool {
            self.closed
        }

        async fn close(&mut self) -> CanUsbResult<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[async_trait]
    impl TransportLayer for MockTransport {
        async fn open(&mut self) -> CanUsbResult<()> {
            self.closed = false;
            Ok(())
        }
    }

    fn status_report(rx_errors: u8, tx_errors: u8) -> Vec<u8> {
        let mut report = vec![0xAA, 0x55, 0x04, 0x00, rx_errors, tx_errors];
        report.extend_from_slice(&[0u8; 13]);
        let sum = report[2..]
            .iter()
            .fold(0u8, |sum, &b| sum.wrapping_add(b));
        report.push(sum);
        report
    }

    #[tokio::test]
    async fn test_open_configure_send_receive() {
        let config = CanConfig::default();
        let tx_frame = CanFrame::standard(
            0x200,
            vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88],
        );
        let rx_frame = CanFrame::extended(0x18DA_F110, vec![0x02, 0x10, 0x03]);

        let mut incoming = encode_frame(&rx_frame).unwrap().to_vec();
        incoming.extend_from_slice(&status_report(5, 1));

        let io = tokio_test::io::Builder::new()
            .write(&encode_configuration(&config))
            .write(&encode_filter_list(&[0x100]).unwrap())
            .write(&encode_frame(&tx_frame).unwrap())
            .read(&incoming[..7])
            .read(&incoming[7..])
            .build();

        let (frame_tx, mut frames) = mpsc::unbounded_channel::<CanFrame>();
        let (status_tx, mut statuses) = mpsc::unbounded_channel::<ControllerStatus>();
        let session = CanUsbSession::builder()
            .frame_sink(frame_tx)
            .status_sink(status_tx);
        let mut adapter = CanUsbAdapter::new(MockTransport::new(io), session);

        adapter.open_with(&config).await.unwrap();
        assert!(adapter.is_open());
        adapter.enable_receive_selected(&[0x100]).await.unwrap();
        adapter.send_frame(&tx_frame).await.unwrap();

        let consumed = adapter.receive_until_eof().await.unwrap();
        assert_eq!(consumed, incoming.len() as u64);
        assert_eq!(frames.try_recv().unwrap(), rx_frame);
        assert!(frames.try_recv().is_err());
        assert_eq!(statuses.try_recv().unwrap(), ControllerStatus::new(1, 5));
        assert_eq!(adapter.session().commands_sent(), 3);
    }

    #[tokio::test]
    async fn test_send_while_closed_fails() {
        let io = tokio_test::io::Builder::new().build();
        let mut adapter = CanUsbAdapter::new(MockTransport::new(io), CanUsbSession::builder());

        let result = adapter.send_frame(&CanFrame::standard(0x1, vec![1])).await;
        match result {
            Err(CanUsbError::Connection(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotConnected)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(adapter.cancel_receive_selected().await.is_err());
        assert!(adapter.receive().await.is_err());
        assert_eq!(adapter.session().commands_sent(), 0);
    }

    #[tokio::test]
    async fn test_invalid_argument_writes_nothing() {
        let io = tokio_test::io::Builder::new()
            .write(&[0xAA, 0x55, 0x10, 0x00, 0x10])
            .build();
        let mut adapter = CanUsbAdapter::new(MockTransport::new(io), CanUsbSession::builder());
        adapter.open().await.unwrap();

        assert!(matches!(
            adapter
                .send_frame(&CanFrame::standard(0x1, vec![0u8; 9]))
                .await,
            Err(CanUsbError::InvalidArgument(_))
        ));
        assert!(matches!(
            adapter.enable_receive_selected(&[]).await,
            Err(CanUsbError::InvalidArgument(_))
        ));
        adapter.cancel_receive_selected().await.unwrap();

        adapter.close().await.unwrap();
        assert!(!adapter.is_open());
    }

    #[tokio::test]
    async fn test_failed_write_counts_as_send_failure() {
        let config = CanConfig::default();
        let io = tokio_test::io::Builder::new()
            .write(&encode_configuration(&config))
            .write_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "adapter unplugged",
            ))
            .build();
        let mut adapter = CanUsbAdapter::new(MockTransport::new(io), CanUsbSession::builder());

        adapter.open_with(&config).await.unwrap();
        let result = adapter.send_frame(&CanFrame::standard(0x123, vec![0x01])).await;
        match result {
            Err(CanUsbError::Connection(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(adapter.session().commands_sent(), 1);
        assert_eq!(adapter.session().send_failures(), 1);
    }

    #[tokio::test]
    async fn test_small_read_chunks() {
        let frame = CanFrame::standard(0x7E8, vec![0x04, 0x41, 0x0C, 0x1A, 0xF8]);
        let encoded = encode_frame(&frame).unwrap();
        let io = tokio_test::io::Builder::new().read(&encoded).build();

        let (frame_tx, mut frames) = mpsc::unbounded_channel::<CanFrame>();
        let mut adapter = CanUsbAdapter::new(
            MockTransport::new(io),
            CanUsbSession::builder().frame_sink(frame_tx),
        )
        .with_read_chunk(3);
        adapter.open().await.unwrap();

        assert_eq!(adapter.receive().await.unwrap(), 3);
        assert!(frames.try_recv().is_err());
        adapter.receive_until_eof().await.unwrap();
        assert_eq!(frames.try_recv().unwrap(), frame);
        assert_eq!(adapter.session().statistics().frames_received, 1);
    }
}
