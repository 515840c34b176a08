//! Stream accessor trait for the transport layer

use crate::error::{CanUsbError, CanUsbResult};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::time::Duration;

/// Stream accessor interface to the physical link with the adapter
#[async_trait]
pub trait StreamAccessor: Send + Sync {
    /// Set the read timeout
    ///
    /// # Arguments
    ///
    /// * `timeout` - The timeout duration. None means infinite timeout.
    async fn set_timeout(&mut self, timeout: Option<Duration>) -> CanUsbResult<()>;

    /// Read data from the stream
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 if EOF
    async fn read(&mut self, buf: &mut [u8]) -> CanUsbResult<usize>;

    /// Read whatever is available, up to `max_len` bytes
    ///
    /// An empty result means EOF.
    async fn read_chunk(&mut self, max_len: usize) -> CanUsbResult<Bytes> {
        let mut buf = BytesMut::zeroed(max_len);
        let n = self.read(&mut buf).await?;
        buf.truncate(n);
        Ok(buf.freeze())
    }

    /// Write data to the stream
    ///
    /// # Returns
    ///
    /// Number of bytes written
    async fn write(&mut self, buf: &[u8]) -> CanUsbResult<usize>;

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> CanUsbResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(CanUsbError::Connection(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Failed to write all data",
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Flush any buffered data
    async fn flush(&mut self) -> CanUsbResult<()>;

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> CanUsbResult<()>;
}

/// Transport layer trait that extends StreamAccessor
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Open the physical layer connection
    async fn open(&mut self) -> CanUsbResult<()>;
}
