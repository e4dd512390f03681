//! Serial reader — opens the meter port and forwards complete frames.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use powermunin_domain::frame::{Frame, FrameParser};

use crate::config::SerialConfig;
use crate::error::SerialError;

/// Bytes allowed to pile up without a complete frame before the parser is reset.
pub const MAX_BUFFERED_BYTES: usize = 64 * 1024;

const READ_CHUNK: usize = 1024;

/// Reads the meter's byte stream and sends each complete [`Frame`] downstream.
///
/// Runs until the receiving side of the frame channel is dropped. Open and
/// read failures are logged and retried, never returned.
pub struct SerialReader {
    config: SerialConfig,
    parser: FrameParser,
    frames: mpsc::Sender<Frame>,
}

impl SerialReader {
    pub fn new(config: SerialConfig, frames: mpsc::Sender<Frame>) -> Self {
        Self {
            config,
            parser: FrameParser::new(),
            frames,
        }
    }

    pub async fn run(mut self) {
        loop {
            let port = self.open().await;
            match self.pump(port).await {
                Ok(()) => {
                    tracing::debug!("frame receiver closed, stopping serial reader");
                    return;
                }
                Err(err) => {
                    tracing::error!(error = ?err, "serial connection lost");
                    self.parser.reset();
                    tokio::time::sleep(self.config.reopen_delay()).await;
                }
            }
        }
    }

    async fn open(&self) -> SerialStream {
        loop {
            match self.try_open() {
                Ok(port) => {
                    tracing::info!(
                        path = %self.config.path,
                        baud_rate = self.config.baud_rate,
                        "serial port opened"
                    );
                    return port;
                }
                Err(err) => {
                    tracing::error!(error = ?err, "cannot open serial port");
                    tokio::time::sleep(self.config.open_retry()).await;
                }
            }
        }
    }

    fn try_open(&self) -> Result<SerialStream, SerialError> {
        tokio_serial::new(self.config.path.as_str(), self.config.baud_rate)
            .timeout(self.config.read_timeout())
            .open_native_async()
            .map_err(|source| SerialError::Open {
                path: self.config.path.clone(),
                source,
            })
    }

    /// Read from `port` until it fails or the frame receiver goes away.
    ///
    /// A read that stays silent for the configured timeout is not an error.
    async fn pump<R>(&mut self, mut port: R) -> Result<(), SerialError>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = [0_u8; READ_CHUNK];
        loop {
            let pending = port.read(&mut chunk);
            let read = match tokio::time::timeout(self.config.read_timeout(), pending).await {
                Err(_elapsed) => {
                    tracing::trace!("serial read timed out");
                    continue;
                }
                Ok(result) => result.map_err(SerialError::Read)?,
            };
            if read == 0 {
                return Err(SerialError::Closed);
            }
            if !self.feed(&chunk[..read]).await {
                return Ok(());
            }
        }
    }

    /// Returns `false` once the frame receiver is gone.
    async fn feed(&mut self, bytes: &[u8]) -> bool {
        self.parser.extend(bytes);
        for frame in self.parser.frames() {
            tracing::trace!(lines = frame.lines().len(), "frame received");
            if self.frames.send(frame).await.is_err() {
                return false;
            }
        }

        if self.parser.buffered_len() > MAX_BUFFERED_BYTES {
            tracing::warn!(
                buffered = self.parser.buffered_len(),
                "no complete frame in serial input, discarding buffer"
            );
            self.parser.reset();
        }
        true
    }
}
