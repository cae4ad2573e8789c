//! Non-blocking TCP sink for shipping wire lines to a collector

use crate::client::LogSink;
use crate::{LogMetricsError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::net::SocketAddrV4;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Default bound on connect and write readiness waits
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Lifecycle of an outbound connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connect attempted yet
    Unconnected,
    /// Handshake in flight
    Connecting,
    /// Ready to send
    Connected,
    /// Terminal; a new sink must be created
    Failed,
}

struct Connection {
    state: ConnectionState,
    stream: Option<TcpStream>,
}

impl Connection {
    fn fail(&mut self) {
        self.state = ConnectionState::Failed;
        // Dropping the stream closes the descriptor.
        self.stream = None;
    }
}

/// Outbound transport owning one TCP connection to the collector
pub struct SocketSink {
    addr: SocketAddrV4,
    timeout: Duration,
    connection: Mutex<Connection>,
}

impl SocketSink {
    /// Create an unconnected sink for the given collector address
    pub fn new(addr: SocketAddrV4, timeout: Duration) -> Self {
        Self {
            addr,
            timeout,
            connection: Mutex::new(Connection {
                state: ConnectionState::Unconnected,
                stream: None,
            }),
        }
    }

    /// Create a sink and attempt the connection once.
    ///
    /// The returned sink is either `Connected` or `Failed`; a failure is logged
    /// and visible through [`SocketSink::state`] and [`LogSink::is_valid`].
    pub async fn open(addr: SocketAddrV4, timeout: Duration) -> Self {
        let sink = Self::new(addr, timeout);
        if let Err(e) = sink.connect().await {
            warn!(addr = %addr, error = %e, "Failed to connect to collector");
        }
        sink
    }

    /// Collector address
    pub fn addr(&self) -> SocketAddrV4 {
        self.addr
    }

    /// Current connection state
    pub async fn state(&self) -> ConnectionState {
        self.connection.lock().await.state
    }

    /// Perform the non-blocking connect, bounded by the configured timeout.
    ///
    /// Only valid from `Unconnected`. Refusal, any socket error or the timeout
    /// elapsing leave the sink `Failed`.
    pub async fn connect(&self) -> Result<()> {
        let mut conn = self.connection.lock().await;
        if conn.state != ConnectionState::Unconnected {
            return Err(LogMetricsError::Transport(format!(
                "Connect already attempted (state {:?})",
                conn.state
            )));
        }

        conn.state = ConnectionState::Connecting;
        debug!(addr = %self.addr, "Connecting to collector");

        match timeout(self.timeout, TcpStream::connect(self.addr)).await {
            Ok(Ok(stream)) => {
                conn.stream = Some(stream);
                conn.state = ConnectionState::Connected;
                info!(addr = %self.addr, "Connected to collector");
                Ok(())
            }
            Ok(Err(e)) => {
                conn.fail();
                Err(LogMetricsError::Transport(format!("Failed to connect: {}", e)))
            }
            Err(_) => {
                conn.fail();
                Err(LogMetricsError::Transport("Connection timeout".to_string()))
            }
        }
    }

    /// Send one line, appending the terminator.
    ///
    /// A no-op unless `Connected`. Each write attempt waits for writability for
    /// at most the configured timeout; a timeout or hard write error leaves the
    /// sink `Failed`. Bytes already accepted by the kernel are not recalled.
    pub async fn send(&self, line: &str) -> Result<()> {
        let mut conn = self.connection.lock().await;
        if conn.state != ConnectionState::Connected {
            debug!(state = ?conn.state, "Dropping line, sink not connected");
            return Ok(());
        }

        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');

        let result = match conn.stream.as_ref() {
            Some(stream) => self.write_all(stream, &data).await,
            None => Err(LogMetricsError::Transport("Connected without a stream".to_string())),
        };

        if let Err(e) = &result {
            warn!(addr = %self.addr, error = %e, "Send failed, connection is now unusable");
            conn.fail();
        }
        result
    }

    async fn write_all(&self, stream: &TcpStream, data: &[u8]) -> Result<()> {
        let mut sent = 0;
        while sent < data.len() {
            timeout(self.timeout, stream.writable())
                .await
                .map_err(|_| {
                    LogMetricsError::Io(std::io::Error::new(
                        ErrorKind::TimedOut,
                        "timed out waiting for socket to become writable",
                    ))
                })??;

            match stream.try_write(&data[sent..]) {
                Ok(0) => {
                    return Err(LogMetricsError::Io(std::io::Error::new(
                        ErrorKind::WriteZero,
                        "socket accepted zero bytes",
                    )))
                }
                Ok(n) => sent += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Close the connection. The sink cannot be reused afterwards.
    pub async fn close(&self) -> Result<()> {
        let mut conn = self.connection.lock().await;
        if let Some(mut stream) = conn.stream.take() {
            stream.shutdown().await?;
        }
        conn.state = ConnectionState::Failed;
        Ok(())
    }
}

#[async_trait]
impl LogSink for SocketSink {
    async fn write(&self, line: &str) -> Result<()> {
        self.send(line).await
    }

    async fn is_valid(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }
}
