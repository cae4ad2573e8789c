//! TCP server accepting a single producer connection

use crate::config::ServerSettings;
use crate::server::MessageFramer;
use crate::{LogMetricsError, Result};
use std::io::ErrorKind;
use std::net::{SocketAddr, SocketAddrV4};
use tokio::io::Interest;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::broadcast;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, trace};

/// How a receive loop ended without a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// The producer closed its end or hung up
    PeerDisconnected,
    /// A shutdown signal was received
    Shutdown,
}

/// Listening socket waiting for the one producer
pub struct TcpServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    settings: ServerSettings,
    shutdown_rx: broadcast::Receiver<()>,
}

impl TcpServer {
    /// Bind and listen on the configured address
    pub async fn bind(
        settings: &ServerSettings,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let addr = settings.bind_addr()?;
        let listener = Self::listen(addr)?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "Listening for producer connection");

        Ok(Self {
            listener,
            local_addr,
            settings: settings.clone(),
            shutdown_rx,
        })
    }

    fn listen(addr: SocketAddrV4) -> Result<TcpListener> {
        let socket = TcpSocket::new_v4()
            .map_err(|e| LogMetricsError::Transport(format!("Failed to create socket: {}", e)))?;
        socket
            .set_reuseaddr(true)
            .map_err(|e| LogMetricsError::Transport(format!("Failed to set SO_REUSEADDR: {}", e)))?;
        socket
            .bind(addr.into())
            .map_err(|e| LogMetricsError::Transport(format!("Failed to bind {}: {}", addr, e)))?;
        socket
            .listen(1)
            .map_err(|e| LogMetricsError::Transport(format!("Failed to listen on {}: {}", addr, e)))
    }

    /// Address actually bound, useful when port 0 was requested
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept exactly one producer, closing the listening socket afterwards.
    ///
    /// Returns `None` when shutdown is signalled first.
    pub async fn accept(mut self) -> Result<Option<ClientConnection>> {
        let (stream, peer) = tokio::select! {
            result = self.listener.accept() => result.map_err(|e| {
                LogMetricsError::Transport(format!("Failed to accept connection: {}", e))
            })?,
            _ = self.shutdown_rx.recv() => {
                debug!("Shutdown before a producer connected");
                return Ok(None);
            }
        };

        info!(peer = %peer, "Producer connected");

        let framer = MessageFramer::new(self.settings.message_boundary, self.settings.buffer_size)
            .with_max_line_length(self.settings.max_line_length);

        Ok(Some(ClientConnection {
            stream,
            peer,
            framer,
            read_buf: vec![0; self.settings.buffer_size],
            poll_timeout: self.settings.poll_timeout(),
            shutdown_rx: self.shutdown_rx,
        }))
    }
}

/// The accepted producer connection
pub struct ClientConnection {
    stream: TcpStream,
    peer: SocketAddr,
    framer: MessageFramer,
    read_buf: Vec<u8>,
    poll_timeout: Duration,
    shutdown_rx: broadcast::Receiver<()>,
}

enum Drain {
    Open,
    Closed,
}

impl ClientConnection {
    /// Producer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Run the receive loop, handing every message to `on_message`.
    ///
    /// Each cycle waits for readiness for at most the poll timeout, then drains
    /// everything currently readable. A zero-length read, hang-up or reset
    /// ends the loop with [`ReceiveOutcome::PeerDisconnected`]; other read
    /// failures are returned as errors.
    pub async fn receive<F>(&mut self, mut on_message: F) -> Result<ReceiveOutcome>
    where
        F: FnMut(&str),
    {
        loop {
            let ready = tokio::select! {
                ready = timeout(self.poll_timeout, self.stream.ready(Interest::READABLE)) => ready,
                _ = self.shutdown_rx.recv() => {
                    debug!(peer = %self.peer, "Receive loop shutting down");
                    return Ok(ReceiveOutcome::Shutdown);
                }
            };

            let ready = match ready {
                Err(_) => {
                    trace!(peer = %self.peer, "No data within poll timeout");
                    continue;
                }
                Ok(Err(e)) if e.kind() == ErrorKind::Interrupted => continue,
                Ok(Err(e)) => {
                    error!(peer = %self.peer, error = %e, "Poll error");
                    return Err(LogMetricsError::Transport(format!("Poll error: {}", e)));
                }
                Ok(Ok(ready)) => ready,
            };

            let drained = if ready.is_readable() || ready.is_read_closed() {
                self.drain()?
            } else {
                Drain::Open
            };

            for message in self.framer.end_of_cycle() {
                on_message(&message);
            }

            if matches!(drained, Drain::Closed) || ready.is_read_closed() {
                for message in self.framer.finish() {
                    on_message(&message);
                }
                info!(peer = %self.peer, "Producer disconnected");
                return Ok(ReceiveOutcome::PeerDisconnected);
            }
        }
    }

    /// Read until the socket would block or the peer closes
    fn drain(&mut self) -> Result<Drain> {
        loop {
            match self.stream.try_read(&mut self.read_buf) {
                Ok(0) => return Ok(Drain::Closed),
                Ok(n) => {
                    trace!(peer = %self.peer, bytes = n, "Received chunk");
                    self.framer.extend(&self.read_buf[..n]);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(Drain::Open),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::ConnectionReset
                            | ErrorKind::ConnectionAborted
                            | ErrorKind::BrokenPipe
                    ) =>
                {
                    debug!(peer = %self.peer, error = %e, "Connection dropped by producer");
                    return Ok(Drain::Closed);
                }
                Err(e) => {
                    error!(peer = %self.peer, error = %e, "Error reading from socket");
                    return Err(e.into());
                }
            }
        }
    }
}
