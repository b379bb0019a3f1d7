//! I/O traits and implementations for the push channel
//!
//! The push feed is line-delimited JSON over TCP. These traits abstract
//! frame reading, the subscribe handshake, and connection creation so the
//! stream client can be tested with mockall or hand-rolled fakes instead of
//! real sockets.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{DashboardError, Result};

/// Connection pair containing a reader and writer
pub struct ConnectionPair {
    /// Reader for incoming push frames
    pub reader: Box<dyn FrameReader>,
    /// Writer for the subscribe handshake and shutdown
    pub writer: Box<dyn FrameWriter>,
}

// ============================================================================
// FrameReader trait and implementations
// ============================================================================

/// Trait for reading frames from a push connection
///
/// Returns `Ok(Some(frame))` for each frame, `Ok(None)` on EOF, or an error
/// if the transport failed.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FrameReader: Send {
    async fn read_frame(&mut self) -> Result<Option<String>>;
}

/// TCP implementation of FrameReader using a buffered line reader
pub struct TcpFrameReader {
    reader: BufReader<ReadHalf<TcpStream>>,
    buffer: String,
}

impl TcpFrameReader {
    pub fn new(reader: ReadHalf<TcpStream>) -> Self {
        Self {
            reader: BufReader::new(reader),
            buffer: String::new(),
        }
    }
}

#[async_trait]
impl FrameReader for TcpFrameReader {
    async fn read_frame(&mut self) -> Result<Option<String>> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer).await {
            Ok(0) => Ok(None), // EOF
            Ok(_) => Ok(Some(self.buffer.trim().to_string())),
            Err(e) => Err(DashboardError::Io(e)),
        }
    }
}

// ============================================================================
// FrameWriter trait and implementations
// ============================================================================

/// Trait for writing to a push connection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FrameWriter: Send {
    /// Write one line, terminated and flushed
    async fn write_frame(&mut self, frame: &str) -> Result<()>;

    /// Shut the connection down
    async fn shutdown(&mut self) -> Result<()>;
}

/// TCP implementation of FrameWriter
pub struct TcpFrameWriter {
    writer: WriteHalf<TcpStream>,
}

impl TcpFrameWriter {
    pub fn new(writer: WriteHalf<TcpStream>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl FrameWriter for TcpFrameWriter {
    async fn write_frame(&mut self, frame: &str) -> Result<()> {
        self.writer
            .write_all(format!("{}\n", frame).as_bytes())
            .await
            .map_err(|e| DashboardError::SendError(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| DashboardError::SendError(e.to_string()))?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await.map_err(DashboardError::Io)
    }
}

// ============================================================================
// ConnectionFactory trait and implementations
// ============================================================================

/// Trait for creating push connections
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionFactory: Send + Sync {
    /// Attempt to connect to the specified address
    async fn connect(&self, addr: &str, timeout: Duration) -> Result<ConnectionPair>;
}

/// TCP implementation of ConnectionFactory
#[derive(Default, Clone)]
pub struct TcpConnectionFactory;

impl TcpConnectionFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectionFactory for TcpConnectionFactory {
    async fn connect(&self, addr: &str, timeout: Duration) -> Result<ConnectionPair> {
        debug!("Connecting to {} with timeout {:?}", addr, timeout);

        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| DashboardError::Timeout(format!("Connection to {} timed out", addr)))?
            .map_err(|e| {
                DashboardError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
            })?;

        debug!("TCP connection established to {}", addr);

        let (reader, writer) = tokio::io::split(stream);

        Ok(ConnectionPair {
            reader: Box::new(TcpFrameReader::new(reader)),
            writer: Box::new(TcpFrameWriter::new(writer)),
        })
    }
}
