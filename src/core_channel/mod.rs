//! The data channel: a single-use byte conduit established either by an
//! outbound dial (active mode) or by a background accept on a listener
//! (passive mode), with transfer-type-aware writes and internal buffering.

use crate::constants::DATA_BUFFER_SIZE;
use crate::core_codec::{ehost_port, host_port};
use crate::error::FtpError;
use log::{debug, trace};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

/// Transfer type negotiated over TYPE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferType {
    /// "I": bytes pass through untouched.
    #[default]
    Image,
    /// "A": every bare LF is written as CRLF.
    Ascii,
}

/// Transfer mode negotiated over MODE. Only stream mode is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Stream,
}

/// Outcome of the single accept performed for a passive channel. Written
/// once by the background task, read by whoever waits on the channel.
#[derive(Default)]
struct AcceptState {
    stream: Option<TcpStream>,
    err: Option<io::Error>,
}

struct Shared {
    state: Mutex<AcceptState>,
    ready: Notify,
}

/// A data channel. This transforms payload according to the transfer type
/// and buffers writes; reads and writes wait until a connection has been
/// established.
pub struct DataChannel {
    addr: SocketAddr,
    typ: TransferType,
    shared: Arc<Shared>,
    accept_task: Option<JoinHandle<()>>,
    read_half: Option<OwnedReadHalf>,
    reader: Option<BufReader<OwnedReadHalf>>,
    writer: Option<OwnedWriteHalf>,
    wbuf: Vec<u8>,
    saw_cr: bool,
    closed: bool,
}

impl DataChannel {
    /// Create an active channel over an already-connected stream.
    pub fn active(stream: TcpStream) -> io::Result<DataChannel> {
        let addr = stream.peer_addr()?;
        Ok(DataChannel::new(
            addr,
            Arc::new(Shared {
                state: Mutex::new(AcceptState {
                    stream: Some(stream),
                    err: None,
                }),
                ready: Notify::new(),
            }),
            None,
        ))
    }

    /// Create a passive channel over a listener. A background task accepts
    /// exactly one connection and then drops the listener.
    pub fn passive(listener: TcpListener) -> io::Result<DataChannel> {
        let addr = listener.local_addr()?;
        let shared = Arc::new(Shared {
            state: Mutex::new(AcceptState::default()),
            ready: Notify::new(),
        });
        let task = tokio::spawn({
            let shared = Arc::clone(&shared);
            async move {
                let result = listener.accept().await;
                drop(listener);
                let mut state = shared.state.lock().await;
                match result {
                    Ok((stream, peer)) => {
                        trace!("data connection accepted from {}", peer);
                        state.stream = Some(stream);
                    }
                    Err(e) => {
                        debug!("data accept failed: {}", e);
                        state.err = Some(e);
                    }
                }
                drop(state);
                shared.ready.notify_one();
            }
        });
        Ok(DataChannel::new(addr, shared, Some(task)))
    }

    fn new(addr: SocketAddr, shared: Arc<Shared>, accept_task: Option<JoinHandle<()>>) -> Self {
        DataChannel {
            addr,
            typ: TransferType::default(),
            shared,
            accept_task,
            read_half: None,
            reader: None,
            writer: None,
            wbuf: Vec::new(),
            saw_cr: false,
            closed: false,
        }
    }

    /// Set the transfer type of the channel.
    pub fn set_type(&mut self, typ: TransferType) {
        self.typ = typ;
    }

    /// The listening address for a passive channel that has not accepted
    /// yet, otherwise the remote address of the connection.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The six-tuple form of [`DataChannel::addr`].
    pub fn host_port(&self) -> Result<String, FtpError> {
        host_port(&self.addr)
    }

    /// The EPRT form of [`DataChannel::addr`] with the default delimiter.
    pub fn ehost_port(&self, d: &str) -> Result<String, FtpError> {
        ehost_port(d, &self.addr)
    }

    /// Wait until a connection has been established, while neither the
    /// stream nor an accept error is available. An accept failure is
    /// returned immediately and on every later call.
    async fn ready(&mut self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "data channel is closed",
            ));
        }
        if self.read_half.is_some() || self.reader.is_some() || self.writer.is_some() {
            return Ok(());
        }
        loop {
            {
                let mut state = self.shared.state.lock().await;
                if let Some(stream) = state.stream.take() {
                    let (r, w) = stream.into_split();
                    self.read_half = Some(r);
                    self.writer = Some(w);
                    return Ok(());
                }
                if let Some(err) = &state.err {
                    return Err(io::Error::new(err.kind(), err.to_string()));
                }
            }
            self.shared.ready.notified().await;
        }
    }

    /// Read from the channel, waiting for a connection first. Returns 0 at
    /// end of stream.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader().await?.read(buf).await
    }

    /// Read one line, stripped of its terminator, or `None` at end of
    /// stream.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader().await?.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// The read buffer is attached on first read.
    async fn reader(&mut self) -> io::Result<&mut BufReader<OwnedReadHalf>> {
        self.ready().await?;
        if let Some(half) = self.read_half.take() {
            self.reader = Some(BufReader::new(half));
        }
        self.reader.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "data channel is write-closed")
        })
    }

    /// Write to the channel, waiting for a connection first. In ASCII type
    /// a CR is inserted before every LF not already preceded by one; a
    /// literal CRLF passes through unchanged.
    pub async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.ready().await?;
        match self.typ {
            TransferType::Ascii => {
                for &b in buf {
                    if !self.saw_cr && b == b'\n' {
                        self.wbuf.push(b'\r');
                    } else {
                        self.saw_cr = b == b'\r';
                    }
                    self.wbuf.push(b);
                }
            }
            TransferType::Image => self.wbuf.extend_from_slice(buf),
        }
        if self.wbuf.len() >= DATA_BUFFER_SIZE {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush any buffered data.
    pub async fn flush(&mut self) -> io::Result<()> {
        if self.wbuf.is_empty() {
            return Ok(());
        }
        let writer = self.writer.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "data channel is read-closed")
        })?;
        writer.write_all(&self.wbuf).await?;
        self.wbuf.clear();
        writer.flush().await
    }

    /// Flush and close the channel. The first error encountered is kept;
    /// closing an already-closed channel is a no-op. A pending accept is
    /// woken by dropping its listener.
    pub async fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(task) = self.accept_task.take() {
            task.abort();
        }
        let mut first = None;
        if self.writer.is_some() {
            if let Err(e) = self.flush().await {
                first = Some(e);
            }
        }
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                first.get_or_insert(e);
            }
        }
        self.read_half = None;
        self.reader = None;
        self.shared.state.lock().await.stream = None;
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for DataChannel {
    fn drop(&mut self) {
        if let Some(task) = self.accept_task.take() {
            task.abort();
        }
    }
}
