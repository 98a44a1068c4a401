//! The client: a mirror of the server that issues commands over a control
//! connection, negotiates data channels (preferring the extended passive
//! forms) and exposes file-like remote handles.

mod file;

pub use file::RemoteFile;

use crate::core_channel::DataChannel;
use crate::core_codec::{parse_epsv, parse_pasv, Command, Reply};
use crate::core_fs::clean;
use crate::error::FtpError;
use log::{debug, trace};
use std::net::SocketAddr;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

struct ClientConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    local: SocketAddr,
    peer: SocketAddr,
}

/// A client for interacting with an FTP server.
pub struct Client {
    conn: Option<ClientConn>,
    cwd: String,
}

impl Client {
    /// Dial a server and consume its greeting.
    pub async fn connect(addr: &str) -> Result<Client, FtpError> {
        let stream = TcpStream::connect(addr).await?;
        let local = stream.local_addr()?;
        let peer = stream.peer_addr()?;
        let (r, w) = stream.into_split();
        let mut client = Client {
            conn: Some(ClientConn {
                reader: BufReader::new(r),
                writer: w,
                local,
                peer,
            }),
            cwd: String::new(),
        };
        let greeting = client.read_reply().await?;
        if !greeting.is_success() {
            return Err(FtpError::Rejected(greeting));
        }
        Ok(client)
    }

    fn conn(&mut self) -> Result<&mut ClientConn, FtpError> {
        self.conn.as_mut().ok_or(FtpError::SessionClosed)
    }

    /// Send a command without waiting for its reply.
    pub(crate) async fn command(&mut self, verb: &str, msg: &str) -> Result<(), FtpError> {
        let cmd = Command::new(verb, msg);
        trace!("> {}", cmd);
        let conn = self.conn()?;
        conn.writer.write_all(cmd.encode().as_bytes()).await?;
        conn.writer.flush().await?;
        Ok(())
    }

    /// Read one reply.
    pub(crate) async fn read_reply(&mut self) -> Result<Reply, FtpError> {
        let conn = self.conn()?;
        let reply = Reply::decode(&mut conn.reader).await?;
        trace!("< {}", reply);
        Ok(reply)
    }

    /// Send a command and read replies until the first non-preliminary one.
    pub(crate) async fn exchange(&mut self, verb: &str, msg: &str) -> Result<Reply, FtpError> {
        self.command(verb, msg).await?;
        loop {
            let reply = self.read_reply().await?;
            if !reply.is_preliminary() {
                return Ok(reply);
            }
        }
    }

    /// Log in. Returns whether the server accepted the credentials.
    pub async fn authorize(&mut self, user: &str, pass: &str) -> Result<bool, FtpError> {
        let mut reply = self.exchange("USER", user).await?;
        if reply.is_intermediate() {
            reply = self.exchange("PASS", pass).await?;
        }
        Ok(reply.is_success())
    }

    /// Establish a data channel, preferring passive mode and falling back
    /// to active mode.
    pub(crate) async fn data(&mut self) -> Result<DataChannel, FtpError> {
        match self.passive_channel().await {
            Ok(chan) => Ok(chan),
            Err(e) => {
                debug!("passive mode failed ({}), falling back to active", e);
                self.active_channel().await
            }
        }
    }

    /// Put the server into passive mode, preferring EPSV, and dial the
    /// address it advertises.
    async fn passive_channel(&mut self) -> Result<DataChannel, FtpError> {
        let mut addr = self.conn()?.peer;
        let reply = self.exchange("EPSV", "").await?;
        if reply.code == 229 {
            addr.set_port(parse_epsv(&reply.msg)?);
        } else {
            let reply = self.exchange("PASV", "").await?;
            if !reply.is_success() {
                return Err(FtpError::Rejected(reply));
            }
            // Keep the control-channel host; only the advertised port is
            // trusted, which plays nicer with servers behind NAT.
            addr.set_port(parse_pasv(&reply.msg)?.port());
        }
        let stream = TcpStream::connect(addr).await?;
        Ok(DataChannel::active(stream)?)
    }

    /// Put the server into active mode: listen locally and advertise the
    /// address over EPRT, falling back to PORT.
    async fn active_channel(&mut self) -> Result<DataChannel, FtpError> {
        let mut addr = self.conn()?.local;
        addr.set_port(0);
        let listener = TcpListener::bind(addr).await?;
        let mut chan = DataChannel::passive(listener)?;

        let eprt = chan.ehost_port("")?;
        let mut reply = self.exchange("EPRT", &eprt).await?;
        if reply.is_success() {
            return Ok(chan);
        }
        if let Ok(hp) = chan.host_port() {
            reply = self.exchange("PORT", &hp).await?;
            if reply.is_success() {
                return Ok(chan);
            }
        }
        let _ = chan.close().await;
        Err(FtpError::Rejected(reply))
    }

    /// Change the working directory.
    pub async fn chdir(&mut self, dir: &str) -> Result<(), FtpError> {
        let reply = self.exchange("CWD", dir).await?;
        if !reply.is_success() {
            return Err(FtpError::Rejected(reply));
        }
        self.cwd = self.path(dir);
        Ok(())
    }

    /// Make a new directory.
    pub async fn mkdir(&mut self, path: &str) -> Result<(), FtpError> {
        let reply = self.exchange("MKD", path).await?;
        if !reply.is_success() {
            return Err(FtpError::Rejected(reply));
        }
        Ok(())
    }

    /// Remove a file or directory.
    pub async fn remove(&mut self, path: &str) -> Result<(), FtpError> {
        let reply = self.exchange("DELE", path).await?;
        if !reply.is_success() {
            return Err(FtpError::Rejected(reply));
        }
        Ok(())
    }

    /// Rename a file or directory through an RNFR/RNTO exchange.
    pub async fn rename(&mut self, old: &str, new: &str) -> Result<(), FtpError> {
        let reply = self.exchange("RNFR", old).await?;
        if !reply.is_intermediate() {
            return Err(FtpError::Rejected(reply));
        }
        let reply = self.exchange("RNTO", new).await?;
        if !reply.is_success() {
            return Err(FtpError::Rejected(reply));
        }
        Ok(())
    }

    /// Open a remote file or directory. The handle is lazy: the first read
    /// starts a RETR, a readdir starts an NLST.
    pub fn open(&mut self, path: &str) -> RemoteFile<'_> {
        let path = self.path(path);
        RemoteFile::new(self, path)
    }

    /// Create a remote file. The handle is lazy: the first write starts a
    /// STOR.
    pub fn create(&mut self, path: &str) -> RemoteFile<'_> {
        let path = self.path(path);
        RemoteFile::new(self, path)
    }

    /// Send a QUIT and close the control connection.
    pub async fn quit(&mut self) -> Result<(), FtpError> {
        self.exchange("QUIT", "").await?;
        self.close().await
    }

    /// Close the control connection.
    pub async fn close(&mut self) -> Result<(), FtpError> {
        let Some(mut conn) = self.conn.take() else {
            return Err(FtpError::SessionClosed);
        };
        conn.writer.shutdown().await?;
        Ok(())
    }

    /// Relativize `p` against the working directory.
    fn path(&self, p: &str) -> String {
        if p.starts_with('/') || self.cwd.is_empty() {
            return p.to_string();
        }
        clean(&format!("{}/{}", self.cwd, p))
    }
}
