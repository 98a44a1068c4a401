//! The control-channel session: greeting, the pending command, replies, the
//! negotiated transfer parameters and the attached data channel.

use crate::core_channel::{DataChannel, TransferMode, TransferType};
use crate::core_codec::{read_wire_line, Command, Reply};
use crate::core_fs::clean;
use crate::error::FtpError;
use log::trace;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

/// Address family requested for a passive listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

struct ControlConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// A single control-channel session with a client.
pub struct Session {
    peer: SocketAddr,
    local: SocketAddr,
    greeting: String,
    goodbye: String,
    pasv_host: Option<IpAddr>,
    control: Option<ControlConn>,
    cmd: Option<Command>,
    greeted: bool,

    /// User name used to authorize the session.
    pub user: String,
    /// Password used to authorize the session.
    pub password: String,
    dir: String,
    transfer_type: TransferType,
    transfer_mode: TransferMode,
    data: Option<DataChannel>,
    epsv_only: bool,
    rename_source: Option<String>,
    restart_offset: Option<u64>,
}

impl Session {
    pub(crate) fn new(
        stream: TcpStream,
        greeting: String,
        goodbye: String,
        pasv_host: Option<IpAddr>,
    ) -> io::Result<Session> {
        let peer = stream.peer_addr()?;
        let local = stream.local_addr()?;
        let (r, w) = stream.into_split();
        Ok(Session {
            peer,
            local,
            greeting,
            goodbye,
            pasv_host,
            control: Some(ControlConn {
                reader: BufReader::new(r),
                writer: w,
            }),
            cmd: None,
            greeted: false,
            user: String::new(),
            password: String::new(),
            dir: "/".to_string(),
            transfer_type: TransferType::default(),
            transfer_mode: TransferMode::default(),
            data: None,
            epsv_only: false,
            rename_source: None,
            restart_offset: None,
        })
    }

    /// Address of the remote host.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// The goodbye text used for QUIT and teardown replies.
    pub fn goodbye(&self) -> &str {
        &self.goodbye
    }

    /// Read the next command, or return the current one if it has not been
    /// replied to yet. The first call sends the greeting.
    pub async fn command(&mut self) -> Result<Command, FtpError> {
        if self.control.is_none() {
            return Err(FtpError::SessionClosed);
        }
        if !self.greeted {
            let greeting = self.greeting.clone();
            self.reply(220, &greeting).await?;
        }
        if let Some(cmd) = &self.cmd {
            return Ok(cmd.clone());
        }
        let control = match self.control.as_mut() {
            Some(c) => c,
            None => return Err(FtpError::SessionClosed),
        };
        let line = read_wire_line(&mut control.reader).await?;
        let cmd = Command::decode(&line)?;
        trace!("{} < {}", self.peer, cmd);
        self.cmd = Some(cmd.clone());
        Ok(cmd)
    }

    /// Send a reply. A non-preliminary code clears the pending command so
    /// the next one can be read; a final reply to QUIT closes the session.
    pub async fn reply(&mut self, code: u16, msg: &str) -> Result<(), FtpError> {
        let control = match self.control.as_mut() {
            Some(c) => c,
            None => return Err(FtpError::SessionClosed),
        };
        if self.cmd.is_none() && self.greeted {
            return Err(FtpError::NoPendingCommand);
        }
        let reply = Reply::new(code, msg);
        trace!("{} > {}", self.peer, reply);
        control.writer.write_all(reply.encode().as_bytes()).await?;
        control.writer.flush().await?;
        if code < 200 {
            return Ok(());
        }
        match self.cmd.take() {
            None => {
                self.greeted = true;
                Ok(())
            }
            Some(cmd) if cmd.verb == "QUIT" => self.close().await,
            Some(_) => Ok(()),
        }
    }

    /// Close the session. A 421 goodbye is sent on a best-effort basis if a
    /// command is still pending or no greeting was ever sent. The data
    /// channel, if any, is closed too.
    pub async fn close(&mut self) -> Result<(), FtpError> {
        if self.control.is_none() {
            return Err(FtpError::SessionClosed);
        }
        if self.cmd.is_some() || !self.greeted {
            let goodbye = self.goodbye.clone();
            if let Some(control) = self.control.as_mut() {
                let reply = Reply::new(421, goodbye);
                let _ = control.writer.write_all(reply.encode().as_bytes()).await;
                let _ = control.writer.flush().await;
            }
        }
        let mut result = Ok(());
        if let Some(mut control) = self.control.take() {
            result = control.writer.shutdown().await.map_err(FtpError::from);
        }
        if let Some(mut data) = self.data.take() {
            let _ = data.close().await;
        }
        result
    }

    /// Set the transfer type from a TYPE token, propagating it to any
    /// attached data channel.
    pub fn set_type(&mut self, t: &str) -> Result<(), FtpError> {
        let typ = match t {
            "L8" | "I" => TransferType::Image,
            "A" | "AN" => TransferType::Ascii,
            "AT" | "AC" => return Err(FtpError::Unsupported("ASCII print mode is not supported.")),
            "E" | "EN" | "ET" | "EC" => {
                return Err(FtpError::Unsupported("EBCDIC mode is not supported."))
            }
            _ => return Err(FtpError::Unsupported("Unrecognized type.")),
        };
        self.transfer_type = typ;
        if let Some(data) = self.data.as_mut() {
            data.set_type(typ);
        }
        Ok(())
    }

    /// Set the transfer mode from a MODE token. Only stream mode is
    /// supported.
    pub fn set_mode(&mut self, m: &str) -> Result<(), FtpError> {
        match m {
            "S" => {}
            "B" => return Err(FtpError::Unsupported("Block mode is not supported.")),
            "C" => return Err(FtpError::Unsupported("Compressed mode is not supported.")),
            _ => return Err(FtpError::Unsupported("Unrecognized mode.")),
        }
        self.transfer_mode = TransferMode::Stream;
        Ok(())
    }

    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }

    pub fn transfer_mode(&self) -> TransferMode {
        self.transfer_mode
    }

    /// Establish an active data channel by dialing `addr`, replacing (and
    /// closing) any existing one.
    pub async fn active(&mut self, addr: SocketAddr) -> Result<(), FtpError> {
        self.drop_data().await;
        let stream = TcpStream::connect(addr).await?;
        let mut chan = DataChannel::active(stream)?;
        chan.set_type(self.transfer_type);
        self.data = Some(chan);
        Ok(())
    }

    /// Establish a passive data channel on a wildcard port, replacing (and
    /// closing) any existing one. The listener binds the configured passive
    /// host if set, else the host the control channel is bound to.
    pub async fn passive(&mut self, family: Option<IpFamily>) -> Result<(), FtpError> {
        self.drop_data().await;
        let ip = self.passive_ip(family);
        let listener = TcpListener::bind((ip, 0)).await?;
        let mut chan = DataChannel::passive(listener)?;
        chan.set_type(self.transfer_type);
        self.data = Some(chan);
        Ok(())
    }

    fn passive_ip(&self, family: Option<IpFamily>) -> IpAddr {
        let host = self.pasv_host.unwrap_or_else(|| self.local.ip());
        match family {
            None => host,
            Some(IpFamily::V4) if host.is_ipv4() => host,
            Some(IpFamily::V6) if host.is_ipv6() => host,
            Some(IpFamily::V4) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            Some(IpFamily::V6) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }

    async fn drop_data(&mut self) {
        if let Some(mut data) = self.data.take() {
            let _ = data.close().await;
        }
    }

    /// The current data channel, if one has been established.
    pub fn data(&self) -> Option<&DataChannel> {
        self.data.as_ref()
    }

    /// Detach the data channel for a transfer. The channel is single-use;
    /// a later transfer needs a new PORT or PASV exchange.
    pub fn take_data(&mut self) -> Option<DataChannel> {
        self.data.take()
    }

    /// The absolute path of `p` against the working directory.
    pub fn path(&self, p: &str) -> String {
        if p.starts_with('/') {
            return p.to_string();
        }
        clean(&format!("/{}/{}", self.dir, p))
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn set_dir(&mut self, dir: String) {
        self.dir = dir;
    }

    /// Whether "EPSV ALL" was requested; PORT, EPRT and PASV are refused
    /// for the rest of the session once set.
    pub fn epsv_only(&self) -> bool {
        self.epsv_only
    }

    pub fn set_epsv_only(&mut self) {
        self.epsv_only = true;
    }

    pub fn set_rename_source(&mut self, path: String) {
        self.rename_source = Some(path);
    }

    pub fn take_rename_source(&mut self) -> Option<String> {
        self.rename_source.take()
    }

    pub fn clear_rename_source(&mut self) {
        self.rename_source = None;
    }

    pub fn set_restart_offset(&mut self, offset: u64) {
        self.restart_offset = Some(offset);
    }

    pub fn take_restart_offset(&mut self) -> Option<u64> {
        self.restart_offset.take()
    }

    pub fn clear_restart_offset(&mut self) {
        self.restart_offset = None;
    }
}
