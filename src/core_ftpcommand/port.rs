use crate::core_codec::{parse_eprt, parse_port, Command};
use crate::core_session::Session;
use crate::error::FtpError;
use log::{info, warn};
use std::net::SocketAddr;

/// Handles the PORT (Active Mode) FTP command.
///
/// The argument is the classic six-tuple; the server dials the advertised
/// address. Refused once "EPSV ALL" has been requested.
pub(crate) async fn handle_port_command(s: &mut Session, cmd: &Command) -> Result<(), FtpError> {
    if s.epsv_only() {
        return s.reply(550, "PORT is disallowed after EPSV ALL.").await;
    }
    let addr = match parse_port(&cmd.msg) {
        Ok(addr) => addr,
        Err(_) => return s.reply(501, "Invalid syntax.").await,
    };
    match dial(s, addr).await {
        Ok(()) => s.reply(200, "PORT command successful.").await,
        Err(()) => s.reply(550, "Failed to connect.").await,
    }
}

/// Handles the EPRT FTP command, the extended-address form of PORT.
pub(crate) async fn handle_eprt_command(s: &mut Session, cmd: &Command) -> Result<(), FtpError> {
    if s.epsv_only() {
        return s.reply(550, "EPRT is disallowed after EPSV ALL.").await;
    }
    let addr = match parse_eprt(&cmd.msg) {
        Ok(addr) => addr,
        Err(_) => return s.reply(501, "Invalid syntax.").await,
    };
    match dial(s, addr).await {
        Ok(()) => s.reply(227, "OK").await,
        Err(()) => s.reply(550, "Failed to connect.").await,
    }
}

async fn dial(s: &mut Session, addr: SocketAddr) -> Result<(), ()> {
    match s.active(addr).await {
        Ok(()) => {
            info!("{} active data connection to {}", s.peer(), addr);
            Ok(())
        }
        Err(e) => {
            warn!("active connect to {} failed: {}", addr, e);
            Err(())
        }
    }
}
