use crate::core_codec::Command;
use crate::core_session::{IpFamily, Session};
use crate::error::FtpError;
use log::{debug, warn};

/// Handles the PASV FTP command.
///
/// A listener is bound on a wildcard port and its address advertised as the
/// classic six-tuple. Refused once "EPSV ALL" has been requested.
pub(crate) async fn handle_pasv_command(s: &mut Session) -> Result<(), FtpError> {
    if s.epsv_only() {
        return s.reply(550, "PASV is disallowed after EPSV ALL.").await;
    }
    if let Err(e) = s.passive(Some(IpFamily::V4)).await {
        warn!("failed to open passive listener: {}", e);
        return s.reply(425, "Can't open data connection.").await;
    }
    let hp = match s.data().map(|d| d.host_port()) {
        Some(Ok(hp)) => hp,
        _ => return s.reply(425, "Can't open data connection.").await,
    };
    debug!("{} entering passive mode at {}", s.peer(), hp);
    s.reply(227, &format!("Entering Passive Mode ({}).", hp))
        .await
}

/// Handles the EPSV FTP command.
///
/// "ALL" latches the session into extended-passive-only operation; "1", "2"
/// or an empty argument select the address family of the listener, which is
/// advertised by port alone.
pub(crate) async fn handle_epsv_command(s: &mut Session, cmd: &Command) -> Result<(), FtpError> {
    if cmd.msg.eq_ignore_ascii_case("ALL") {
        s.set_epsv_only();
        return s.reply(200, "EPSV ALL accepted.").await;
    }
    let family = match cmd.msg.as_str() {
        "" => None,
        "1" => Some(IpFamily::V4),
        "2" => Some(IpFamily::V6),
        _ => return s.reply(522, "Unsupported protocol, use (1,2).").await,
    };
    if let Err(e) = s.passive(family).await {
        warn!("failed to open passive listener: {}", e);
        return s.reply(425, "Can't open data connection.").await;
    }
    let port = match s.data() {
        Some(d) => d.addr().port(),
        None => return s.reply(425, "Can't open data connection.").await,
    };
    s.reply(229, &format!("Entering Extended Passive Mode (|||{}|)", port))
        .await
}
