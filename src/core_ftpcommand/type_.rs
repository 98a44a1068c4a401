use crate::core_codec::Command;
use crate::core_session::Session;
use crate::error::FtpError;
use log::debug;

/// Handles the TYPE FTP command.
///
/// Accepts the image ("I", "L8") and ASCII ("A", "AN") representation
/// types; ASCII-print and EBCDIC variants are refused with the reason in a
/// 504 reply.
pub(crate) async fn handle_type_command(s: &mut Session, cmd: &Command) -> Result<(), FtpError> {
    match s.set_type(&cmd.msg) {
        Ok(()) => {
            debug!("{} type set to {:?}", s.peer(), s.transfer_type());
            s.reply(200, "Type switched successfully.").await
        }
        Err(e) => s.reply(504, &e.to_string()).await,
    }
}

/// Handles the MODE FTP command. Only stream mode is supported.
pub(crate) async fn handle_mode_command(s: &mut Session, cmd: &Command) -> Result<(), FtpError> {
    match s.set_mode(&cmd.msg) {
        Ok(()) => s.reply(200, "Mode switched successfully.").await,
        Err(e) => s.reply(504, &e.to_string()).await,
    }
}
