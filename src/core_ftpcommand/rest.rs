use crate::core_codec::Command;
use crate::core_session::Session;
use crate::error::FtpError;

/// Handles the REST (Restart) FTP command. The offset applies to the
/// immediately following RETR only.
pub(crate) async fn handle_rest_command(s: &mut Session, cmd: &Command) -> Result<(), FtpError> {
    let Ok(offset) = cmd.msg.parse::<u64>() else {
        return s.reply(501, "Invalid restart offset.").await;
    };
    s.set_restart_offset(offset);
    s.reply(350, &format!("Restarting at {}.", offset)).await
}
