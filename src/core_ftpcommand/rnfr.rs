use crate::core_codec::Command;
use crate::core_session::Session;
use crate::error::FtpError;

/// Handles the RNFR (Rename From) FTP command.
///
/// This records the source of a rename transaction in the session; the
/// matching RNTO must be the very next command, as any other command clears
/// the recorded source.
pub(crate) async fn handle_rnfr_command(s: &mut Session, cmd: &Command) -> Result<(), FtpError> {
    if cmd.msg.is_empty() {
        return s.reply(501, "A file name is required.").await;
    }
    let path = s.path(&cmd.msg);
    s.set_rename_source(path);
    s.reply(350, "Ready for RNTO.").await
}
