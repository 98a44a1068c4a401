use crate::core_codec::Command;
use crate::core_fs::FileSystem;
use crate::core_session::Session;
use crate::error::{is_not_exist, is_permission, FtpError};
use log::info;

/// Handles the RNTO (Rename To) FTP command, completing the two-step rename
/// started by an immediately preceding RNFR.
pub(crate) async fn handle_rnto_command(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
) -> Result<(), FtpError> {
    if cmd.msg.is_empty() {
        return s.reply(501, "A file name is required.").await;
    }
    let Some(source) = s.take_rename_source() else {
        return s.reply(503, "Use RNFR first.").await;
    };
    let target = s.path(&cmd.msg);
    match fs.rename(&source, &target).await {
        Ok(()) => {
            info!("{} renamed {} to {}", s.peer(), source, target);
            s.reply(250, "Rename successful.").await
        }
        Err(e) if is_permission(&e) => s.reply(550, "Insufficient permissions.").await,
        Err(e) if is_not_exist(&e) => s.reply(550, "No such file or directory.").await,
        Err(_) => s.reply(550, "Failed to rename.").await,
    }
}
