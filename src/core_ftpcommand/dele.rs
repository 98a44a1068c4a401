use crate::core_codec::Command;
use crate::core_fs::FileSystem;
use crate::core_session::Session;
use crate::error::{is_not_exist, is_permission, FtpError};
use log::info;

/// Handles the DELE and RMD FTP commands. Removal does not distinguish
/// files from directories.
pub(crate) async fn handle_dele_command(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
) -> Result<(), FtpError> {
    if cmd.msg.is_empty() {
        return s.reply(501, "A file name is required.").await;
    }
    let path = s.path(&cmd.msg);
    match fs.remove(&path).await {
        Ok(()) => {
            info!("{} removed {}", s.peer(), path);
            s.reply(250, "Remove successful.").await
        }
        Err(e) if is_permission(&e) => s.reply(550, "Insufficient permissions.").await,
        Err(e) if is_not_exist(&e) => s.reply(550, "No such file or directory.").await,
        Err(_) => s.reply(550, "Failed to remove.").await,
    }
}
