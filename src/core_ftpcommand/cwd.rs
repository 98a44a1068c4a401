use crate::core_codec::Command;
use crate::core_fs::FileSystem;
use crate::core_session::Session;
use crate::error::{is_not_exist, is_permission, FtpError};
use log::info;

/// Handles the CWD (Change Working Directory) FTP command.
///
/// The target is resolved against the working directory and adopted only if
/// it stats as a directory.
pub(crate) async fn handle_cwd_command(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
) -> Result<(), FtpError> {
    if cmd.msg.is_empty() {
        return s.reply(550, "Failed to change directory.").await;
    }
    change_dir(s, fs, &cmd.msg).await
}

/// Handles the CDUP (Change to Parent Directory) FTP command.
pub(crate) async fn handle_cdup_command(
    s: &mut Session,
    fs: &dyn FileSystem,
) -> Result<(), FtpError> {
    change_dir(s, fs, "..").await
}

async fn change_dir(s: &mut Session, fs: &dyn FileSystem, target: &str) -> Result<(), FtpError> {
    let path = s.path(target);
    match fs.stat(&path).await {
        Err(e) if is_permission(&e) => s.reply(550, "Insufficient permissions.").await,
        Err(e) if is_not_exist(&e) => s.reply(550, "No such directory.").await,
        Err(_) => s.reply(550, "Failed to change directory.").await,
        Ok(stat) if !stat.is_dir => s.reply(550, "Failed to change directory.").await,
        Ok(_) => {
            info!("{} changed directory to {}", s.peer(), path);
            s.set_dir(path);
            s.reply(250, "Directory successfully changed.").await
        }
    }
}
