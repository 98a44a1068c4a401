use crate::core_codec::Command;
use crate::core_fs::FileSystem;
use crate::core_session::Session;
use crate::error::{is_not_exist, is_permission, FtpError};

/// Handles the SIZE FTP command, replying 213 with the decimal size of a
/// regular file.
pub(crate) async fn handle_size_command(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
) -> Result<(), FtpError> {
    let path = s.path(&cmd.msg);
    match fs.stat(&path).await {
        Err(e) if is_permission(&e) => s.reply(550, "Insufficient permissions.").await,
        Err(e) if is_not_exist(&e) => s.reply(550, "No such file or directory.").await,
        Err(_) => s.reply(550, "Could not get size.").await,
        Ok(stat) if stat.is_dir => s.reply(550, "Path specifies a directory.").await,
        Ok(stat) => s.reply(213, &stat.size.to_string()).await,
    }
}
