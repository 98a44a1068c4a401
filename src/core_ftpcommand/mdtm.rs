use crate::constants::MDTM_FORMAT;
use crate::core_codec::Command;
use crate::core_fs::FileSystem;
use crate::core_session::Session;
use crate::error::{is_not_exist, is_permission, FtpError};

/// Handles the MDTM FTP command, replying 213 with the modification time of
/// a regular file as YYYYMMDDHHMMSS.
pub(crate) async fn handle_mdtm_command(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
) -> Result<(), FtpError> {
    let path = s.path(&cmd.msg);
    match fs.stat(&path).await {
        Err(e) if is_permission(&e) => s.reply(550, "Insufficient permissions.").await,
        Err(e) if is_not_exist(&e) => s.reply(550, "No such file.").await,
        Err(_) => s.reply(550, "Could not get modification time.").await,
        Ok(stat) if stat.is_dir => s.reply(550, "Could not get modification time.").await,
        Ok(stat) => {
            let mdtm = stat.modified.format(MDTM_FORMAT).to_string();
            s.reply(213, &mdtm).await
        }
    }
}
