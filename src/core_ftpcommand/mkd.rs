use crate::core_codec::Command;
use crate::core_fs::FileSystem;
use crate::core_session::Session;
use crate::error::{is_exist, FtpError};
use log::info;

/// Handles the MKD (Make Directory) FTP command. The 257 reply quotes the
/// argument exactly as the client sent it.
pub(crate) async fn handle_mkd_command(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
) -> Result<(), FtpError> {
    let path = s.path(&cmd.msg);
    match fs.mkdir(&path).await {
        Ok(()) => {
            info!("{} created directory {}", s.peer(), path);
            s.reply(257, &format!("\"{}\" created.", cmd.msg)).await
        }
        Err(e) if is_exist(&e) => s.reply(550, "Directory already exists.").await,
        Err(_) => s.reply(550, "Failed to create directory.").await,
    }
}
