use crate::constants::DATA_BUFFER_SIZE;
use crate::core_codec::Command;
use crate::core_fs::FileSystem;
use crate::core_session::Session;
use crate::error::{is_permission, FtpError};
use log::info;

/// Handles the STOR (Store File) FTP command.
///
/// This function streams the data channel into a freshly created file. The
/// 150 preliminary reply is sent once the file exists; the copy runs until
/// the client closes its end of the data connection, and the close error of
/// the file decides the final reply.
///
/// # Arguments
///
/// * `s` - The session containing the user's current state.
/// * `fs` - The filesystem being served.
/// * `cmd` - The command carrying the name of the file to be stored.
///
/// # Returns
///
/// `Ok(())` once the final reply has been sent, or the error that tore the
/// control channel down.
pub(crate) async fn handle_stor_command(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
) -> Result<(), FtpError> {
    match store(s, fs, cmd).await {
        Ok(()) => s.reply(226, "Transfer complete.").await,
        Err(FtpError::NoDataConnection) => s.reply(425, "Use PORT or PASV first.").await,
        Err(FtpError::Io(e)) if is_permission(&e) => s.reply(550, "Insufficient permissions.").await,
        Err(FtpError::Io(_)) => s.reply(550, "Error storing file.").await,
        Err(e) => Err(e),
    }
}

async fn store(s: &mut Session, fs: &dyn FileSystem, cmd: &Command) -> Result<(), FtpError> {
    let Some(mut data) = s.take_data() else {
        return Err(FtpError::NoDataConnection);
    };
    let path = s.path(&cmd.msg);
    let mut file = match fs.create(&path).await {
        Ok(file) => file,
        Err(e) => {
            let _ = data.close().await;
            return Err(e.into());
        }
    };
    if let Err(e) = s.reply(150, "Awaiting file data.").await {
        let _ = file.close().await;
        let _ = data.close().await;
        return Err(e);
    }
    let result = async {
        let mut buf = vec![0u8; DATA_BUFFER_SIZE];
        loop {
            let n = data.read(&mut buf).await?;
            if n == 0 {
                return Ok::<(), FtpError>(());
            }
            file.write_all(&buf[..n]).await?;
        }
    }
    .await;
    if let Err(e) = result {
        let _ = file.close().await;
        let _ = data.close().await;
        return Err(e);
    }
    let close_result = file.close().await;
    let _ = data.close().await;
    close_result?;
    info!("{} stored {}", s.peer(), path);
    Ok(())
}
