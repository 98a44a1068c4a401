use crate::constants::DATA_BUFFER_SIZE;
use crate::core_channel::DataChannel;
use crate::core_codec::Command;
use crate::core_fs::{File, FileSystem};
use crate::core_session::Session;
use crate::error::{is_not_exist, is_permission, FtpError};
use log::info;

/// Handles the RETR (Retrieve) FTP command.
///
/// This function streams a file from the filesystem to the client over the
/// data channel. The 150 preliminary reply is sent once the file is open;
/// the final reply follows the close of the data channel, which flushes any
/// buffered payload. A restart offset recorded by an immediately preceding
/// REST skips that many bytes of the file.
///
/// # Arguments
///
/// * `s` - The session containing the user's current state.
/// * `fs` - The filesystem being served.
/// * `cmd` - The command carrying the name of the file to retrieve.
///
/// # Returns
///
/// `Ok(())` once the final reply has been sent, or the error that tore the
/// control channel down.
pub(crate) async fn handle_retr_command(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
) -> Result<(), FtpError> {
    match retrieve(s, fs, cmd).await {
        Ok(()) => s.reply(226, "Transfer complete.").await,
        Err(FtpError::NoDataConnection) => s.reply(425, "Use PORT or PASV first.").await,
        Err(FtpError::Io(e)) if is_permission(&e) => s.reply(550, "Insufficient permissions.").await,
        Err(FtpError::Io(e)) if is_not_exist(&e) => s.reply(550, "No such file.").await,
        Err(FtpError::Io(_)) => s.reply(550, "Error retrieving file.").await,
        Err(e) => Err(e),
    }
}

async fn retrieve(s: &mut Session, fs: &dyn FileSystem, cmd: &Command) -> Result<(), FtpError> {
    let Some(mut data) = s.take_data() else {
        return Err(FtpError::NoDataConnection);
    };
    let offset = s.take_restart_offset().unwrap_or(0);
    let path = s.path(&cmd.msg);
    let mut file = match fs.open(&path).await {
        Ok(file) => file,
        Err(e) => {
            let _ = data.close().await;
            return Err(e.into());
        }
    };
    if let Err(e) = s.reply(150, "Here comes the file.").await {
        let _ = file.close().await;
        let _ = data.close().await;
        return Err(e);
    }
    let result = copy_from(file.as_mut(), &mut data, offset).await;
    let _ = file.close().await;
    if let Err(e) = result {
        let _ = data.close().await;
        return Err(e);
    }
    data.close().await?;
    info!("{} retrieved {}", s.peer(), path);
    Ok(())
}

/// Copy the file to the data channel, discarding the first `offset` bytes.
async fn copy_from(
    file: &mut dyn File,
    data: &mut DataChannel,
    mut offset: u64,
) -> Result<(), FtpError> {
    let mut buf = vec![0u8; DATA_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        let mut chunk = &buf[..n];
        if offset > 0 {
            let skip = offset.min(n as u64) as usize;
            offset -= skip as u64;
            chunk = &chunk[skip..];
        }
        if !chunk.is_empty() {
            data.write_all(chunk).await?;
        }
    }
}
