use crate::core_codec::Command;
use crate::core_fs::{list_line, FileSystem};
use crate::core_session::Session;
use crate::error::{is_not_exist, is_permission, FtpError};
use log::info;

/// Handles the LIST and NLST FTP commands.
///
/// The listing streams over the data channel: one name per line for NLST, a
/// `total N` header followed by ls-style long lines for LIST. A data channel
/// must have been established by a prior PORT or PASV exchange.
pub(crate) async fn handle_list_command(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
) -> Result<(), FtpError> {
    let nlst = cmd.verb == "NLST";
    match send_listing(s, fs, cmd, nlst).await {
        Ok(()) => s.reply(226, "Directory send OK.").await,
        Err(FtpError::NoDataConnection) => s.reply(425, "Use PORT or PASV first.").await,
        Err(FtpError::Io(e)) if is_permission(&e) => s.reply(550, "Insufficient permissions.").await,
        Err(FtpError::Io(e)) if is_not_exist(&e) => s.reply(550, "No such directory.").await,
        Err(FtpError::Io(_)) => s.reply(550, "Error listing directory.").await,
        Err(e) => Err(e),
    }
}

async fn send_listing(
    s: &mut Session,
    fs: &dyn FileSystem,
    cmd: &Command,
    nlst: bool,
) -> Result<(), FtpError> {
    let Some(mut data) = s.take_data() else {
        return Err(FtpError::NoDataConnection);
    };
    let path = s.path(&strip_list_flags(&cmd.msg));
    let mut file = match fs.open(&path).await {
        Ok(file) => file,
        Err(e) => {
            let _ = data.close().await;
            return Err(e.into());
        }
    };
    if let Err(e) = s.reply(150, "Here comes the list.").await {
        let _ = file.close().await;
        let _ = data.close().await;
        return Err(e);
    }
    let result = async {
        let entries = file.readdir().await?;
        let mut out = String::new();
        if !nlst {
            out.push_str(&format!("total {}\n", entries.len()));
        }
        for fi in &entries {
            if nlst {
                out.push_str(&fi.name);
            } else {
                out.push_str(&list_line(fi));
            }
            out.push('\n');
        }
        data.write_all(out.as_bytes()).await?;
        Ok::<(), FtpError>(())
    }
    .await;
    let _ = file.close().await;
    if let Err(e) = result {
        let _ = data.close().await;
        return Err(e);
    }
    data.close().await?;
    info!("{} listed {}", s.peer(), path);
    Ok(())
}

/// Some clients assume LIST accepts flags like ls does. Drop them, but only
/// when the first non-space character is a dash.
fn strip_list_flags(s: &str) -> String {
    for c in s.chars() {
        if c == '-' {
            break;
        } else if c != ' ' {
            return s.to_string();
        }
    }
    s.split(' ')
        .filter(|token| !token.starts_with('-'))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_stripped() {
        assert_eq!(strip_list_flags("-la /tmp"), "/tmp");
        assert_eq!(strip_list_flags(" -a"), "");
        assert_eq!(strip_list_flags(""), "");
    }

    #[test]
    fn real_names_survive() {
        assert_eq!(strip_list_flags("/tmp -x"), "/tmp -x");
        assert_eq!(strip_list_flags("weird -name"), "weird -name");
    }
}
