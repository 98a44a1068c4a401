//! Control-channel wire codec: CRLF-framed commands and replies, plus the
//! PORT/PASV/EPRT/EPSV address encodings.

mod addr;
mod command;
mod reply;

pub use addr::{
    ehost_port, host_port, parse_eprt, parse_epsv, parse_host_port, parse_pasv, parse_port,
};
pub use command::Command;
pub use reply::Reply;

use crate::error::FtpError;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Read one CRLF-terminated line, stripping the terminator. An immediate end
/// of stream is an error: the control channel never ends mid-session.
pub(crate) async fn read_wire_line<R>(r: &mut R) -> Result<String, FtpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = r.read_line(&mut line).await?;
    if n == 0 {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}
