use super::Client;
use crate::core_channel::DataChannel;
use crate::error::FtpError;
use std::io::SeekFrom;

/// A lazy handle to a remote file or directory. No command is issued until
/// the first read, write or readdir; finishing a transfer closes the data
/// channel and checks the terminal reply.
pub struct RemoteFile<'c> {
    client: &'c mut Client,
    path: String,
    chan: Option<DataChannel>,
    offset: u64,
    done: bool,
    closed: bool,
}

impl<'c> RemoteFile<'c> {
    pub(crate) fn new(client: &'c mut Client, path: String) -> RemoteFile<'c> {
        RemoteFile {
            client,
            path,
            chan: None,
            offset: 0,
            done: false,
            closed: false,
        }
    }

    /// Set the start offset of a subsequent read. Only start-relative seeks
    /// before the transfer begins are supported.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, FtpError> {
        let SeekFrom::Start(offset) = pos else {
            return Err(FtpError::Unsupported("cannot seek"));
        };
        if self.chan.is_some() {
            return Err(FtpError::Unsupported("cannot seek"));
        }
        self.offset = offset;
        Ok(offset)
    }

    /// Read from the remote file, issuing the RETR (preceded by a REST when
    /// an offset was set) on first use. Returns 0 at end of transfer.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, FtpError> {
        if self.done {
            return Ok(0);
        }
        self.start("RETR", true).await?;
        let Some(chan) = self.chan.as_mut() else {
            return Err(FtpError::NoDataConnection);
        };
        let n = chan.read(buf).await?;
        if n == 0 {
            self.finish().await?;
        }
        Ok(n)
    }

    /// Read the remainder of the remote file into `buf`.
    pub async fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize, FtpError> {
        let mut total = 0;
        let mut chunk = [0u8; 8 * 1024];
        loop {
            let n = self.read(&mut chunk).await?;
            if n == 0 {
                return Ok(total);
            }
            buf.extend_from_slice(&chunk[..n]);
            total += n;
        }
    }

    /// Write to the remote file, issuing the STOR on first use. A recorded
    /// seek offset never applies to a store.
    pub async fn write_all(&mut self, buf: &[u8]) -> Result<(), FtpError> {
        self.start("STOR", false).await?;
        let Some(chan) = self.chan.as_mut() else {
            return Err(FtpError::NoDataConnection);
        };
        chan.write_all(buf).await?;
        Ok(())
    }

    /// List the names in a remote directory through an NLST exchange.
    pub async fn readdir(&mut self) -> Result<Vec<String>, FtpError> {
        self.start("NLST", false).await?;
        let mut names = Vec::new();
        loop {
            let Some(chan) = self.chan.as_mut() else {
                return Err(FtpError::NoDataConnection);
            };
            match chan.read_line().await? {
                Some(line) if !line.is_empty() => names.push(line),
                Some(_) => {}
                None => break,
            }
        }
        self.finish().await?;
        Ok(names)
    }

    /// Establish the data channel and issue the transfer command. The
    /// preliminary reply is left for [`RemoteFile::finish`] to consume.
    async fn start(&mut self, verb: &str, seekable: bool) -> Result<(), FtpError> {
        if self.closed {
            return Err(FtpError::SessionClosed);
        }
        if self.chan.is_some() {
            return Ok(());
        }
        let mut chan = self.client.data().await?;
        if seekable && self.offset != 0 {
            let reply = match self
                .client
                .exchange("REST", &self.offset.to_string())
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    let _ = chan.close().await;
                    return Err(e);
                }
            };
            if !reply.is_intermediate() && !reply.is_success() {
                let _ = chan.close().await;
                return Err(FtpError::Rejected(reply));
            }
        }
        self.chan = Some(chan);
        self.client.command(verb, &self.path).await
    }

    /// Close the data channel, then read control replies until the terminal
    /// one; anything non-preliminary and non-success fails the transfer.
    async fn finish(&mut self) -> Result<(), FtpError> {
        let Some(mut chan) = self.chan.take() else {
            return Ok(());
        };
        self.done = true;
        chan.close().await?;
        loop {
            let reply = self.client.read_reply().await?;
            if reply.is_success() {
                return Ok(());
            }
            if !reply.is_preliminary() {
                return Err(FtpError::TransferFailed);
            }
        }
    }

    /// Close the handle, completing any transfer in progress. A second
    /// close is an error.
    pub async fn close(&mut self) -> Result<(), FtpError> {
        if self.closed {
            return Err(FtpError::SessionClosed);
        }
        self.closed = true;
        if self.chan.is_none() {
            return Ok(());
        }
        self.finish().await
    }
}
