use super::read_wire_line;
use crate::error::FtpError;
use std::fmt;
use tokio::io::AsyncBufRead;

/// A reply read from or written to a control channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub msg: String,
}

impl Reply {
    pub fn new(code: u16, msg: impl Into<String>) -> Reply {
        Reply {
            code,
            msg: msg.into(),
        }
    }

    /// 1xx: action started, final status to follow.
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// 2xx: the requested action completed.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// 3xx: more input is expected before the action can complete.
    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    /// 4xx: the action failed but may be retried.
    pub fn is_transient(&self) -> bool {
        (400..500).contains(&self.code)
    }

    /// 5xx: the action failed permanently.
    pub fn is_permanent(&self) -> bool {
        (500..600).contains(&self.code)
    }

    /// Encode as one or more CRLF-terminated wire lines. A multi-line
    /// message brackets its body between a `ddd-` first line and a final
    /// `ddd ` line.
    pub fn encode(&self) -> String {
        let msg = self.msg.replace("\r\n", "\n");
        let lines: Vec<&str> = msg.split('\n').collect();
        let mut out = String::new();
        let last = lines.len() - 1;
        for line in &lines[..last] {
            out.push_str(&format!("{:03}-{}\r\n", self.code, line));
        }
        out.push_str(&format!("{:03} {}\r\n", self.code, lines[last]));
        out
    }

    /// Read one (possibly multi-line) reply. Both the bracketed form and
    /// bare continuation lines are accepted; bodies are joined with `\n`.
    pub async fn decode<R>(r: &mut R) -> Result<Reply, FtpError>
    where
        R: AsyncBufRead + Unpin,
    {
        let line = read_wire_line(r).await?;
        let bytes = line.as_bytes();
        if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
            return Err(FtpError::InvalidSyntax);
        }
        let code: u16 = line[..3].parse().map_err(|_| FtpError::InvalidSyntax)?;
        let sep = bytes.get(3).copied().unwrap_or(b' ');
        if sep != b' ' && sep != b'-' {
            return Err(FtpError::InvalidSyntax);
        }
        let mut msg = if line.len() > 4 {
            line[4..].to_string()
        } else {
            String::new()
        };
        if sep == b'-' {
            let prefix = &line[..3];
            loop {
                let line = read_wire_line(r).await?;
                msg.push('\n');
                if line.len() >= 4 && line.starts_with(prefix) {
                    let sep = line.as_bytes()[3];
                    if sep == b' ' {
                        msg.push_str(&line[4..]);
                        break;
                    }
                    if sep == b'-' {
                        msg.push_str(&line[4..]);
                        continue;
                    }
                }
                msg.push_str(&line);
            }
        }
        Ok(Reply { code, msg })
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_single_line() {
        assert_eq!(Reply::new(220, "Welcome.").encode(), "220 Welcome.\r\n");
        assert_eq!(Reply::new(200, "").encode(), "200 \r\n");
    }

    #[test]
    fn encode_multi_line() {
        let reply = Reply::new(214, "first\nsecond\r\nlast");
        assert_eq!(reply.encode(), "214-first\r\n214-second\r\n214 last\r\n");
    }

    #[tokio::test]
    async fn decode_single_line() {
        let mut wire = &b"230 Login successful.\r\n"[..];
        let reply = Reply::decode(&mut wire).await.unwrap();
        assert_eq!(reply, Reply::new(230, "Login successful."));
        assert!(reply.is_success());
    }

    #[tokio::test]
    async fn decode_multi_line() {
        let mut wire = &b"214-first\r\nbare continuation\r\n214 last\r\n"[..];
        let reply = Reply::decode(&mut wire).await.unwrap();
        assert_eq!(reply.code, 214);
        assert_eq!(reply.msg, "first\nbare continuation\nlast");
    }

    #[tokio::test]
    async fn decode_rejects_garbage() {
        let mut wire = &b"hi\r\n"[..];
        assert!(matches!(
            Reply::decode(&mut wire).await,
            Err(FtpError::InvalidSyntax)
        ));
        let mut wire = &b"2x0 nope\r\n"[..];
        assert!(matches!(
            Reply::decode(&mut wire).await,
            Err(FtpError::InvalidSyntax)
        ));
    }

    #[test]
    fn classification_boundaries() {
        assert!(Reply::new(150, "").is_preliminary());
        assert!(Reply::new(331, "").is_intermediate());
        assert!(Reply::new(425, "").is_transient());
        assert!(Reply::new(550, "").is_permanent());
        assert!(!Reply::new(199, "").is_success());
    }
}
