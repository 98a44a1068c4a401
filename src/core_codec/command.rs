use crate::error::FtpError;
use std::fmt;

/// A command read from or written to a control channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// The verb, always uppercase.
    pub verb: String,
    /// The rest of the line, possibly empty.
    pub msg: String,
}

impl Command {
    pub fn new(verb: &str, msg: &str) -> Command {
        Command {
            verb: verb.to_ascii_uppercase(),
            msg: msg.to_string(),
        }
    }

    /// Decode a single control line, already stripped of its CRLF.
    pub fn decode(line: &str) -> Result<Command, FtpError> {
        let mut split = line.splitn(2, ' ');
        let verb = split.next().unwrap_or("");
        if verb.is_empty() {
            return Err(FtpError::EmptyCommand);
        }
        Ok(Command {
            verb: verb.to_ascii_uppercase(),
            msg: split.next().unwrap_or("").to_string(),
        })
    }

    /// Encode as a CRLF-terminated wire line.
    pub fn encode(&self) -> String {
        if self.msg.is_empty() {
            format!("{}\r\n", self.verb)
        } else {
            format!("{} {}\r\n", self.verb, self.msg)
        }
    }

    /// The arguments split into tokens.
    pub fn args(&self) -> Vec<&str> {
        if self.msg.is_empty() {
            return Vec::new();
        }
        self.msg.split(' ').collect()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.msg.is_empty() {
            write!(f, "{}", self.verb)
        } else {
            write!(f, "{} {}", self.verb, self.msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_uppercases_the_verb() {
        let cmd = Command::decode("stor foo bar.txt").unwrap();
        assert_eq!(cmd.verb, "STOR");
        assert_eq!(cmd.msg, "foo bar.txt");
        assert_eq!(cmd.args(), vec!["foo", "bar.txt"]);
    }

    #[test]
    fn decode_without_message() {
        let cmd = Command::decode("PASV").unwrap();
        assert_eq!(cmd.verb, "PASV");
        assert_eq!(cmd.msg, "");
        assert!(cmd.args().is_empty());
    }

    #[test]
    fn decode_rejects_empty_commands() {
        assert!(matches!(Command::decode(""), Err(FtpError::EmptyCommand)));
        assert!(matches!(
            Command::decode(" arg"),
            Err(FtpError::EmptyCommand)
        ));
    }

    #[test]
    fn encode_round_trip() {
        let cmd = Command::new("retr", "a.txt");
        assert_eq!(cmd.encode(), "RETR a.txt\r\n");
        assert_eq!(Command::new("noop", "").encode(), "NOOP\r\n");
    }
}
