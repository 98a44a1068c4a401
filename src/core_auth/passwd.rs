use super::Authorizer;
use async_trait::async_trait;
use log::warn;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// One `user:bcrypt-hash` line of a passwd file.
#[derive(Debug, Clone)]
pub struct PasswdEntry {
    username: String,
    hashed_password: String,
}

impl PasswdEntry {
    pub fn from_line(line: &str) -> Option<PasswdEntry> {
        let (username, hashed_password) = line.split_once(':')?;
        if username.is_empty() || hashed_password.is_empty() {
            return None;
        }
        Some(PasswdEntry {
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hashed_password(&self) -> &str {
        &self.hashed_password
    }
}

/// Authorizes against a passwd file of `user:bcrypt-hash` lines, loaded
/// once at startup. Blank lines and `#` comments are skipped.
pub struct PasswdFileAuthorizer {
    entries: HashMap<String, String>,
}

impl PasswdFileAuthorizer {
    pub fn load(path: impl AsRef<Path>) -> io::Result<PasswdFileAuthorizer> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut entries = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match PasswdEntry::from_line(line) {
                Some(entry) => {
                    entries.insert(
                        entry.username().to_string(),
                        entry.hashed_password().to_string(),
                    );
                }
                None => warn!("skipping malformed passwd line in {}", path.display()),
            }
        }
        Ok(PasswdFileAuthorizer { entries })
    }
}

#[async_trait]
impl Authorizer for PasswdFileAuthorizer {
    async fn authorize(&self, user: &str, pass: &str) -> io::Result<bool> {
        let Some(hash) = self.entries.get(user) else {
            return Ok(false);
        };
        bcrypt::verify(pass, hash).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_line_parses_the_colon_format() {
        let entry = PasswdEntry::from_line("alice:$2b$10$abcdef").unwrap();
        assert_eq!(entry.username(), "alice");
        assert_eq!(entry.hashed_password(), "$2b$10$abcdef");
        assert!(PasswdEntry::from_line("no-colon-here").is_none());
        assert!(PasswdEntry::from_line(":empty-user").is_none());
    }

    #[tokio::test]
    async fn verifies_a_real_bcrypt_hash() {
        // "bar" hashed with a minimal cost so the test stays fast.
        let hash = bcrypt::hash("bar", 4).unwrap();
        let mut entries = HashMap::new();
        entries.insert("foo".to_string(), hash);
        let auth = PasswdFileAuthorizer { entries };

        assert!(auth.authorize("foo", "bar").await.unwrap());
        assert!(!auth.authorize("foo", "baz").await.unwrap());
        assert!(!auth.authorize("nobody", "bar").await.unwrap());
    }
}
