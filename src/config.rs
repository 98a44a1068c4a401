use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Daemon configuration, loaded from a TOML file. Every field is optional;
/// command-line arguments override the file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Control-channel bind address.
    pub listen_addr: Option<String>,
    /// Host to bind and advertise for passive data channels.
    pub pasv_host: Option<String>,
    /// Directory served to clients.
    pub root_dir: Option<String>,
    pub greeting: Option<String>,
    pub goodbye: Option<String>,
    /// Path to a `user:bcrypt-hash` passwd file.
    pub passwd_file: Option<String>,
    /// Accept anonymous logins only.
    pub anonymous_only: bool,
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path))?;
    let config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse configuration file: {}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_server_table() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen_addr = "0.0.0.0:2121"
            root_dir = "/srv/ftp"
            anonymous_only = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_addr.as_deref(), Some("0.0.0.0:2121"));
        assert_eq!(config.server.root_dir.as_deref(), Some("/srv/ftp"));
        assert!(config.server.anonymous_only);
        assert!(config.server.passwd_file.is_none());
    }

    #[test]
    fn an_empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.server.listen_addr.is_none());
        assert!(!config.server.anonymous_only);
    }
}
