//! ferroftp is an FTP server and client library.
//!
//! The server multiplexes concurrent control-channel sessions, each driving
//! a pluggable [`FileSystem`] through the classic RFC 959 command set plus
//! the RFC 2428 extended addressing forms. The [`Client`] mirrors it with
//! lazy, file-like remote handles.
//!
//! ```no_run
//! use ferroftp::{auth_any, FileHandler, LocalFileSystem, Server};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), ferroftp::FtpError> {
//! let mut handler = FileHandler::new(Arc::new(LocalFileSystem::new("/srv/ftp")));
//! handler.authorizer = Some(Arc::new(auth_any()));
//! let mut server = Server::new(Arc::new(handler));
//! server.addr = "0.0.0.0:2121".to_string();
//! server.listen_and_serve().await
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod core_auth;
pub mod core_channel;
pub mod core_cli;
pub mod core_client;
pub mod core_codec;
pub mod core_fs;
pub mod core_ftpcommand;
pub mod core_server;
pub mod core_session;
pub mod error;

pub use config::{load_config, Config};
pub use core_auth::{
    auth_any, auth_anonymous_only, AuthFn, AuthHandler, Authorizer, MapAuthorizer,
    PasswdFileAuthorizer,
};
pub use core_channel::{DataChannel, TransferType};
pub use core_client::{Client, RemoteFile};
pub use core_codec::{Command, Reply};
pub use core_fs::{clean, File, FileInfo, FileSystem, LocalFileSystem};
pub use core_ftpcommand::FileHandler;
pub use core_server::{Handler, Server};
pub use core_session::Session;
pub use error::FtpError;
