use crate::core_codec::Reply;
use std::io;
use thiserror::Error;

/// Errors produced by the protocol engine, the data channel and the client.
///
/// Filesystem failures travel as [`io::Error`] and are classified by kind;
/// they are mapped to reply codes at the dispatcher and never shown to the
/// remote side verbatim.
#[derive(Debug, Error)]
pub enum FtpError {
    #[error("got empty command")]
    EmptyCommand,

    #[error("invalid syntax")]
    InvalidSyntax,

    #[error("session is closed")]
    SessionClosed,

    #[error("no command to reply to")]
    NoPendingCommand,

    #[error("no data channel connection")]
    NoDataConnection,

    #[error("transfer failed")]
    TransferFailed,

    #[error("unsupported protocol")]
    UnsupportedProtocol,

    #[error("{0}")]
    Unsupported(&'static str),

    /// The remote side answered an exchange with a non-success final reply.
    #[error("server replied {} {}", .0.code, .0.msg)]
    Rejected(Reply),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub(crate) fn is_not_exist(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

pub(crate) fn is_permission(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

pub(crate) fn is_exist(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::AlreadyExists
}
