//! The command dispatcher: maps each verb to its handler, enforces the
//! ordering contracts (RNFR before RNTO, a data channel before transfers,
//! the EPSV ALL latch) and translates filesystem errors into reply codes.

mod cwd;
mod dele;
mod list;
mod mdtm;
mod mkd;
mod pasv;
mod port;
mod rest;
mod retr;
mod rnfr;
mod rnto;
mod size;
mod stor;
mod type_;

use crate::core_auth::{handle_auth, AuthOutcome, Authorizer};
use crate::core_codec::Command;
use crate::core_fs::FileSystem;
use crate::core_server::Handler;
use crate::core_session::Session;
use crate::error::FtpError;
use async_trait::async_trait;
use std::sync::Arc;

/// Serves a `FileSystem` over a session. Login runs first: with no
/// authorizer configured only anonymous logins are accepted.
pub struct FileHandler {
    pub file_system: Arc<dyn FileSystem>,
    pub authorizer: Option<Arc<dyn Authorizer>>,
}

impl FileHandler {
    pub fn new(file_system: Arc<dyn FileSystem>) -> FileHandler {
        FileHandler {
            file_system,
            authorizer: None,
        }
    }

    async fn dispatch(&self, s: &mut Session, cmd: &Command) -> Result<(), FtpError> {
        let fs = self.file_system.as_ref();
        match cmd.verb.as_str() {
            "USER" => s.reply(530, "Cannot change user.").await,
            "PASS" => s.reply(230, "Already logged in.").await,
            "SYST" => s.reply(215, "UNIX Type: L8").await,
            "TYPE" => type_::handle_type_command(s, cmd).await,
            "MODE" => type_::handle_mode_command(s, cmd).await,
            "PWD" => {
                let path = s.path("");
                s.reply(200, &path).await
            }
            "CWD" => cwd::handle_cwd_command(s, fs, cmd).await,
            "CDUP" => cwd::handle_cdup_command(s, fs).await,
            "MKD" => mkd::handle_mkd_command(s, fs, cmd).await,
            "SIZE" => size::handle_size_command(s, fs, cmd).await,
            "MDTM" => mdtm::handle_mdtm_command(s, fs, cmd).await,
            "DELE" | "RMD" => dele::handle_dele_command(s, fs, cmd).await,
            "RNFR" => rnfr::handle_rnfr_command(s, cmd).await,
            "RNTO" => rnto::handle_rnto_command(s, fs, cmd).await,
            "PASV" => pasv::handle_pasv_command(s).await,
            "EPSV" => pasv::handle_epsv_command(s, cmd).await,
            "PORT" => port::handle_port_command(s, cmd).await,
            "EPRT" => port::handle_eprt_command(s, cmd).await,
            "REST" => rest::handle_rest_command(s, cmd).await,
            "LIST" | "NLST" => list::handle_list_command(s, fs, cmd).await,
            "RETR" => retr::handle_retr_command(s, fs, cmd).await,
            "STOR" => stor::handle_stor_command(s, fs, cmd).await,
            "NOOP" => s.reply(200, "OK.").await,
            "QUIT" => {
                let goodbye = s.goodbye().to_string();
                s.reply(211, &goodbye).await
            }
            _ => s.reply(502, "Not implemented.").await,
        }
    }
}

#[async_trait]
impl Handler for FileHandler {
    async fn handle(&self, session: &mut Session) -> Result<(), FtpError> {
        match handle_auth(session, self.authorizer.as_deref()).await? {
            AuthOutcome::Quit => return Ok(()),
            AuthOutcome::LoggedIn => {}
        }
        loop {
            let cmd = session.command().await?;
            self.dispatch(session, &cmd).await?;
            // The rename source and restart offset only survive into the
            // immediately following command.
            if cmd.verb != "RNFR" {
                session.clear_rename_source();
            }
            if cmd.verb != "REST" {
                session.clear_restart_offset();
            }
            if cmd.verb == "QUIT" {
                return Ok(());
            }
        }
    }
}
