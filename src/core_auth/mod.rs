//! Login: the USER/PASS sub-protocol and the authorizer strategies it
//! delegates to.

mod passwd;

pub use passwd::{PasswdEntry, PasswdFileAuthorizer};

use crate::core_server::Handler;
use crate::core_session::Session;
use crate::error::FtpError;
use async_trait::async_trait;
use log::{info, warn};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

/// Authorizes a login. Returning an error closes the session.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, user: &str, pass: &str) -> io::Result<bool>;
}

/// Authorizes users from a static map of user names to passwords.
pub struct MapAuthorizer(pub HashMap<String, String>);

#[async_trait]
impl Authorizer for MapAuthorizer {
    async fn authorize(&self, user: &str, pass: &str) -> io::Result<bool> {
        Ok(self.0.get(user).is_some_and(|expect| pass == expect))
    }
}

/// An authorizer backed by a plain function.
pub struct AuthFn<F>(pub F);

#[async_trait]
impl<F> Authorizer for AuthFn<F>
where
    F: Fn(&str, &str) -> io::Result<bool> + Send + Sync,
{
    async fn authorize(&self, user: &str, pass: &str) -> io::Result<bool> {
        (self.0)(user, pass)
    }
}

/// An authorizer that accepts any user name and password.
pub fn auth_any() -> impl Authorizer {
    AuthFn(|_: &str, _: &str| Ok(true))
}

/// An authorizer that only accepts anonymous logins.
pub fn auth_anonymous_only() -> impl Authorizer {
    AuthFn(|user: &str, _: &str| Ok(user == "anonymous"))
}

/// How the login sub-protocol ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    LoggedIn,
    Quit,
}

/// A handler that only performs login. With no authorizer configured, only
/// anonymous logins are accepted.
pub struct AuthHandler {
    pub authorizer: Option<Arc<dyn Authorizer>>,
}

#[async_trait]
impl Handler for AuthHandler {
    async fn handle(&self, session: &mut Session) -> Result<(), FtpError> {
        handle_auth(session, self.authorizer.as_deref()).await?;
        Ok(())
    }
}

/// Drive the USER/PASS sub-protocol until a login succeeds or the client
/// quits. The user name and password are recorded into the session; login
/// is complete if and only if a PASS was accepted with the user still set.
pub async fn handle_auth(
    session: &mut Session,
    authorizer: Option<&dyn Authorizer>,
) -> Result<AuthOutcome, FtpError> {
    loop {
        let cmd = session.command().await?;
        match cmd.verb.as_str() {
            "USER" => {
                if cmd.msg.is_empty() {
                    session.reply(504, "A user name is required.").await?;
                } else if authorizer.is_none() && cmd.msg != "anonymous" {
                    session.reply(331, "This server is anonymous only.").await?;
                } else {
                    session.user = cmd.msg.clone();
                    session.reply(331, "Please specify the password.").await?;
                }
            }
            "PASS" => {
                if session.user.is_empty() {
                    session.reply(503, "Log in with USER first.").await?;
                    continue;
                }
                let ok = match authorizer {
                    Some(a) => a.authorize(&session.user, &cmd.msg).await?,
                    None => session.user == "anonymous",
                };
                if ok {
                    session.password = cmd.msg.clone();
                    info!("user {} logged in from {}", session.user, session.peer());
                    session.reply(230, "Login successful.").await?;
                    return Ok(AuthOutcome::LoggedIn);
                }
                warn!(
                    "failed login for user {} from {}",
                    session.user,
                    session.peer()
                );
                session.user.clear();
                session.reply(430, "Invalid user name or password.").await?;
            }
            "QUIT" => {
                let goodbye = session.goodbye().to_string();
                session.reply(211, &goodbye).await?;
                return Ok(AuthOutcome::Quit);
            }
            _ => {
                session.reply(530, "Log in with USER and PASS.").await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn map_authorizer_checks_credentials() {
        let auth = MapAuthorizer(HashMap::from([("foo".to_string(), "bar".to_string())]));
        assert!(auth.authorize("foo", "bar").await.unwrap());
        assert!(!auth.authorize("foo", "nope").await.unwrap());
        assert!(!auth.authorize("unknown", "bar").await.unwrap());
    }

    #[tokio::test]
    async fn fn_authorizers() {
        assert!(auth_any().authorize("any", "thing").await.unwrap());
        assert!(auth_anonymous_only()
            .authorize("anonymous", "x")
            .await
            .unwrap());
        assert!(!auth_anonymous_only().authorize("root", "x").await.unwrap());
    }
}
