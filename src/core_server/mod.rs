//! The accept loop: one spawned task per control connection, each owning a
//! session for the lifetime of the connection.

use crate::constants::{DEFAULT_ADDR, DEFAULT_GOODBYE, DEFAULT_GREETING};
use crate::core_session::Session;
use crate::error::FtpError;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Handles one control-channel session. Sending the greeting and replying
/// to a QUIT are optional; the server closes the session on return.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, session: &mut Session) -> Result<(), FtpError>;
}

/// An FTP server.
pub struct Server {
    /// Control-channel bind address; `0.0.0.0:21` if empty.
    pub addr: String,
    /// Host to bind (and advertise) for passive data channels. Defaults to
    /// the host the control connection arrived on.
    pub host: Option<IpAddr>,
    /// Greeting sent with the 220 on a new connection.
    pub greeting: String,
    /// Goodbye used for QUIT and teardown replies.
    pub goodbye: String,
    /// Handler invoked for every session.
    pub handler: Arc<dyn Handler>,
}

impl Server {
    pub fn new(handler: Arc<dyn Handler>) -> Server {
        Server {
            addr: String::new(),
            host: None,
            greeting: DEFAULT_GREETING.to_string(),
            goodbye: DEFAULT_GOODBYE.to_string(),
            handler,
        }
    }

    /// Bind the configured address and serve until the listener fails.
    pub async fn listen_and_serve(&self) -> Result<(), FtpError> {
        let addr = if self.addr.is_empty() {
            DEFAULT_ADDR
        } else {
            &self.addr
        };
        let listener = TcpListener::bind(addr).await?;
        info!("listening on {}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Accept control connections forever. Each connection is served by its
    /// own task; the session is closed unconditionally when the handler
    /// returns. An accept error ends the loop and is returned.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), FtpError> {
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!("control connection from {}", peer);
            let handler = Arc::clone(&self.handler);
            let greeting = self.greeting.clone();
            let goodbye = self.goodbye.clone();
            let host = self.host;
            tokio::spawn(async move {
                let mut session = match Session::new(stream, greeting, goodbye, host) {
                    Ok(session) => session,
                    Err(e) => {
                        warn!("dropping connection from {}: {}", peer, e);
                        return;
                    }
                };
                if let Err(e) = handler.handle(&mut session).await {
                    debug!("session {} ended: {}", peer, e);
                }
                let _ = session.close().await;
                debug!("connection closed for {}", peer);
            });
        }
    }
}
