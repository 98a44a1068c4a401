use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use ferroftp::core_cli::Cli;
use ferroftp::{
    auth_any, load_config, Authorizer, Config, FileHandler, LocalFileSystem,
    PasswdFileAuthorizer, Server,
};
use log::info;
use std::io::Write;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    // Load configuration from the TOML file; CLI arguments win.
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    let addr = args
        .addr
        .or(config.server.listen_addr)
        .unwrap_or_default();
    let root = args
        .root
        .or(config.server.root_dir)
        .unwrap_or_else(|| ".".to_string());
    let pasv_host = match args.host.or(config.server.pasv_host) {
        Some(host) => Some(
            host.parse()
                .with_context(|| format!("Invalid passive host: {}", host))?,
        ),
        None => None,
    };

    let anonymous = args.anonymous || config.server.anonymous_only;
    let passwd = args.passwd.or(config.server.passwd_file);
    let authorizer: Option<Arc<dyn Authorizer>> = if let Some(path) = passwd {
        let auth = PasswdFileAuthorizer::load(&path)
            .with_context(|| format!("Failed to load passwd file: {}", path))?;
        Some(Arc::new(auth))
    } else if anonymous {
        None
    } else {
        Some(Arc::new(auth_any()))
    };

    let mut handler = FileHandler::new(Arc::new(LocalFileSystem::new(root)));
    handler.authorizer = authorizer;

    let mut server = Server::new(Arc::new(handler));
    server.addr = addr;
    server.host = pasv_host;
    if let Some(greeting) = config.server.greeting {
        server.greeting = greeting;
    }
    if let Some(goodbye) = config.server.goodbye {
        server.goodbye = goodbye;
    }

    info!("starting ferroftpd");
    server.listen_and_serve().await.context("server terminated")?;
    Ok(())
}
