use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "ferroftpd", about = "An FTP server written in Rust.")]
pub struct Cli {
    /// Address to bind the control channel
    pub addr: Option<String>,

    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Host to bind and advertise for passive data channels
    #[arg(long)]
    pub host: Option<String>,

    /// Directory to serve
    #[arg(short, long)]
    pub root: Option<String>,

    /// Path to a user:bcrypt-hash passwd file
    #[arg(long)]
    pub passwd: Option<String>,

    /// Accept anonymous logins only
    #[arg(long)]
    pub anonymous: bool,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}
