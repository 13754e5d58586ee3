use clap::Parser;

/// Stress2Health: a terminal chat client for the wellness assistant.
#[derive(Parser, Debug)]
#[command(name = "s2h", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (e.g. debug, s2h_chat=trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Chat backend base URL override.
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Keep the conversation in memory only; nothing is read from or
    /// written to disk.
    #[arg(long)]
    pub ephemeral: bool,

    /// Email for sign-in when a record store is configured.
    #[arg(long)]
    pub email: Option<String>,

    /// Create an account instead of signing in.
    #[arg(long)]
    pub sign_up: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
