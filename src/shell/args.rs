use std::fmt::Display;
use std::path::PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use crate::domain::DEFAULT_PAGE_SIZE;

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shrinkurl-client", about = "Command-line client for the ShrinkURL API")]
pub struct Args {
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    #[arg(long, default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Where the session tokens are kept between runs
    #[arg(long, default_value = ".shrinkurl-session.json")]
    pub token_file: PathBuf,

    /// Upper bound on a token refresh, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store tokens obtained from the web login
    Login {
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        refresh_token: Option<String>,
    },
    /// Show who the stored access token belongs to
    Whoami,
    /// List your shortened URLs
    List {
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        /// Keep loading until the last page
        #[arg(long)]
        all: bool,
    },
    /// Shorten a URL
    Shorten {
        url: String,
        #[arg(long)]
        custom_code: Option<String>,
    },
    /// Show plan usage
    Usage,
    /// Log out and forget the stored tokens
    Logout,
}
