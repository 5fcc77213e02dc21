use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "treenav")]
#[command(about = "A TUI file-tree navigator for a remote workspace file service")]
pub struct Cli {
    /// Base URL of the workspace file service
    #[arg(short, long, default_value = "http://127.0.0.1:7070")]
    pub server: String,

    /// Request timeout for remote calls, in seconds
    #[arg(long, default_value = "10")]
    pub timeout: u64,

    /// Session state file (defaults to the user config directory)
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Start fresh instead of restoring the previous session
    #[arg(long)]
    pub no_restore: bool,

    /// Where exported archives are saved (defaults to the user download
    /// directory)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
}
