//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Store files as chunked messages in a channel", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a file
    Put {
        /// File on disk
        file: PathBuf,
        /// Name to store the object under (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        /// Folder path the object belongs to
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Download an object by id or name
    Get {
        object: String,
        /// Output file (defaults to the stored name in the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Delete an object by id or name
    Rm { object: String },
    /// List stored objects
    Ls,
    /// Check the channel credentials
    Check,
}
