use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::worklog::DEFAULT_LOG_FILE;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the word recorder, optionally opening FILE
    Words {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Append a word to a word list file
    WordAdd {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "WORD")]
        word: String,
        #[arg(value_name = "DEFINITION", default_value = "")]
        definition: String,
    },
    /// Print every entry of a word list
    WordList {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print one random entry of a word list
    WordRandom {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Launch the work-log form
    Log {
        #[arg(short = 'f', long = "file", default_value = DEFAULT_LOG_FILE)]
        file: PathBuf,
    },
    /// Append a work-log entry
    LogAdd {
        #[arg(short = 'f', long = "file", default_value = DEFAULT_LOG_FILE)]
        file: PathBuf,
        /// Start date, YYYY/M/D or YYYY-MM-DD
        #[arg(short = 's', long = "start")]
        start: String,
        /// End date, YYYY/M/D or YYYY-MM-DD
        #[arg(short = 'e', long = "end")]
        end: String,
        #[arg(short = 't', long = "task")]
        task: String,
        #[arg(short = 'n', long = "notes", default_value = "")]
        notes: String,
    },
    /// Print the work-log table
    LogList {
        #[arg(short = 'f', long = "file", default_value = DEFAULT_LOG_FILE)]
        file: PathBuf,
    },
    /// Set a preference value
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Get a preference value
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// List all stored preferences
    ConfigList,
    /// Delete a stored preference
    ConfigDelete {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

impl Cli {
    /// Whether this invocation should install the file logger. Read-only
    /// and informational commands leave the state directory alone.
    pub fn wants_logging(&self) -> bool {
        !matches!(
            self.command,
            Some(Commands::Completions { .. })
                | Some(Commands::WordList { .. })
                | Some(Commands::WordRandom { .. })
                | Some(Commands::LogList { .. })
                | Some(Commands::Get { .. })
                | Some(Commands::ConfigList)
        )
    }
}
