//! fsgate
//!
//! Sandboxed file operations confined to a base directory.

use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cli::commands::{Operation, Output, ParseError};
use cli::config::Config;
use cli::history::{History, HistoryError};
use cli::logging;
use gateway::{FileManager, FileManagerImpl};

/// fsgate - file operations confined to a base directory.
#[derive(Parser, Debug)]
#[command(name = "fsgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base directory all operations are confined to
    #[arg(short, long, global = true, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print a file
    Read {
        /// File to read
        path: String,
    },

    /// Write a file, creating parent directories as needed
    Write {
        /// File to write
        path: String,

        /// Content to write (read from stdin when omitted)
        content: Option<String>,
    },

    /// List a directory
    List {
        /// Directory to list
        #[arg(default_value = ".")]
        path: String,

        /// Include every descendant, not just immediate children
        #[arg(long, short)]
        recursive: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Check whether a path exists
    Exists {
        /// Path to check
        path: String,
    },

    /// Create a directory and any missing parents
    Mkdir {
        /// Directory to create
        path: String,
    },

    /// Delete a file or directory tree
    Delete {
        /// Path to delete
        path: String,
    },

    /// Show file metadata
    Stat {
        /// Path to inspect
        path: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Inspect or clear the command history
    #[command(subcommand)]
    History(HistoryCommands),

    /// Read commands from stdin, one per line
    Shell,
}

/// Subcommands for history management.
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommands {
    /// List recorded commands, oldest first
    List,

    /// Show the most recent command
    Last,

    /// Remove all recorded commands
    Clear,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Apply environment variable overrides, then command-line flags
    config.apply_env_overrides();
    if let Some(base_dir) = &cli.base_dir {
        config.gateway.base_dir = base_dir.clone();
    }

    config.validate()?;

    let _log_guard = logging::init(&config.logging, cli.verbose)?;
    tracing::debug!("Using base directory {:?}", config.gateway.base_dir);

    let manager = FileManagerImpl::new(&config.gateway.base_dir);
    let history = if config.history.enabled {
        Some(History::open(&config.history.path, config.history.max_entries)?)
    } else {
        None
    };

    let (operation, json) = match cli.command {
        Commands::History(cmd) => return run_history(cmd, history.as_ref()),
        Commands::Shell => return run_shell(&manager, history.as_ref()),
        Commands::Read { path } => (Operation::Read { path }, false),
        Commands::Write { path, content } => {
            let content = match content {
                Some(content) => content,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            (Operation::Write { path, content }, false)
        }
        Commands::List {
            path,
            recursive,
            json,
        } => (Operation::List { path, recursive }, json),
        Commands::Exists { path } => (Operation::Exists { path }, false),
        Commands::Mkdir { path } => (Operation::Mkdir { path }, false),
        Commands::Delete { path } => (Operation::Delete { path }, false),
        Commands::Stat { path, json } => (Operation::Stat { path }, json),
    };

    record(history.as_ref(), &operation);
    Ok(if execute(&manager, &operation, json, false) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Execute one operation and print its result. Returns whether it succeeded.
///
/// File content from `read` is printed byte for byte. In the shell a newline
/// is added when the content lacks one so the next prompt starts on its own
/// line.
fn execute(
    manager: &dyn FileManager,
    operation: &Operation,
    json: bool,
    interactive: bool,
) -> bool {
    if operation.is_mutating() {
        tracing::info!("{}", operation.history_entry());
    }

    match operation.execute(manager) {
        Ok(Output::Text(text)) if !json => {
            let mut stdout = io::stdout().lock();
            let printed = if interactive && !text.is_empty() && !text.ends_with('\n') {
                writeln!(stdout, "{}", text)
            } else {
                write!(stdout, "{}", text)
            };
            if let Err(e) = printed.and_then(|()| stdout.flush()) {
                tracing::warn!("Failed to write output: {}", e);
                return false;
            }
            true
        }
        Ok(output) => {
            let rendered = output.render(json);
            if !rendered.is_empty() {
                println!("{}", rendered);
            }
            true
        }
        Err(e) => {
            tracing::debug!("{} failed: {:?}", operation.history_entry(), e);
            eprintln!("error: {}", e);
            false
        }
    }
}

/// Record an operation in history. Failures are logged, never fatal.
fn record(history: Option<&History>, operation: &Operation) {
    let Some(history) = history else {
        return;
    };

    match history.add(&operation.history_entry()) {
        Ok(()) => {}
        Err(HistoryError::ConsecutiveDuplicate) => {}
        Err(e) => tracing::warn!("Command not recorded in history: {}", e),
    }
}

fn run_history(cmd: HistoryCommands, history: Option<&History>) -> anyhow::Result<ExitCode> {
    let Some(history) = history else {
        eprintln!("History is disabled in the configuration.");
        return Ok(ExitCode::FAILURE);
    };

    match cmd {
        HistoryCommands::List => {
            for (i, entry) in history.list().iter().enumerate() {
                println!("{:>5}  {}", i + 1, entry);
            }
        }
        HistoryCommands::Last => match history.last() {
            Some(entry) => println!("{}", entry),
            None => println!("No commands recorded."),
        },
        HistoryCommands::Clear => {
            history.clear()?;
            println!("History cleared ({})", history.path().display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_shell(manager: &dyn FileManager, history: Option<&History>) -> anyhow::Result<ExitCode> {
    tracing::info!("Shell confined to {:?}", manager.base_dir());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut failures = 0usize;

    loop {
        write!(stdout, "fsgate> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "exit" | "quit" => break,
            "history" => {
                if let Some(history) = history {
                    for entry in history.list() {
                        println!("{}", entry);
                    }
                }
                continue;
            }
            _ => {}
        }

        match Operation::parse(&line) {
            Ok(operation) => {
                record(history, &operation);
                if !execute(manager, &operation, false, true) {
                    failures += 1;
                }
            }
            Err(ParseError::Empty) => {}
            Err(e) => {
                eprintln!("error: {}", e);
                failures += 1;
            }
        }
    }

    tracing::debug!("Shell exited with {} failed commands", failures);
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
