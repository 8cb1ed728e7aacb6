//! File operations as commands.
//!
//! An [`Operation`] is one call on a [`FileManager`]. Operations are built
//! from CLI subcommands or parsed from a shell line, executed, and rendered
//! for the terminal. Their [`Display`](std::fmt::Display) form is the shell
//! syntax, which is also what gets recorded in history.

use std::fmt;

use gateway::{FileInfo, FileManager, GatewayError};
use thiserror::Error;

/// Longest write content copied into a history entry.
pub const MAX_RECORDED_CONTENT: usize = 256;

/// Errors produced while parsing a shell line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The line was empty.
    #[error("empty command")]
    Empty,

    /// The command word is not recognised.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A required argument is missing.
    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

/// A single file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Read { path: String },
    Write { path: String, content: String },
    List { path: String, recursive: bool },
    Exists { path: String },
    Mkdir { path: String },
    Delete { path: String },
    Stat { path: String },
}

/// The result of executing an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Names(Vec<String>),
    Bool(bool),
    Info(FileInfo),
    Done,
}

impl Operation {
    /// Parse a shell line such as `write notes.txt hello world`.
    ///
    /// The first word is the command and the second the path. For `write`
    /// the rest of the line, verbatim, is the content. `list` and `ls`
    /// accept `-r` and default to `.`.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim_start()),
            None => (line, ""),
        };

        match command {
            "" => Err(ParseError::Empty),
            "read" | "cat" => Ok(Operation::Read {
                path: required_path("read", rest)?,
            }),
            "write" => {
                let (path, content) = match rest.split_once(char::is_whitespace) {
                    Some((path, content)) => (path, content),
                    None => (rest, ""),
                };
                Ok(Operation::Write {
                    path: required_path("write", path)?,
                    content: content.to_string(),
                })
            }
            "list" | "ls" => {
                let mut recursive = false;
                let mut path = None;
                for word in rest.split_whitespace() {
                    match word {
                        "-r" | "--recursive" => recursive = true,
                        _ if path.is_none() => path = Some(word.to_string()),
                        _ => {}
                    }
                }
                Ok(Operation::List {
                    path: path.unwrap_or_else(|| ".".to_string()),
                    recursive,
                })
            }
            "exists" => Ok(Operation::Exists {
                path: required_path("exists", rest)?,
            }),
            "mkdir" => Ok(Operation::Mkdir {
                path: required_path("mkdir", rest)?,
            }),
            "delete" | "rm" => Ok(Operation::Delete {
                path: required_path("delete", rest)?,
            }),
            "stat" => Ok(Operation::Stat {
                path: required_path("stat", rest)?,
            }),
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }

    /// Run the operation against `manager`.
    pub fn execute(&self, manager: &dyn FileManager) -> Result<Output, GatewayError> {
        let output = match self {
            Operation::Read { path } => Output::Text(manager.read(path)?),
            Operation::Write { path, content } => {
                manager.write(path, content)?;
                Output::Done
            }
            Operation::List { path, recursive } => Output::Names(manager.list(path, *recursive)?),
            Operation::Exists { path } => Output::Bool(manager.exists(path)?),
            Operation::Mkdir { path } => {
                manager.create_directory(path)?;
                Output::Done
            }
            Operation::Delete { path } => {
                manager.delete(path)?;
                Output::Done
            }
            Operation::Stat { path } => Output::Info(manager.stat(path)?),
        };
        Ok(output)
    }

    /// The single-line form recorded in history.
    ///
    /// This is the shell syntax, except that write content spanning lines or
    /// longer than [`MAX_RECORDED_CONTENT`] bytes is left out.
    pub fn history_entry(&self) -> String {
        match self {
            Operation::Write { path, content }
                if content.contains(['\n', '\r']) || content.len() > MAX_RECORDED_CONTENT =>
            {
                format!("write {}", path)
            }
            _ => self.to_string(),
        }
    }

    /// Whether the operation changes the file system.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Operation::Write { .. } | Operation::Mkdir { .. } | Operation::Delete { .. }
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read { path } => write!(f, "read {}", path),
            Operation::Write { path, content } if content.is_empty() => {
                write!(f, "write {}", path)
            }
            Operation::Write { path, content } => write!(f, "write {} {}", path, content),
            Operation::List { path, recursive: true } => write!(f, "list -r {}", path),
            Operation::List { path, recursive: false } => write!(f, "list {}", path),
            Operation::Exists { path } => write!(f, "exists {}", path),
            Operation::Mkdir { path } => write!(f, "mkdir {}", path),
            Operation::Delete { path } => write!(f, "delete {}", path),
            Operation::Stat { path } => write!(f, "stat {}", path),
        }
    }
}

impl Output {
    /// Render for the terminal, as JSON when `json` is set.
    pub fn render(&self, json: bool) -> String {
        if json {
            let value = match self {
                Output::Text(text) => serde_json::json!(text),
                Output::Names(names) => serde_json::json!(names),
                Output::Bool(b) => serde_json::json!(b),
                Output::Info(info) => serde_json::json!(info),
                Output::Done => serde_json::json!({ "ok": true }),
            };
            return value.to_string();
        }

        match self {
            Output::Text(text) => text.clone(),
            Output::Names(names) => names.join("\n"),
            Output::Bool(b) => b.to_string(),
            Output::Info(info) => format!(
                "{} {:>10} {} {}{}",
                info.mode,
                info.size,
                info.modified_unix_secs(),
                info.path,
                if info.is_dir { "/" } else { "" }
            ),
            Output::Done => String::new(),
        }
    }
}

fn required_path(command: &'static str, rest: &str) -> Result<String, ParseError> {
    rest.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(ParseError::MissingArgument {
            command,
            argument: "path",
        })
}
