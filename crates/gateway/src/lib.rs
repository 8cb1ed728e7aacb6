//! # fsgate Gateway Library
//!
//! This crate confines file operations requested by an untrusted caller to a
//! single base directory tree.
//!
//! ## Overview
//!
//! Every operation goes through three layers:
//!
//! - **Path Validator**: rejects malformed paths and shell metacharacters,
//!   then checks the normalized and symlink-resolved location against the
//!   base directory
//! - **Operation Layer**: read, write, list, exists, create-directory, delete
//!   and stat, with OS errors translated into [`GatewayError`]
//! - **Concurrency Guard**: a per-instance reader/writer lock around each
//!   validate-then-act sequence
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Caller path                │  untrusted string
//! ├─────────────────────────────────────────┤
//! │            PathValidator                │  format, bounds, symlinks
//! ├─────────────────────────────────────────┤
//! │         RwLock (shared/exclusive)       │
//! ├─────────────────────────────────────────┤
//! │           std::fs operation             │  inside base directory
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gateway::{ErrorKind, FileManager, FileManagerImpl};
//!
//! let manager = FileManagerImpl::new("/srv/sandbox");
//!
//! manager.write("notes/today.txt", "hello").unwrap();
//! assert_eq!(manager.read("notes/today.txt").unwrap(), "hello");
//!
//! // Anything that escapes the base directory is rejected.
//! let err = manager.write("../outside.txt", "x").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::InvalidPath);
//! ```
//!
//! ## Modules
//!
//! - [`validate`]: Path validation and normalization
//! - [`manager`]: The [`FileManager`] trait and its local implementation
//! - [`info`]: File metadata returned by `stat`
//! - [`error`]: Error types

pub mod error;
pub mod info;
pub mod manager;
pub mod validate;

pub use error::{ErrorKind, GatewayError, Result, ValidationError, ValidationErrorKind};
pub use info::FileInfo;
pub use manager::{FileManager, FileManagerImpl, DIR_MODE, FILE_MODE};
pub use validate::{PathValidator, ResolvedPath, FORBIDDEN_CHARS};
