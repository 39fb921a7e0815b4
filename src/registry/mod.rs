//! Helper and partial registries shared by every render through one engine

mod helpers;
mod partials;

use std::path::PathBuf;

use thiserror::Error;

use crate::error::ParseError;

pub use helpers::{BlockFnHelper, FnHelper, Helper, HelperRegistry};
pub use partials::{PartialRegistry, PartialTemplate};

/// Errors that can occur while populating a registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Partial directory does not exist
    #[error("partial directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Error reading a partial file or directory
    #[error("error reading {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Partial source that does not parse
    #[error("partial '{name}' has {} syntax error(s)", .errors.len())]
    Syntax { name: String, errors: Vec<ParseError> },
}
