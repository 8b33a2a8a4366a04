use std::path::PathBuf;

use thiserror::Error;

/// Classifies build errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad rule syntax, unknown type, malformed attribute or include target
    Parse,
    /// Unknown include target or an include cycle
    Resolution,
    /// Missing or unreadable input, unwritable output
    Io,
    /// Dataset serialization or decoding failure
    Encoding,
    /// Invalid command line value or override file
    Config,
}

/// Geodata builder error types
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Parse error in {file} at line {line}: {message}")]
    ParseErrorAtLine {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Empty domain in list {0}")]
    EmptyDomain(String),

    #[error("List {list} includes unknown list {target}")]
    UnknownInclude { list: String, target: String },

    #[error("Include cycle between lists: {}", .0.join(", "))]
    InclusionCycle(Vec<String>),

    #[error("IO error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl BuildError {
    /// Wrap an IO error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::ParseErrorAtLine { .. }
            | BuildError::EmptyDomain(_)
            | BuildError::InvalidCidr(_) => ErrorKind::Parse,
            BuildError::UnknownInclude { .. } | BuildError::InclusionCycle(_) => {
                ErrorKind::Resolution
            }
            BuildError::Io { .. } => ErrorKind::Io,
            BuildError::EncodingError(_) => ErrorKind::Encoding,
            BuildError::ConfigError(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
