use std::{fmt, io, path::PathBuf};

use serde::Serialize;
use thiserror::Error;

/// A position inside a schema source file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Location {
    pub path:   PathBuf,
    pub line:   usize,
    pub column: usize,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Location { path: path.into(), line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{path}:{line}:{column}: {message}", path = .path.display())]
    SchemaFormat {
        path:    PathBuf,
        line:    usize,
        column:  usize,
        message: String,
    },

    #[error("cannot import \"{name}\"{}: {reason}", importer_suffix(.importer))]
    ImportResolution {
        name:     String,
        importer: Option<Location>,
        reason:   String,
        #[source]
        source:   Option<io::Error>,
    },

    #[error("{location}: cannot resolve type \"{name}\" of field \"{field}\" in message \"{message}\"{}", hint_suffix(.hint))]
    TypeResolution {
        location: Location,
        field:    String,
        message:  String,
        name:     String,
        hint:     Option<String>,
    },

    #[error("{location}: field \"{field}\" in message \"{message}\": {reason}")]
    FieldNumber {
        location: Location,
        field:    String,
        message:  String,
        number:   i128,
        reason:   String,
    },

    #[error("{location}: \"{name}\" is already defined at {first}{}", hint_suffix(.clash))]
    DuplicateName {
        location: Location,
        name:     String,
        first:    Location,
        /// Set when two distinct schema names map to one Rust identifier.
        clash:    Option<String>,
    },

    #[error("{location}: {message}")]
    Invalid {
        location: Location,
        message:  String,
    },

    #[error("I/O error writing \"{path}\": {source}", path = .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

fn importer_suffix(importer: &Option<Location>) -> String {
    match importer {
        Some(location) => format!(" (imported at {})", location),
        None => String::new(),
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(hint) => format!(" ({})", hint),
        None => String::new(),
    }
}

impl Error {
    /// Convenience constructor used by the tokenizer and parser.
    pub fn schema_format(location: &Location, message: impl Into<String>) -> Self {
        Error::SchemaFormat {
            path:    location.path.clone(),
            line:    location.line,
            column:  location.column,
            message: message.into(),
        }
    }

    pub fn invalid(location: &Location, message: impl Into<String>) -> Self {
        Error::Invalid {
            location: location.clone(),
            message:  message.into(),
        }
    }
}
