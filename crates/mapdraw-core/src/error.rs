use std::path::{Path, PathBuf};

use thiserror::Error;

/// Where to fetch the blank world map when it is missing.
pub const TEMPLATE_SOURCE_URL: &str =
    "https://commons.wikimedia.org/wiki/File:BlankMap-World-Microstates.svg";

#[derive(Debug, Error)]
pub enum MapError {
    #[error("missing asset {}: {hint}", path.display())]
    MissingAsset { path: PathBuf, hint: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed template: {message}")]
    Xml { message: String },

    #[error("unresolvable country name: {name:?}")]
    UnresolvableCountryName { name: String },

    #[error("invalid colour scheme: {0} (expected 0, 1 or 2)")]
    InvalidPalette(i64),

    #[error("answer for {name:?} at the prompt is not a finite number: {answer:?}")]
    MalformedAnswer { name: String, answer: String },

    #[error("{}:{line}: {message}", path.display())]
    MalformedInputRow {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl MapError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        MapError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn xml(err: impl std::fmt::Display) -> Self {
        MapError::Xml {
            message: err.to_string(),
        }
    }

    /// Map a read failure onto `MissingAsset` when the file simply is not there.
    pub fn asset(path: &Path, source: std::io::Error, hint: impl Into<String>) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            MapError::MissingAsset {
                path: path.to_path_buf(),
                hint: hint.into(),
            }
        } else {
            MapError::io(path, source)
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MapError::MissingAsset { .. } => "missing_asset",
            MapError::Io { .. } => "io",
            MapError::Xml { .. } => "xml",
            MapError::UnresolvableCountryName { .. } => "unresolvable_country_name",
            MapError::InvalidPalette(_) => "invalid_palette",
            MapError::MalformedInputRow { .. } => "malformed_input_row",
            MapError::MalformedAnswer { .. } => "malformed_answer",
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
