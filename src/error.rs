use std::path::PathBuf;

use thiserror::Error;

/// Network-level failures while retrieving a page or script.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failures isolating the embedded literal from script source.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("marker not found: could not locate palette data in script source")]
    MarkerNotFound,

    #[error("unbalanced braces: palette block starting at byte {start} never closes")]
    UnbalancedBraces { start: usize },
}

/// Malformed literal, or a literal whose shape is not the expected one.
#[derive(Debug, Error)]
#[error("{message}{}", at_suffix(.offset))]
pub struct ParseError {
    pub offset: Option<usize>,
    pub message: String,
}

fn at_suffix(offset: &Option<usize>) -> String {
    offset.map(|at| format!(" at byte {}", at)).unwrap_or_default()
}

impl ParseError {
    pub fn at(offset: usize, message: impl Into<String>) -> Self {
        ParseError {
            offset: Some(offset),
            message: message.into(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        ParseError {
            offset: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    NotFound(String),

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("failed to parse palette literal: {0}")]
    Parse(#[from] ParseError),

    #[error("missing intent definition for id {id} (referenced by category {category:?})")]
    Integrity { category: String, id: String },

    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid palette artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
