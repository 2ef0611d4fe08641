//! Fatal publish errors.
//!
//! Per-file failures (an unreadable source listing, a malformed tag) are
//! logged where they happen and never reach this type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("template {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("failed to render {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no URL registered for {0}")]
    UnregisteredLink(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PublishError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PublishError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = PublishError> = std::result::Result<T, E>;
