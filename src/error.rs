//! Error Types

use std::path::PathBuf;
use thiserror::Error;

use crate::token::PropType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("prop '{0}' missing in props")]
    MissingProp(String),

    #[error("prop '{0}' has invalid type, expecting '{1}'")]
    TypeMismatch(String, PropType),

    #[error("unknown component '{0}'")]
    UnknownComponent(String),

    #[error("prop '{0}' must be an array of objects")]
    InvalidArrayProp(String),

    #[error("inclusion depth limit of {limit} exceeded at component '{name}'")]
    DepthExceeded { name: String, limit: usize },

    #[error("error while rendering sub component '{name}' (id '{id}'):\n  {source}")]
    Nested {
        name: String,
        id: String,
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    pub fn nested(name: &str, id: &str, source: RenderError) -> Self {
        RenderError::Nested {
            name: name.to_string(),
            id: id.to_string(),
            source: Box::new(source),
        }
    }

    /// The innermost, non-wrapping error.
    pub fn root_cause(&self) -> &RenderError {
        let mut err = self;
        while let RenderError::Nested { source, .. } = err {
            err = source;
        }
        err
    }

    /// `(name, id)` of every inclusion the error passed through, outermost first.
    pub fn chain(&self) -> Vec<(&str, &str)> {
        let mut frames = Vec::new();
        let mut err = self;
        while let RenderError::Nested { name, id, source } = err {
            frames.push((name.as_str(), id.as_str()));
            err = source;
        }
        frames
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read component '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk component directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("component path '{}' is not valid UTF-8", .0.display())]
    InvalidPath(PathBuf),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
