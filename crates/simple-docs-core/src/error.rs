use std::io;
use std::path::PathBuf;

use simple_docs_config::ConfigError;
use simple_docs_render::RenderError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    NotFound = 1,
    Template = 2,
    InvalidArguments = 3,
    Io = 4,
}

#[derive(Debug, Error)]
pub enum DocsError {
    #[error("the \"{}\" directory doesn't exist", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("the \"{}\" file doesn't exist", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("a template engine is required for variable substitution")]
    TemplateCapabilityMissing,

    #[error("invalid document name '{name}'")]
    InvalidName { name: String },

    #[error("invalid variable '{input}': {reason}")]
    InvalidVariable { input: String, reason: &'static str },

    #[error("manifest {} is not valid: {source}", .path.display())]
    ManifestCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Template(#[from] RenderError),

    #[error("i/o error at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DocsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DocsError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::DirectoryNotFound { .. } | Self::FileNotFound { .. } => ExitCode::NotFound,
            Self::TemplateCapabilityMissing | Self::Template(_) => ExitCode::Template,
            Self::InvalidName { .. } | Self::InvalidVariable { .. } | Self::Config(_) => {
                ExitCode::InvalidArguments
            }
            Self::ManifestCorrupt { .. } | Self::Io { .. } => ExitCode::Io,
        }
    }
}

pub type DocsResult<T> = Result<T, DocsError>;
