use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template syntax error: {0}")]
    Compile(String),

    #[error("template rendering failed: {0}")]
    Render(String),

    #[error("i/o error while emitting output: {0}")]
    Io(#[from] io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
