//! Input model errors definitions.

use crate::Addr;
use std::io;
use thiserror::Error;

/// An alias for result that can be a [`DexError`].
pub type DexResult<T> = Result<T, DexError>;

/// The input model error type.
#[derive(Debug, Error)]
pub enum DexError {
    /// Error that can be returned when doing [std::io](I/O) operations.
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// Error that can be returned when decoding a container file.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("container structure is invalid: {0}")]
    Structure(String),

    #[error("resource not found in container tables: {0}")]
    ResNotFound(String),

    #[error("could not convert {} into {}", from, to)]
    Conversion { from: String, to: String },

    #[error("invalid type")]
    InvalidType,

    #[error("Instruction not found (address: {0})")]
    InstructionNotFound(Addr),
}
