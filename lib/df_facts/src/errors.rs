//! Translation errors definition.

use df_dex::errors::DexError;
use std::io;
use thiserror::Error;

pub type FactsResult<T> = Result<T, FactsError>;

/// Translation error type.
///
/// Apart from `Dex`, `IO`, `ThreadPool` and `Failed`, every variant aborts the
/// translation of the enclosing method only.
#[derive(Debug, Error)]
pub enum FactsError {
    #[error("dex error: {0}")]
    Dex(#[from] DexError),

    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{method}: unsupported opcode {opcode} at line {line}")]
    UnknownOpcode {
        method: String,
        opcode: String,
        line: String,
    },

    #[error("{method}: move-result at index {index} has no pending result")]
    MissingResult { method: String, index: usize },

    #[error("{method}: move-result at index {index} is not next to its producer at index {producer}")]
    StaleResult {
        method: String,
        index: usize,
        producer: usize,
    },

    #[error("{method}: invocation expects {expected} argument registers, {available} available")]
    MissingArguments {
        method: String,
        expected: usize,
        available: usize,
    },

    #[error("{method}: instance invocation without receiver register")]
    MissingReceiver { method: String },

    #[error("class {class} already has super class {previous}, cannot register {new}")]
    SuperClassConflict {
        class: String,
        previous: String,
        new: String,
    },

    #[error("translation failed ({errors} errors)")]
    Failed { errors: usize },
}
