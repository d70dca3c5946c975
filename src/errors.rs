//! Global error handling.
//!
//! Each sub-crate of the project defines its own type error.
//! Their types can be unified, for example in a main function,
//! when winding results at the top-level.
//!
//! ```rust,no_run
//! use dexfacts::prelude::*;
//! use dexfacts::dex;
//!
//! fn main() -> DfResult<()> { // can return a DfError
//!    let _container = dex::open("classes.json")?; // can return a DexError
//!    Ok(())
//! }
//! ```

use df_dex::errors::DexError;
use df_facts::errors::FactsError;
use std::io;
use thiserror::Error;

/// An alias for result that can be a [`DfError`].
pub type DfResult<T> = Result<T, DfError>;

/// The main error type for error winding at the top-level.
/// It mainly consists of transparent wrapper over error types that
/// are defined in dependencies.
#[derive(Debug, Error)]
pub enum DfError {
    /// Custom error for reporting bad command line arguments usage.
    #[error("bad arguments: {0}")]
    BadArguments(String),

    /// Error that can be returned from [I/O operations](std::io).
    #[error(transparent)]
    IO(#[from] io::Error),

    /// Error that can be returned from regex compilation.
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Error that can be returned when writing the run summary.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Error that can be returned from [`df_dex`] functions.
    #[error(transparent)]
    Dex(#[from] DexError),

    /// Error that can be returned from [`df_facts`] functions.
    #[error(transparent)]
    Facts(#[from] FactsError),
}
