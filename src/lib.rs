//! # `dexfacts`
//!
//! `dexfacts` is the main crate of the project: it turns already disassembled
//! Dalvik containers into the relational facts consumed by a points-to
//! analysis. The project is subdivided into multiple crates, `dexfacts` acts
//! as entry point by reexporting important structs and functions from those
//! sub-crates. Most of the reexport are done within the `dexfacts::prelude`
//! namespace.
//!
//! ## Library basics
//!
//! A container is loaded with the `df_dex` API, then translated by a
//! [`Driver`](df_facts::driver::Driver) into any fact sink, such as a
//! directory of `.facts` files:
//!
//! ```rust,no_run
//! use dexfacts::prelude::*;
//! use dexfacts::dex;
//!
//! let container = dex::open("classes.json")?;
//! let database = Database::create("facts")?;
//! let stats = Driver::new(&database, Options::default()).run(&[container])?;
//! database.flush()?;
//! println!("{} methods translated", stats.methods);
//! # Ok::<(), DfError>(())
//! ```
//!
//! ## Sub-crates
//!
//!  - [`df_dex`] contains the input model: class definitions, reference
//!    tables and instruction streams, loaded from their JSON form,
//!  - [`df_facts`] contains the translator, the fact sinks and the class
//!    hierarchy reporter,
//!  - [`df_utils`] contains the small functions all the other crates can
//!    benefit from.

mod errors;

pub mod cli;
pub mod df_disas;
pub mod df_generate;

pub use df_dex as dex;
pub use df_facts as facts;
pub use df_utils as utils;

/// Reexport module of commonly used structures and functions from the
/// project sub-crates:
///
/// ```rust
/// use dexfacts::prelude::*;
/// ```
pub mod prelude {
    pub use crate::errors::{DfError, DfResult};

    pub use df_dex::{Addr, Container};

    pub use df_facts::driver::{Driver, Options, Stats};
    pub use df_facts::errors::FactsError;
    pub use df_facts::relations::Relation;
    pub use df_facts::sink::{Database, FactSink};

    use clap::ArgMatches;

    pub fn init_logger(args: &ArgMatches) {
        let env = env_logger::Env::new()
            .filter_or("DF_LOG", "info")
            .write_style("DF_LOG_STYLE");

        let mut builder = env_logger::Builder::from_env(env);
        if args.get_flag("verbose") {
            builder.filter_level(log::LevelFilter::Trace);
        } else if args.get_flag("debug") {
            builder.filter_level(log::LevelFilter::Debug);
        }
        if args.get_flag("ecslog") {
            builder.format(ecs_logger::format);
        }
        builder.init();
    }
}
