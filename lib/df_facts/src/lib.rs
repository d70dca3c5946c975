//! Translation of Dalvik bytecode into points-to analysis facts.
//!
//! Every method of a [`df_dex::Container`] is decoded instruction by
//! instruction into rows of named relations (see [`relations::Relation`]),
//! written to a [`sink::FactSink`]. Instructions are numbered from 1 in
//! their method and every entity is named after its method (see [`repr`]).
//!
//! Translation of one method never depends on another one: all the state
//! of multi-instruction idioms ([`patterns`]) and branch resolution
//! ([`addrmap`]) lives in a [`method::MethodWriter`]. What spans classes,
//! such as field declaring classes and phantom references, goes through
//! the [`hierarchy`] reporter once every class has been translated.
//!
//! ```rust
//! use df_facts::driver::{Driver, Options};
//! use df_facts::relations::Relation;
//! use df_facts::sink::MemorySink;
//!
//! let container = df_dex::Container::from_json(r#"{
//!     "methods": [{"class": "La/B;", "name": "run", "params": [], "return": "V"}],
//!     "classes": [{
//!         "class": "La/B;",
//!         "superclass": "Ljava/lang/Object;",
//!         "access_flags": 1,
//!         "methods": [{
//!             "method": 0,
//!             "access_flags": 9,
//!             "code": {"registers_size": 0, "instructions": [{"op": "return-void"}]}
//!         }]
//!     }]
//! }"#)?;
//! let sink = MemorySink::new();
//! let stats = Driver::new(&sink, Options::default()).run(&[container])?;
//! assert_eq!(stats.methods, 1);
//! assert_eq!(sink.count(Relation::ReturnVoid), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod addrmap;
pub mod class;
pub mod driver;
pub mod errors;
pub mod hierarchy;
pub mod method;
pub mod patterns;
pub mod relations;
pub mod repr;
pub mod signatures;
pub mod sink;
pub mod typeinfer;
