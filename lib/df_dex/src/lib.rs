//! Disassembled Dalvik containers data structures.
//!
//! A [`Container`] is one compiled unit (typically one dex entry of an
//! application) as produced by an external disassembler: class definitions with
//! their members, method bodies already decoded into [`instrs::Instr`] values, and
//! the global reference tables that instructions point into through typed
//! [`Index`] values.
//!
//! ```rust
//! let container = df_dex::Container::from_json(r#"{
//!     "types": ["Ljava/lang/Object;"],
//!     "classes": [{"class": "La/B;", "superclass": "Ljava/lang/Object;", "access_flags": 1}]
//! }"#)?;
//! assert_eq!(container.classes()[0].name(), "a.B");
//! # Ok::<(), df_dex::errors::DexError>(())
//! ```

mod addr;

pub mod annotations;
pub mod classes;
pub mod code;
pub mod errors;
pub mod fields;
pub mod instrs;
pub mod methods;
pub mod registers;
pub mod types;
pub mod values;

pub use crate::addr::Addr;

use crate::classes::ClassDef;
use crate::errors::{DexError, DexResult};
use crate::fields::FieldRef;
use crate::methods::{CallSiteRef, MethodHandleRef, MethodRef};
use crate::types::{ProtoRef, Type};
use log::{debug, info};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::BufReader;
use std::marker::PhantomData;
use std::path::Path;

/// A typed position in one of the container reference tables.
///
/// Two references are the same reference when their indices are equal, which
/// makes indices suitable as keys of identity-based caches.
pub struct Index<T: ?Sized> {
    value: usize,
    marker: PhantomData<T>,
}

impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Index<T> {}

impl<T> PartialEq for Index<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Index<T> {}

impl<T> PartialOrd for Index<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Index<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> Hash for Index<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.value)
    }
}

impl<T> fmt::Display for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.value)
    }
}

impl<'de, T> Deserialize<'de> for Index<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        usize::deserialize(deserializer).map(Self::new)
    }
}

impl<T> Index<T> {
    #[must_use]
    pub const fn new(idx: usize) -> Self {
        Self {
            value: idx,
            marker: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.value
    }
}

/// Resolution of a typed index into the matching container table.
pub trait DexIndex: Sized {
    type T;

    fn get(self, container: &Container) -> DexResult<&Self::T>;
}

fn lookup<'a, T>(table: &'a [T], idx: usize, what: &str) -> DexResult<&'a T> {
    table
        .get(idx)
        .ok_or_else(|| DexError::ResNotFound(format!("{what} #{idx}")))
}

impl DexIndex for Index<Type> {
    type T = Type;

    fn get(self, container: &Container) -> DexResult<&Type> {
        lookup(&container.types, self.value, "type")
    }
}

impl DexIndex for Index<String> {
    type T = String;

    fn get(self, container: &Container) -> DexResult<&String> {
        lookup(&container.strings, self.value, "string")
    }
}

impl DexIndex for Index<FieldRef> {
    type T = FieldRef;

    fn get(self, container: &Container) -> DexResult<&FieldRef> {
        lookup(&container.fields, self.value, "field")
    }
}

impl DexIndex for Index<MethodRef> {
    type T = MethodRef;

    fn get(self, container: &Container) -> DexResult<&MethodRef> {
        lookup(&container.methods, self.value, "method")
    }
}

impl DexIndex for Index<ProtoRef> {
    type T = ProtoRef;

    fn get(self, container: &Container) -> DexResult<&ProtoRef> {
        lookup(&container.protos, self.value, "proto")
    }
}

impl DexIndex for Index<MethodHandleRef> {
    type T = MethodHandleRef;

    fn get(self, container: &Container) -> DexResult<&MethodHandleRef> {
        lookup(&container.method_handles, self.value, "method handle")
    }
}

impl DexIndex for Index<CallSiteRef> {
    type T = CallSiteRef;

    fn get(self, container: &Container) -> DexResult<&CallSiteRef> {
        lookup(&container.call_sites, self.value, "call site")
    }
}

/// One compiled unit: class definitions and global reference tables.
#[derive(Debug, Deserialize)]
pub struct Container {
    #[serde(default)]
    name: String,
    #[serde(default)]
    types: Vec<Type>,
    #[serde(default)]
    strings: Vec<String>,
    #[serde(default)]
    fields: Vec<FieldRef>,
    #[serde(default)]
    methods: Vec<MethodRef>,
    #[serde(default)]
    protos: Vec<ProtoRef>,
    #[serde(default)]
    method_handles: Vec<MethodHandleRef>,
    #[serde(default)]
    call_sites: Vec<CallSiteRef>,
    #[serde(default)]
    classes: Vec<ClassDef>,
}

impl Container {
    /// Decodes a container from its JSON form.
    pub fn from_json(s: &str) -> DexResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    /// All type references of the container.
    #[inline]
    #[must_use]
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// All field references of the container.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldRef] {
        &self.fields
    }

    /// All method references of the container.
    #[inline]
    #[must_use]
    pub fn methods(&self) -> &[MethodRef] {
        &self.methods
    }

    #[inline]
    #[must_use]
    pub fn method_handles(&self) -> &[MethodHandleRef] {
        &self.method_handles
    }

    pub fn get<I: DexIndex>(&self, idx: I) -> DexResult<&I::T> {
        idx.get(self)
    }
}

/// Loads a container from a JSON file.
///
/// Unnamed containers take the file stem as name.
pub fn open<P: AsRef<Path>>(path: P) -> DexResult<Container> {
    let path = path.as_ref();
    debug!("loading container {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let mut container: Container = serde_json::from_reader(reader)?;
    if container.name.is_empty() {
        container.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
    }
    info!(
        "container {}: {} classes, {} method references",
        container.name,
        container.classes.len(),
        container.methods.len()
    );
    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrs::Instr;

    const SAMPLE: &str = r#"{
        "name": "sample",
        "types": ["La/Main;", "[I"],
        "strings": ["hello"],
        "fields": [{"class": "La/Main;", "name": "count", "type": "I"}],
        "methods": [{"class": "La/Main;", "name": "run", "params": ["J"], "return": "V"}],
        "classes": [{
            "class": "La/Main;",
            "superclass": "Ljava/lang/Object;",
            "access_flags": 1,
            "fields": [{"field": 0, "access_flags": 8, "initial_value": {"int": 4}}],
            "methods": [{
                "method": 0,
                "access_flags": 9,
                "code": {
                    "registers_size": 2,
                    "instructions": [{"op": "const-string", "args": [0, 0]}, {"op": "return-void"}],
                    "tries": [{"start_addr": 0, "insn_count": 2, "handlers": [{"addr": 3}]}],
                    "debug_items": [{"kind": "line-number", "addr": 0, "line": 12}]
                }
            }]
        }]
    }"#;

    #[test]
    fn container_from_json() {
        let container = Container::from_json(SAMPLE).unwrap();
        assert_eq!(container.name(), "sample");
        let class = &container.classes()[0];
        assert_eq!(class.name(), "a.Main");
        let method = &class.methods()[0];
        assert!(method.is_static());
        let mref = container.get(method.method()).unwrap();
        assert_eq!(mref.name(), "run");
        let code = method.code().unwrap();
        assert!(matches!(code.instructions()[0], Instr::ConstString(_, s) if container.get(s).unwrap() == "hello"));
        assert!(code.tries()[0].handlers()[0].exception_type().is_none());
    }

    #[test]
    fn missing_reference() {
        let container = Container::from_json(SAMPLE).unwrap();
        assert!(container.get(Index::<Type>::new(7)).is_err());
        assert_eq!(
            container.get(Index::<Type>::new(1)).unwrap().to_java_string(),
            "int[]"
        );
    }
}
