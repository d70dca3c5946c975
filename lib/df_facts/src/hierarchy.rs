//! Class hierarchy reporting.
//!
//! Field accesses name the field through the class used at the access site,
//! which may inherit it. Their facts are held back as [`FieldOp`]s until every
//! class of the run is known, then written with the field of the class that
//! actually declares it. The same registry tells defined entities apart from
//! phantom ones, only referenced by the translated code.

use crate::errors::{FactsError, FactsResult};
use crate::relations::Relation;
use crate::repr;
use crate::signatures::FieldSig;
use crate::sink::{lock, FactSink};
use df_dex::types::Type;
use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction::Outgoing;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// A field access waiting for its declaring class.
#[derive(Debug, Clone)]
pub struct FieldOp {
    relation: Relation,
    insn: String,
    index: usize,
    var: String,
    base: Option<String>,
    field: Arc<FieldSig>,
    method: String,
}

impl FieldOp {
    /// `base` is the object register variable of instance accesses, `None`
    /// for static ones.
    #[must_use]
    pub fn new(
        relation: Relation,
        insn: String,
        index: usize,
        var: String,
        base: Option<String>,
        field: Arc<FieldSig>,
        method: String,
    ) -> Self {
        Self {
            relation,
            insn,
            index,
            var,
            base,
            field,
            method,
        }
    }

    #[inline]
    #[must_use]
    pub const fn relation(&self) -> Relation {
        self.relation
    }

    #[inline]
    #[must_use]
    pub fn insn(&self) -> &str {
        &self.insn
    }

    #[inline]
    #[must_use]
    pub fn field(&self) -> &FieldSig {
        &self.field
    }

    fn write(&self, sink: &dyn FactSink, field_id: &str) {
        let index = self.index.to_string();
        match &self.base {
            Some(base) => sink.add(
                self.relation,
                &[&self.insn, &index, &self.var, base, field_id, &self.method],
            ),
            None => sink.add(
                self.relation,
                &[&self.insn, &index, &self.var, field_id, &self.method],
            ),
        }
    }
}

/// Receiver of what class translation learns about the hierarchy.
///
/// Methods may be called concurrently from every worker.
pub trait HierarchyReporter: Send + Sync {
    fn register_defined_methods(&self, ids: Vec<String>);

    fn queue_field_ops(&self, ops: Vec<FieldOp>);

    /// Fails if the class was already registered with another super class.
    fn register_super_class(&self, class: &str, super_class: &str) -> FactsResult<()>;

    fn register_defined_class_fields(&self, class: &str, fields: Vec<Arc<FieldSig>>);

    fn register_referenced_field(&self, field: Arc<FieldSig>);

    fn register_referenced_type(&self, type_: &Type);

    fn register_referenced_method(&self, id: String);
}

/// Phantom entities found by [`Cha::conclude`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhantomCounts {
    pub types: usize,
    pub methods: usize,
    pub fields: usize,
}

#[derive(Debug, Default)]
struct ChaState {
    classes: DiGraph<String, ()>,
    node_ids: BTreeMap<String, NodeIndex>,
    defined_classes: HashSet<String>,
    defined_fields: HashMap<String, HashSet<(String, String)>>,
    defined_methods: HashSet<String>,
    field_ops: Vec<FieldOp>,
    referenced_fields: Vec<Arc<FieldSig>>,
    referenced_types: BTreeSet<String>,
    referenced_methods: BTreeSet<String>,
}

impl ChaState {
    fn node(&mut self, class: &str) -> NodeIndex {
        if let Some(id) = self.node_ids.get(class) {
            return *id;
        }
        let id = self.classes.add_node(class.to_string());
        self.node_ids.insert(class.to_string(), id);
        id
    }

    /// Walks up from the class named by the reference to the first class
    /// defining a field with this name and type.
    fn declaring_class(&self, field: &FieldSig) -> Option<&str> {
        let start = *self.node_ids.get(field.class())?;
        let key = (field.name().to_string(), field.type_().to_string());
        let mut dfs = Dfs::new(&self.classes, start);
        while let Some(id) = dfs.next(&self.classes) {
            let class = self.classes[id].as_str();
            if self
                .defined_fields
                .get(class)
                .map_or(false, |fields| fields.contains(&key))
            {
                return Some(class);
            }
        }
        None
    }
}

/// Class hierarchy analysis registry, shared by all the workers of a run.
#[derive(Debug, Default)]
pub struct Cha {
    state: Mutex<ChaState>,
}

impl Cha {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the super class registered for `class`.
    #[must_use]
    pub fn super_class(&self, class: &str) -> Option<String> {
        let state = lock(&self.state);
        let id = *state.node_ids.get(class)?;
        state
            .classes
            .neighbors_directed(id, Outgoing)
            .next()
            .map(|sup| state.classes[sup].clone())
    }

    /// Writes the queued field accesses with resolved field ids, then the
    /// phantom types and methods when `phantoms` is set.
    ///
    /// Queued accesses are drained, so a second call only writes what was
    /// queued in between.
    pub fn conclude(&self, sink: &dyn FactSink, phantoms: bool) -> PhantomCounts {
        let mut state = lock(&self.state);

        let ops = std::mem::take(&mut state.field_ops);
        for op in &ops {
            let field = op.field();
            match state.declaring_class(field) {
                Some(class) if class != field.class() => {
                    let id = repr::field_id(class, field.type_(), field.name());
                    op.write(sink, &id);
                }
                _ => op.write(sink, field.id()),
            }
        }
        debug!("{} field accesses written", ops.len());

        let phantom_fields = state
            .referenced_fields
            .iter()
            .filter(|field| state.declaring_class(field).is_none())
            .count();
        let phantom_types: Vec<&String> = state
            .referenced_types
            .iter()
            .filter(|t| !state.defined_classes.contains(*t))
            .collect();
        let phantom_methods: Vec<&String> = state
            .referenced_methods
            .iter()
            .filter(|m| !state.defined_methods.contains(*m))
            .collect();

        if phantoms {
            for t in &phantom_types {
                sink.add(Relation::PhantomType, &[t.as_str()]);
            }
            for m in &phantom_methods {
                sink.add(Relation::PhantomMethod, &[m.as_str()]);
            }
        }

        PhantomCounts {
            types: phantom_types.len(),
            methods: phantom_methods.len(),
            fields: phantom_fields,
        }
    }
}

impl HierarchyReporter for Cha {
    fn register_defined_methods(&self, ids: Vec<String>) {
        lock(&self.state).defined_methods.extend(ids);
    }

    fn queue_field_ops(&self, ops: Vec<FieldOp>) {
        lock(&self.state).field_ops.extend(ops);
    }

    fn register_super_class(&self, class: &str, super_class: &str) -> FactsResult<()> {
        let mut state = lock(&self.state);
        let src = state.node(class);
        if let Some(previous) = state.classes.neighbors_directed(src, Outgoing).next() {
            let previous = &state.classes[previous];
            if previous == super_class {
                return Ok(());
            }
            return Err(FactsError::SuperClassConflict {
                class: class.to_string(),
                previous: previous.clone(),
                new: super_class.to_string(),
            });
        }
        let dst = state.node(super_class);
        state.classes.add_edge(src, dst, ());
        Ok(())
    }

    fn register_defined_class_fields(&self, class: &str, fields: Vec<Arc<FieldSig>>) {
        let mut state = lock(&self.state);
        state.node(class);
        state.defined_classes.insert(class.to_string());
        let defined = state.defined_fields.entry(class.to_string()).or_default();
        for field in fields {
            defined.insert((field.name().to_string(), field.type_().to_string()));
        }
    }

    fn register_referenced_field(&self, field: Arc<FieldSig>) {
        lock(&self.state).referenced_fields.push(field);
    }

    fn register_referenced_type(&self, type_: &Type) {
        if let Type::Class(_) = type_ {
            lock(&self.state)
                .referenced_types
                .insert(type_.to_java_string());
        }
    }

    fn register_referenced_method(&self, id: String) {
        lock(&self.state).referenced_methods.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use df_dex::fields::FieldRef;

    fn field(class: &str, name: &str, type_: Type) -> Arc<FieldSig> {
        Arc::new(FieldSig::new(&FieldRef::new(
            Type::Class(class.to_string()),
            name.to_string(),
            type_,
        )))
    }

    #[test]
    fn inherited_field_resolution() {
        let cha = Cha::new();
        cha.register_super_class("a.Child", "a.Parent").unwrap();
        cha.register_super_class("a.Parent", "java.lang.Object").unwrap();
        cha.register_defined_class_fields("a.Parent", vec![field("a/Parent", "count", Type::Int)]);
        cha.register_defined_class_fields("a.Child", vec![]);

        let inherited = field("a/Child", "count", Type::Int);
        let unknown = field("a/Child", "missing", Type::Long);
        cha.queue_field_ops(vec![
            FieldOp::new(
                Relation::LoadInstanceField,
                "m/read-field-count/0".to_string(),
                3,
                "m/v0".to_string(),
                Some("m/p0".to_string()),
                Arc::clone(&inherited),
                "m".to_string(),
            ),
            FieldOp::new(
                Relation::StoreStaticField,
                "m/write-field-missing/0".to_string(),
                5,
                "m/v1".to_string(),
                None,
                Arc::clone(&unknown),
                "m".to_string(),
            ),
        ]);
        cha.register_referenced_field(inherited);
        cha.register_referenced_field(unknown);

        let sink = MemorySink::new();
        let counts = cha.conclude(&sink, true);
        assert_eq!(
            sink.rows(Relation::LoadInstanceField),
            vec![vec![
                "m/read-field-count/0",
                "3",
                "m/v0",
                "m/p0",
                "<a.Parent: int count>",
                "m"
            ]]
        );
        assert_eq!(
            sink.rows(Relation::StoreStaticField),
            vec![vec!["m/write-field-missing/0", "5", "m/v1", "<a.Child: long missing>", "m"]]
        );
        assert_eq!(counts.fields, 1);
    }

    #[test]
    fn phantoms() {
        let cha = Cha::new();
        cha.register_defined_class_fields("a.Main", vec![]);
        cha.register_defined_methods(vec!["<a.Main: void run()>".to_string()]);
        cha.register_referenced_type(&Type::Class("a/Main".to_string()));
        cha.register_referenced_type(&Type::Class("x/Lib".to_string()));
        cha.register_referenced_type(&Type::Array(1, Box::new(Type::Int)));
        cha.register_referenced_type(&Type::Int);
        cha.register_referenced_method("<a.Main: void run()>".to_string());
        cha.register_referenced_method("<x.Lib: void b()>".to_string());
        cha.register_referenced_method("<x.Lib: void a()>".to_string());

        let sink = MemorySink::new();
        let counts = cha.conclude(&sink, true);
        assert_eq!(sink.rows(Relation::PhantomType), vec![vec!["x.Lib"]]);
        assert_eq!(
            sink.rows(Relation::PhantomMethod),
            vec![vec!["<x.Lib: void a()>"], vec!["<x.Lib: void b()>"]]
        );
        assert_eq!(counts.types, 1);
        assert_eq!(counts.methods, 2);

        let quiet = MemorySink::new();
        assert_eq!(cha.conclude(&quiet, false), counts);
        assert!(quiet.relations().is_empty());
    }

    #[test]
    fn super_class_conflict() {
        let cha = Cha::new();
        cha.register_super_class("a.B", "a.A").unwrap();
        cha.register_super_class("a.B", "a.A").unwrap();
        assert_eq!(cha.super_class("a.B").as_deref(), Some("a.A"));
        assert!(matches!(
            cha.register_super_class("a.B", "a.C"),
            Err(FactsError::SuperClassConflict { .. })
        ));
    }
}
