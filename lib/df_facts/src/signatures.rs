//! Canonical method and field signatures, memoized per container.

use crate::errors::FactsResult;
use crate::repr;
use dashmap::DashMap;
use df_dex::fields::FieldRef;
use df_dex::methods::MethodRef;
use df_dex::types::Type;
use df_dex::{Container, Index};
use std::sync::Arc;

/// Method reference rendered in facts form.
#[derive(Debug)]
pub struct MethodSig {
    id: String,
    class: String,
    name: String,
    params: Vec<String>,
    param_types: Vec<Type>,
    return_type: String,
    returns_void: bool,
    descriptor: String,
}

impl MethodSig {
    #[must_use]
    pub fn new(mref: &MethodRef) -> Self {
        let class = mref.class().to_java_string();
        let params: Vec<String> = mref.params().iter().map(Type::to_java_string).collect();
        let return_type = mref.return_type().to_java_string();
        Self {
            id: repr::method_id(&class, &return_type, mref.name(), &params),
            class,
            name: mref.name().to_string(),
            params,
            param_types: mref.params().to_vec(),
            return_type,
            returns_void: *mref.return_type() == Type::Void,
            descriptor: mref.descriptor(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[inline]
    #[must_use]
    pub fn param_types(&self) -> &[Type] {
        &self.param_types
    }

    #[inline]
    #[must_use]
    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    #[inline]
    #[must_use]
    pub const fn returns_void(&self) -> bool {
        self.returns_void
    }

    /// JVM descriptor, such as `(ILjava/lang/String;)V`.
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// `Class.name`, the kind of the numbered ids of invocations.
    #[must_use]
    pub fn mid(&self) -> String {
        format!("{}.{}", self.class, self.name)
    }

    /// Parameter list between parentheses, as written in `Method` facts.
    #[must_use]
    pub fn params_signature(&self) -> String {
        format!("({})", self.params.join(","))
    }

    /// Number of registers taken by the parameters, receiver excluded.
    #[must_use]
    pub fn params_width(&self) -> usize {
        self.param_types.iter().map(Type::reg_width).sum()
    }
}

/// Field reference rendered in facts form.
#[derive(Debug)]
pub struct FieldSig {
    id: String,
    class: String,
    name: String,
    type_: String,
}

impl FieldSig {
    #[must_use]
    pub fn new(fref: &FieldRef) -> Self {
        let class = fref.class().to_java_string();
        let type_ = fref.type_().to_java_string();
        Self {
            id: repr::field_id(&class, &type_, fref.name()),
            class,
            name: fref.name().to_string(),
            type_,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn type_(&self) -> &str {
        &self.type_
    }
}

/// Signatures shared by all the workers translating one container.
///
/// Method signatures are keyed by the referenced method itself, so that
/// duplicated method table entries resolve to one shared signature. Field
/// signatures are keyed by table index.
#[derive(Debug, Default)]
pub struct SignatureCache {
    methods: DashMap<MethodRef, Arc<MethodSig>>,
    fields: DashMap<Index<FieldRef>, Arc<FieldSig>>,
}

impl SignatureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(
        &self,
        container: &Container,
        idx: Index<MethodRef>,
    ) -> FactsResult<Arc<MethodSig>> {
        let mref = container.get(idx)?;
        if let Some(sig) = self.methods.get(mref) {
            return Ok(Arc::clone(sig.value()));
        }
        let entry = self
            .methods
            .entry(mref.clone())
            .or_insert_with(|| Arc::new(MethodSig::new(mref)));
        Ok(Arc::clone(entry.value()))
    }

    pub fn field(&self, container: &Container, idx: Index<FieldRef>) -> FactsResult<Arc<FieldSig>> {
        if let Some(sig) = self.fields.get(&idx) {
            return Ok(Arc::clone(sig.value()));
        }
        let fref = container.get(idx)?;
        let entry = self
            .fields
            .entry(idx)
            .or_insert_with(|| Arc::new(FieldSig::new(fref)));
        Ok(Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len() + self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    const CONTAINER: &str = r#"{
        "fields": [{"class": "La/B;", "name": "items", "type": "[Ljava/lang/String;"}],
        "methods": [
            {"class": "La/B;", "name": "run", "params": ["J", "I"], "return": "V"},
            {"class": "La/B;", "name": "run", "params": ["J", "I"], "return": "V"}
        ]
    }"#;

    #[test]
    fn method_signature() {
        let container = Container::from_json(CONTAINER).unwrap();
        let cache = SignatureCache::new();
        let sig = cache.method(&container, Index::new(0)).unwrap();
        assert_eq!(sig.id(), "<a.B: void run(long,int)>");
        assert_eq!(sig.params_signature(), "(long,int)");
        assert_eq!(sig.descriptor(), "(JI)V");
        assert_eq!(sig.params_width(), 3);
        assert_eq!(sig.mid(), "a.B.run");
        assert!(sig.returns_void());
        let field = cache.field(&container, Index::new(0)).unwrap();
        assert_eq!(field.id(), "<a.B: java.lang.String[] items>");
    }

    #[test]
    fn concurrent_lookups_share_one_signature() {
        let container = Container::from_json(CONTAINER).unwrap();
        let cache = SignatureCache::new();
        let sigs: Vec<Arc<MethodSig>> = (0..64)
            .into_par_iter()
            .map(|_| cache.method(&container, Index::new(0)).unwrap())
            .collect();
        assert!(sigs.iter().all(|s| Arc::ptr_eq(s, &sigs[0])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn duplicated_method_references_share_one_signature() {
        let container = Container::from_json(CONTAINER).unwrap();
        let cache = SignatureCache::new();
        let first = cache.method(&container, Index::new(0)).unwrap();
        let second = cache.method(&container, Index::new(1)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_reference() {
        let container = Container::from_json(CONTAINER).unwrap();
        assert!(SignatureCache::new().method(&container, Index::new(9)).is_err());
    }
}
