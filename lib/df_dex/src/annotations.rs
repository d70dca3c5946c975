//! Annotations attached to classes, fields, methods and parameters.

use crate::types::Type;
use crate::values::EncodedValue;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Build,
    Runtime,
    System,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationElement {
    name: String,
    value: EncodedValue,
}

impl AnnotationElement {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn value(&self) -> &EncodedValue {
        &self.value
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    visibility: Option<Visibility>,
    #[serde(rename = "type")]
    type_: Type,
    #[serde(default)]
    elements: Vec<AnnotationElement>,
}

impl Annotation {
    #[inline]
    #[must_use]
    pub const fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    #[inline]
    #[must_use]
    pub const fn type_(&self) -> &Type {
        &self.type_
    }

    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[AnnotationElement] {
        &self.elements
    }

    /// Returns the value of the named element, if any.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<&EncodedValue> {
        self.elements
            .iter()
            .find(|e| e.name == name)
            .map(AnnotationElement::value)
    }
}
