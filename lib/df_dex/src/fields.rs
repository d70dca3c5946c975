//! Field references and definitions.

use crate::annotations::Annotation;
use crate::types::Type;
use crate::values::EncodedValue;
use crate::Index;
use bitflags::bitflags;
use serde::{Deserialize, Deserializer};

bitflags! {
    pub struct FieldFlags: u32 {
        const ACC_PUBLIC                = 0x00001;
        const ACC_PRIVATE               = 0x00002;
        const ACC_PROTECTED             = 0x00004;
        const ACC_STATIC                = 0x00008;
        const ACC_FINAL                 = 0x00010;
        const ACC_VOLATILE              = 0x00040;
        const ACC_TRANSIENT             = 0x00080;
        const ACC_SYNTHETIC             = 0x01000;
        const ACC_ENUM                  = 0x04000;
    }
}

const FIELD_MODIFIERS: [(FieldFlags, &str); 9] = [
    (FieldFlags::ACC_PUBLIC, "public"),
    (FieldFlags::ACC_PRIVATE, "private"),
    (FieldFlags::ACC_PROTECTED, "protected"),
    (FieldFlags::ACC_STATIC, "static"),
    (FieldFlags::ACC_FINAL, "final"),
    (FieldFlags::ACC_VOLATILE, "volatile"),
    (FieldFlags::ACC_TRANSIENT, "transient"),
    (FieldFlags::ACC_SYNTHETIC, "synthetic"),
    (FieldFlags::ACC_ENUM, "enum"),
];

impl FieldFlags {
    #[must_use]
    pub fn modifiers(&self) -> Vec<&'static str> {
        FIELD_MODIFIERS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl<'de> Deserialize<'de> for FieldFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::from_bits_truncate)
    }
}

/// A field reference as found in the container field table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct FieldRef {
    class: Type,
    name: String,
    #[serde(rename = "type")]
    type_: Type,
}

impl FieldRef {
    #[must_use]
    pub const fn new(class: Type, name: String, type_: Type) -> Self {
        Self { class, name, type_ }
    }

    #[inline]
    #[must_use]
    pub const fn class(&self) -> &Type {
        &self.class
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn type_(&self) -> &Type {
        &self.type_
    }
}

/// A field defined by a class.
#[derive(Debug, Deserialize)]
pub struct FieldDef {
    field: Index<FieldRef>,
    access_flags: FieldFlags,
    #[serde(default)]
    initial_value: Option<EncodedValue>,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

impl FieldDef {
    #[inline]
    #[must_use]
    pub const fn field(&self) -> Index<FieldRef> {
        self.field
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> FieldFlags {
        self.access_flags
    }

    #[inline]
    #[must_use]
    pub const fn initial_value(&self) -> Option<&EncodedValue> {
        self.initial_value.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}
