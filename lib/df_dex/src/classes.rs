//! Class definitions.

use crate::annotations::Annotation;
use crate::fields::FieldDef;
use crate::methods::MethodDef;
use crate::types::Type;
use bitflags::bitflags;
use serde::{Deserialize, Deserializer};

bitflags! {
    /// Dalvik class flags
    pub struct ClassFlags: u32 {
        const ACC_PUBLIC                = 0x00001;
        const ACC_PRIVATE               = 0x00002;
        const ACC_PROTECTED             = 0x00004;
        const ACC_STATIC                = 0x00008;
        const ACC_FINAL                 = 0x00010;
        const ACC_INTERFACE             = 0x00200;
        const ACC_ABSTRACT              = 0x00400;
        const ACC_SYNTHETIC             = 0x01000;
        const ACC_ANNOTATION            = 0x02000;
        const ACC_ENUM                  = 0x04000;
    }
}

const CLASS_MODIFIERS: [(ClassFlags, &str); 10] = [
    (ClassFlags::ACC_PUBLIC, "public"),
    (ClassFlags::ACC_PRIVATE, "private"),
    (ClassFlags::ACC_PROTECTED, "protected"),
    (ClassFlags::ACC_STATIC, "static"),
    (ClassFlags::ACC_FINAL, "final"),
    (ClassFlags::ACC_INTERFACE, "interface"),
    (ClassFlags::ACC_ABSTRACT, "abstract"),
    (ClassFlags::ACC_SYNTHETIC, "synthetic"),
    (ClassFlags::ACC_ANNOTATION, "annotation"),
    (ClassFlags::ACC_ENUM, "enum"),
];

impl ClassFlags {
    /// Returns the modifier keywords of the set flags, in flag order.
    #[must_use]
    pub fn modifiers(&self) -> Vec<&'static str> {
        CLASS_MODIFIERS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl<'de> Deserialize<'de> for ClassFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::from_bits_truncate)
    }
}

/// A class defined in a container, with its members.
#[derive(Debug, Deserialize)]
pub struct ClassDef {
    #[serde(rename = "class")]
    class_type: Type,
    #[serde(default)]
    superclass: Option<Type>,
    #[serde(default)]
    interfaces: Vec<Type>,
    access_flags: ClassFlags,
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(default)]
    fields: Vec<FieldDef>,
    #[serde(default)]
    methods: Vec<MethodDef>,
    #[serde(default)]
    source_file: Option<String>,
}

impl ClassDef {
    #[inline]
    #[must_use]
    pub const fn class_type(&self) -> &Type {
        &self.class_type
    }

    /// Returns the dotted Java name of the class.
    #[inline]
    #[must_use]
    pub fn name(&self) -> String {
        self.class_type.to_java_string()
    }

    #[inline]
    #[must_use]
    pub const fn superclass(&self) -> Option<&Type> {
        self.superclass.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn interfaces(&self) -> &[Type] {
        &self.interfaces
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> ClassFlags {
        self.access_flags
    }

    #[inline]
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassFlags::ACC_INTERFACE)
    }

    #[inline]
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    #[inline]
    #[must_use]
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    #[inline]
    #[must_use]
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_modifiers() {
        let flags = ClassFlags::from_bits_truncate(0x0611);
        assert_eq!(
            flags.modifiers(),
            vec!["public", "final", "interface", "abstract"]
        );
    }
}
