//! Method references and definitions, method handles and call sites.

use crate::annotations::Annotation;
use crate::code::CodeItem;
use crate::fields::FieldRef;
use crate::types::{ProtoRef, Type};
use crate::Index;
use bitflags::bitflags;
use serde::{Deserialize, Deserializer};

bitflags! {
    pub struct MethodFlags: u32 {
        const ACC_PUBLIC                = 0x00001;
        const ACC_PRIVATE               = 0x00002;
        const ACC_PROTECTED             = 0x00004;
        const ACC_STATIC                = 0x00008;
        const ACC_FINAL                 = 0x00010;
        const ACC_SYNCHRONIZED          = 0x00020;
        const ACC_BRIDGE                = 0x00040;
        const ACC_VARARGS               = 0x00080;
        const ACC_NATIVE                = 0x00100;
        const ACC_ABSTRACT              = 0x00400;
        const ACC_STRICT                = 0x00800;
        const ACC_SYNTHETIC             = 0x01000;
        const ACC_CONSTRUCTOR           = 0x10000;
        const ACC_DECLARED_SYNCHRONIZED = 0x20000;
    }
}

const METHOD_MODIFIERS: [(MethodFlags, &str); 14] = [
    (MethodFlags::ACC_PUBLIC, "public"),
    (MethodFlags::ACC_PRIVATE, "private"),
    (MethodFlags::ACC_PROTECTED, "protected"),
    (MethodFlags::ACC_STATIC, "static"),
    (MethodFlags::ACC_FINAL, "final"),
    (MethodFlags::ACC_SYNCHRONIZED, "synchronized"),
    (MethodFlags::ACC_BRIDGE, "bridge"),
    (MethodFlags::ACC_VARARGS, "varargs"),
    (MethodFlags::ACC_NATIVE, "native"),
    (MethodFlags::ACC_ABSTRACT, "abstract"),
    (MethodFlags::ACC_STRICT, "strictfp"),
    (MethodFlags::ACC_SYNTHETIC, "synthetic"),
    (MethodFlags::ACC_CONSTRUCTOR, "constructor"),
    (MethodFlags::ACC_DECLARED_SYNCHRONIZED, "declared-synchronized"),
];

impl MethodFlags {
    #[must_use]
    pub fn modifiers(&self) -> Vec<&'static str> {
        METHOD_MODIFIERS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl<'de> Deserialize<'de> for MethodFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u32::deserialize(deserializer).map(Self::from_bits_truncate)
    }
}

/// A method reference as found in the container method table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct MethodRef {
    class: Type,
    name: String,
    #[serde(default)]
    params: Vec<Type>,
    #[serde(rename = "return")]
    ret: Type,
}

impl MethodRef {
    #[must_use]
    pub const fn new(class: Type, name: String, params: Vec<Type>, ret: Type) -> Self {
        Self {
            class,
            name,
            params,
            ret,
        }
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
    pub fn params(&self) -> &[Type] {
        &self.params
    }

    #[inline]
    #[must_use]
    pub const fn return_type(&self) -> &Type {
        &self.ret
    }

    /// Returns the Dalvik descriptor of the prototype, such as `(ILjava/lang/String;)V`.
    #[must_use]
    pub fn descriptor(&self) -> String {
        let params: String = self.params.iter().map(ToString::to_string).collect();
        format!("({params}){}", self.ret)
    }
}

/// A method defined by a class.
#[derive(Debug, Deserialize)]
pub struct MethodDef {
    method: Index<MethodRef>,
    access_flags: MethodFlags,
    #[serde(default)]
    annotations: Vec<Annotation>,
    #[serde(default)]
    parameter_annotations: Vec<Vec<Annotation>>,
    #[serde(default)]
    code: Option<CodeItem>,
}

impl MethodDef {
    #[inline]
    #[must_use]
    pub const fn method(&self) -> Index<MethodRef> {
        self.method
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> MethodFlags {
        self.access_flags
    }

    #[inline]
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.access_flags.contains(MethodFlags::ACC_STATIC)
    }

    #[inline]
    #[must_use]
    pub const fn is_native(&self) -> bool {
        self.access_flags.contains(MethodFlags::ACC_NATIVE)
    }

    #[inline]
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns the annotations of the `i`-th declared parameter.
    #[must_use]
    pub fn parameter_annotations(&self, i: usize) -> &[Annotation] {
        self.parameter_annotations
            .get(i)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[inline]
    #[must_use]
    pub const fn code(&self) -> Option<&CodeItem> {
        self.code.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodHandleKind {
    StaticPut,
    StaticGet,
    InstancePut,
    InstanceGet,
    InvokeStatic,
    InvokeInstance,
    InvokeConstructor,
    InvokeDirect,
    InvokeInterface,
}

impl MethodHandleKind {
    /// Returns the JVM `REF_*` reference kind matching this handle kind.
    #[must_use]
    pub const fn reference_kind(self) -> u8 {
        match self {
            Self::InstanceGet => 1,
            Self::StaticGet => 2,
            Self::InstancePut => 3,
            Self::StaticPut => 4,
            Self::InvokeInstance => 5,
            Self::InvokeStatic => 6,
            Self::InvokeDirect => 7,
            Self::InvokeConstructor => 8,
            Self::InvokeInterface => 9,
        }
    }

    #[must_use]
    pub const fn is_field_accessor(self) -> bool {
        matches!(
            self,
            Self::StaticPut | Self::StaticGet | Self::InstancePut | Self::InstanceGet
        )
    }
}

/// The member a method handle points to.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleTarget {
    Method(Index<MethodRef>),
    Field(Index<FieldRef>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodHandleRef {
    kind: MethodHandleKind,
    target: HandleTarget,
}

impl MethodHandleRef {
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> MethodHandleKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub const fn target(&self) -> HandleTarget {
        self.target
    }
}

/// A call site of `invoke-custom` instructions.
#[derive(Debug, Clone, Deserialize)]
pub struct CallSiteRef {
    bootstrap: Index<MethodHandleRef>,
    name: String,
    proto: Index<ProtoRef>,
}

impl CallSiteRef {
    #[inline]
    #[must_use]
    pub const fn bootstrap(&self) -> Index<MethodHandleRef> {
        self.bootstrap
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn proto(&self) -> Index<ProtoRef> {
        self.proto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_and_modifiers() {
        let m = MethodRef::new(
            Type::Class("a/B".to_string()),
            "run".to_string(),
            vec![Type::Int, Type::Class("java/lang/String".to_string())],
            Type::Void,
        );
        assert_eq!(m.descriptor(), "(ILjava/lang/String;)V");
        let flags = MethodFlags::from_bits_truncate(0x10009);
        assert_eq!(flags.modifiers(), vec!["public", "static", "constructor"]);
    }
}
