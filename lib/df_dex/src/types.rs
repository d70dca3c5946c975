//! Dalvik type descriptors and method prototypes.

use crate::errors::{DexError, DexResult};
use serde::Deserialize;
use std::fmt;

/// Dalvik concrete type descriptor type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Type {
    /// `void` type, only valid for return types.
    Void,
    /// `boolean` type.
    Boolean,
    /// `byte` type.
    Byte,
    /// `short` type.
    Short,
    /// `char` type.
    Char,
    /// `int` type.
    Int,
    /// `long` type.
    Long,
    /// `float` type.
    Float,
    /// `double` type.
    Double,
    /// Array of the given type descriptor, usable recursively for arrays of arrays,
    /// though it is invalid to have more than 255 dimensions.
    Array(usize, Box<Self>),
    /// Type of a fully-qualified class, in its slashed internal form.
    Class(String),
}

impl Type {
    /// Returns the java-like representation of the type, as found in facts
    /// (`Ljava/lang/String;` gives `java.lang.String`, `[[I` gives `int[][]`).
    /// Its result differs from the `Display` implementation, which produces
    /// strings in the Dalvik format.
    #[must_use]
    pub fn to_java_string(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Byte => "byte".to_string(),
            Self::Short => "short".to_string(),
            Self::Char => "char".to_string(),
            Self::Int => "int".to_string(),
            Self::Long => "long".to_string(),
            Self::Float => "float".to_string(),
            Self::Double => "double".to_string(),
            Self::Array(n, sub) => {
                let mut s = sub.to_java_string();
                for _ in 0..*n {
                    s.push_str("[]");
                }
                s
            }
            Self::Class(name) => name.replace('/', "."),
        }
    }

    pub fn as_class_name(&self) -> DexResult<&str> {
        if let Self::Class(name) = self {
            Ok(name)
        } else {
            Err(DexError::InvalidType)
        }
    }

    /// Checks if values of this type take a register pair.
    #[inline]
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        matches!(self, Self::Long | Self::Double)
    }

    /// Number of registers holding a value of this type.
    #[inline]
    #[must_use]
    pub const fn reg_width(&self) -> usize {
        if self.is_wide() {
            2
        } else {
            1
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_, _))
    }

    #[inline]
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Array(_, _) | Self::Class(_))
    }

    /// Returns the type of the elements of an array type, one dimension down.
    #[must_use]
    pub fn component_type(&self) -> Option<Self> {
        match self {
            Self::Array(1, inner) => Some(inner.as_ref().clone()),
            Self::Array(n, inner) => Some(Self::Array(n - 1, inner.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Void => write!(f, "V"),
            Self::Boolean => write!(f, "Z"),
            Self::Byte => write!(f, "B"),
            Self::Short => write!(f, "S"),
            Self::Char => write!(f, "C"),
            Self::Int => write!(f, "I"),
            Self::Long => write!(f, "J"),
            Self::Float => write!(f, "F"),
            Self::Double => write!(f, "D"),
            Self::Array(n, inner) => {
                for _ in 0..*n {
                    write!(f, "[")?;
                }
                write!(f, "{inner}")
            }
            Self::Class(classname) => write!(f, "L{classname};"),
        }
    }
}

fn conversion_error(s: &str) -> DexError {
    DexError::Conversion {
        from: format!("&str ({s:?})"),
        to: "Type".to_string(),
    }
}

impl TryFrom<&str> for Type {
    type Error = DexError;

    fn try_from(s: &str) -> DexResult<Self> {
        if s == "V" {
            return Ok(Self::Void);
        }

        let dims = s.bytes().take_while(|b| *b == b'[').count();
        if dims >= s.len() || dims > 255 {
            return Err(conversion_error(s));
        }

        let t = match &s[dims..] {
            "Z" => Self::Boolean,
            "B" => Self::Byte,
            "S" => Self::Short,
            "C" => Self::Char,
            "I" => Self::Int,
            "J" => Self::Long,
            "F" => Self::Float,
            "D" => Self::Double,
            sub => match sub.strip_prefix('L').and_then(|c| c.strip_suffix(';')) {
                Some(name) if !name.is_empty() => Self::Class(name.to_string()),
                _ => return Err(conversion_error(s)),
            },
        };
        if dims == 0 {
            Ok(t)
        } else {
            Ok(Self::Array(dims, Box::new(t)))
        }
    }
}

impl TryFrom<String> for Type {
    type Error = DexError;

    fn try_from(s: String) -> DexResult<Self> {
        Self::try_from(s.as_str())
    }
}

/// A method prototype: parameters and return types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ProtoRef {
    params: Vec<Type>,
    #[serde(rename = "return")]
    ret: Type,
}

impl ProtoRef {
    #[must_use]
    pub const fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { params, ret }
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_parsing() {
        assert_eq!(Type::try_from("I").unwrap(), Type::Int);
        assert_eq!(
            Type::try_from("Ljava/lang/String;").unwrap(),
            Type::Class("java/lang/String".to_string())
        );
        assert_eq!(
            Type::try_from("[[J").unwrap(),
            Type::Array(2, Box::new(Type::Long))
        );
        assert!(Type::try_from("").is_err());
        assert!(Type::try_from("[").is_err());
        assert!(Type::try_from("L;").is_err());
        assert!(Type::try_from("Q").is_err());
    }

    #[test]
    fn java_names() {
        let t = Type::try_from("[[Ljava/lang/String;").unwrap();
        assert_eq!(t.to_java_string(), "java.lang.String[][]");
        assert_eq!(format!("{t}"), "[[Ljava/lang/String;");
        assert_eq!(
            t.component_type().unwrap().to_java_string(),
            "java.lang.String[]"
        );
        assert_eq!(Type::Double.reg_width(), 2);
        assert_eq!(Type::Class("a/B".to_string()).reg_width(), 1);
    }
}
