//! Encoded constant values, as found in static field initializers and
//! annotation elements.

use crate::annotations::Annotation;
use crate::fields::FieldRef;
use crate::methods::{MethodHandleRef, MethodRef};
use crate::types::{ProtoRef, Type};
use crate::Index;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodedValue {
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    MethodType(Index<ProtoRef>),
    MethodHandle(Index<MethodHandleRef>),
    String(String),
    Type(Type),
    Field(Index<FieldRef>),
    Method(Index<MethodRef>),
    Enum(Index<FieldRef>),
    Array(Vec<EncodedValue>),
    Annotation(Annotation),
    Null,
    Boolean(bool),
}

impl EncodedValue {
    /// Checks if the value is one of the numeric kinds.
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(
            self,
            Self::Byte(_)
                | Self::Short(_)
                | Self::Int(_)
                | Self::Long(_)
                | Self::Float(_)
                | Self::Double(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_values() {
        let values: Vec<EncodedValue> = serde_json::from_str(
            r#"[{"int": 3}, {"string": "x"}, {"type": "Ljava/io/IOException;"}, "null", {"array": [{"byte": -1}]}]"#,
        )
        .unwrap();
        assert!(values[0].is_number());
        assert!(matches!(&values[2], EncodedValue::Type(Type::Class(c)) if c == "java/io/IOException"));
        assert!(matches!(values[3], EncodedValue::Null));
        assert!(matches!(&values[4], EncodedValue::Array(a) if a.len() == 1));
    }
}
