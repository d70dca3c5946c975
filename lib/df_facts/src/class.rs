//! Translation of one class definition.

use crate::driver::Options;
use crate::errors::FactsResult;
use crate::hierarchy::FieldOp;
use crate::method::MethodWriter;
use crate::relations::Relation;
use crate::signatures::{FieldSig, SignatureCache};
use crate::sink::{self, FactSink};
use df_dex::classes::{ClassDef, ClassFlags};
use df_dex::fields::FieldDef;
use df_dex::values::EncodedValue;
use df_dex::Container;
use log::{debug, error};
use std::fmt;
use std::sync::Arc;

const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// What a class translation hands over to the hierarchy reporter and the
/// run statistics.
#[derive(Debug, Default)]
pub struct TranslatedClass {
    pub name: String,
    pub super_class: Option<String>,
    pub defined_methods: Vec<String>,
    pub defined_fields: Vec<Arc<FieldSig>>,
    pub field_ops: Vec<FieldOp>,
    pub methods: usize,
    pub instructions: usize,
    pub failures: usize,
}

/// Kinds of field initial values.
enum InitialValue {
    Number(String),
    String(String),
    Other(String),
}

impl InitialValue {
    /// Returns the text of a constant initializer, `None` for values without
    /// a fact representation (null, arrays, references).
    fn of(value: &EncodedValue) -> Option<Self> {
        let value = match value {
            EncodedValue::Byte(v) => Self::Number(v.to_string()),
            EncodedValue::Short(v) => Self::Number(v.to_string()),
            EncodedValue::Int(v) => Self::Number(v.to_string()),
            EncodedValue::Long(v) => Self::Number(v.to_string()),
            EncodedValue::Float(v) => Self::Number(java_float(*v)),
            EncodedValue::Double(v) => Self::Number(java_float(*v)),
            EncodedValue::Char(c) => Self::Other(
                char::from_u32(u32::from(*c)).map_or_else(|| c.to_string(), String::from),
            ),
            EncodedValue::Boolean(b) => Self::Other(b.to_string()),
            EncodedValue::String(s) => Self::String(s.clone()),
            EncodedValue::Null => return None,
            EncodedValue::Array(_) => {
                debug!("array initial values are not translated");
                return None;
            }
            EncodedValue::MethodType(_)
            | EncodedValue::MethodHandle(_)
            | EncodedValue::Type(_)
            | EncodedValue::Field(_)
            | EncodedValue::Method(_)
            | EncodedValue::Enum(_)
            | EncodedValue::Annotation(_) => {
                debug!("reference initial values are not translated");
                return None;
            }
        };
        Some(value)
    }

    fn text(&self) -> &str {
        match self {
            Self::Number(s) | Self::String(s) | Self::Other(s) => s,
        }
    }
}

/// Floating point text as printed by Java.
fn java_float<F: Into<f64> + fmt::Debug + Copy>(v: F) -> String {
    let wide: f64 = v.into();
    if wide.is_nan() {
        "NaN".to_string()
    } else if wide == f64::INFINITY {
        "Infinity".to_string()
    } else if wide == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{v:?}")
    }
}

pub struct ClassWriter<'a> {
    container: &'a Container,
    sink: &'a dyn FactSink,
    sigs: &'a SignatureCache,
    options: &'a Options,
    def: &'a ClassDef,
    name: String,
}

impl<'a> ClassWriter<'a> {
    #[must_use]
    pub fn new(
        container: &'a Container,
        sink: &'a dyn FactSink,
        sigs: &'a SignatureCache,
        options: &'a Options,
        def: &'a ClassDef,
    ) -> Self {
        Self {
            container,
            sink,
            sigs,
            options,
            def,
            name: def.name(),
        }
    }

    /// Writes the facts of the class and of all its members: class type and
    /// supertypes first, then fields, then methods.
    ///
    /// A failing field or method is logged and skipped, unless fail fast is
    /// set in which case its error is returned.
    pub fn write(self) -> FactsResult<TranslatedClass> {
        let mut translated = TranslatedClass {
            name: self.name.clone(),
            ..TranslatedClass::default()
        };

        if self.options.is_application_class(&self.name) {
            self.sink.add(Relation::ApplicationClass, &[&self.name]);
        }

        translated.super_class = self.write_class_type();

        for annotation in self.def.annotations() {
            self.sink.add(
                Relation::TypeAnnotation,
                &[&self.name, &annotation.type_().to_java_string()],
            );
        }

        for field in self.def.fields() {
            match self.write_field(field) {
                Ok(field) => translated.defined_fields.push(field),
                Err(err) if self.options.fail_fast => return Err(err),
                Err(err) => {
                    error!("in class {}: {err}", self.name);
                    translated.failures += 1;
                }
            }
        }

        for method in self.def.methods() {
            let result = MethodWriter::new(self.container, self.sink, self.sigs, method)
                .and_then(MethodWriter::write);
            match result {
                Ok(method) => {
                    translated.methods += 1;
                    translated.instructions += method.instructions;
                    translated.defined_methods.push(method.id);
                    translated.field_ops.extend(method.field_ops);
                }
                Err(err) if self.options.fail_fast => return Err(err),
                Err(err) => {
                    error!("in class {}: {err}", self.name);
                    translated.failures += 1;
                }
            }
        }

        Ok(translated)
    }

    fn write_field(&self, def: &FieldDef) -> FactsResult<Arc<FieldSig>> {
        let field = self.sigs.field(self.container, def.field())?;
        let id = field.id();
        self.sink.add(
            Relation::Field,
            &[id, field.class(), field.name(), field.type_()],
        );

        if let Some(value) = def.initial_value().and_then(InitialValue::of) {
            self.sink.add(Relation::FieldInitialValue, &[id, value.text()]);
            match &value {
                InitialValue::Number(n) if matches!(field.type_(), "int" | "long") => {
                    self.sink.add(Relation::NumConstantRaw, &[n, field.type_()]);
                }
                InitialValue::String(s) => {
                    sink::write_string_constant(self.sink, s);
                }
                _ => (),
            }
        }

        for modifier in def.flags().modifiers() {
            self.sink.add(Relation::FieldModifier, &[modifier, id]);
        }
        for annotation in def.annotations() {
            self.sink.add(
                Relation::FieldAnnotation,
                &[id, &annotation.type_().to_java_string()],
            );
        }
        Ok(field)
    }

    /// Writes the kind, modifiers and supertypes of the class. Returns the
    /// super class.
    fn write_class_type(&self) -> Option<String> {
        let flags = self.def.flags();
        for modifier in (flags - ClassFlags::ACC_INTERFACE).modifiers() {
            self.sink.add(Relation::ClassModifier, &[modifier, &self.name]);
        }
        if self.def.is_interface() {
            self.sink.add(Relation::InterfaceType, &[&self.name]);
        } else {
            self.sink.add(Relation::ClassType, &[&self.name]);
        }

        let super_class = self.def.superclass().map(|t| t.to_java_string());
        match &super_class {
            Some(super_class) => {
                self.sink
                    .add(Relation::DirectSuperclass, &[&self.name, super_class]);
            }
            None if self.name == JAVA_LANG_OBJECT => (),
            None => error!("no super class found for {}", self.name),
        }

        for interface in self.def.interfaces() {
            self.sink.add(
                Relation::DirectSuperinterface,
                &[&self.name, &interface.to_java_string()],
            );
        }
        super_class
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FactsError;
    use crate::sink::MemorySink;
    use regex::Regex;

    const CONTAINER: &str = r#"{
        "types": ["La/Main;"],
        "strings": [],
        "fields": [
            {"class": "La/Main;", "name": "count", "type": "I"},
            {"class": "La/Main;", "name": "NAME", "type": "Ljava/lang/String;"},
            {"class": "La/Main;", "name": "ratio", "type": "D"},
            {"class": "La/Main;", "name": "letter", "type": "C"},
            {"class": "La/Main;", "name": "items", "type": "[I"}
        ],
        "methods": [
            {"class": "La/Main;", "name": "ok", "params": [], "return": "V"},
            {"class": "La/Main;", "name": "broken", "params": [], "return": "I"}
        ],
        "classes": [{
            "class": "La/Main;",
            "superclass": "Ljava/lang/Object;",
            "interfaces": ["Ljava/lang/Runnable;"],
            "access_flags": 17,
            "annotations": [{"type": "Lx/Marker;"}],
            "fields": [
                {"field": 0, "access_flags": 26, "initial_value": {"int": 42}},
                {"field": 1, "access_flags": 25, "initial_value": {"string": "hi"}},
                {"field": 2, "access_flags": 8, "initial_value": {"double": 0.5}},
                {"field": 3, "access_flags": 8, "initial_value": {"char": 65}},
                {"field": 4, "access_flags": 8, "initial_value": "null"}
            ],
            "methods": [
                {"method": 0, "access_flags": 9, "code": {"registers_size": 1, "instructions": [{"op": "return-void"}]}},
                {"method": 1, "access_flags": 9, "code": {"registers_size": 1, "instructions": [{"op": "move-result", "args": 0}]}}
            ]
        }]
    }"#;

    fn translate(options: &Options) -> (MemorySink, FactsResult<TranslatedClass>) {
        let container = Container::from_json(CONTAINER).unwrap();
        let sink = MemorySink::new();
        let sigs = SignatureCache::new();
        let def = &container.classes()[0];
        let result = ClassWriter::new(&container, &sink, &sigs, options, def).write();
        (sink, result)
    }

    #[test]
    fn tolerant_translation() {
        let (sink, result) = translate(&Options::default());
        let translated = result.unwrap();
        assert_eq!(translated.name, "a.Main");
        assert_eq!(translated.methods, 1);
        assert_eq!(translated.failures, 1);
        assert_eq!(translated.defined_methods, vec!["<a.Main: void ok()>"]);
        assert_eq!(translated.defined_fields.len(), 5);
        assert_eq!(translated.super_class.as_deref(), Some("java.lang.Object"));

        assert_eq!(sink.rows(Relation::ApplicationClass), vec![vec!["a.Main"]]);
        assert_eq!(
            sink.rows(Relation::ClassModifier),
            vec![vec!["public", "a.Main"], vec!["final", "a.Main"]]
        );
        assert_eq!(sink.rows(Relation::ClassType), vec![vec!["a.Main"]]);
        assert_eq!(
            sink.rows(Relation::DirectSuperclass),
            vec![vec!["a.Main", "java.lang.Object"]]
        );
        assert_eq!(
            sink.rows(Relation::DirectSuperinterface),
            vec![vec!["a.Main", "java.lang.Runnable"]]
        );
        assert_eq!(
            sink.rows(Relation::TypeAnnotation),
            vec![vec!["a.Main", "x.Marker"]]
        );
    }

    #[test]
    fn fields() {
        let (sink, result) = translate(&Options::default());
        result.unwrap();
        assert_eq!(
            sink.rows(Relation::Field)[0],
            vec!["<a.Main: int count>", "a.Main", "count", "int"]
        );
        assert_eq!(
            sink.rows(Relation::FieldInitialValue),
            vec![
                vec!["<a.Main: int count>", "42"],
                vec!["<a.Main: java.lang.String NAME>", "hi"],
                vec!["<a.Main: double ratio>", "0.5"],
                vec!["<a.Main: char letter>", "A"],
            ]
        );
        // only int and long initial values are numeric constants
        assert_eq!(sink.rows(Relation::NumConstantRaw), vec![vec!["42", "int"]]);
        assert_eq!(sink.rows(Relation::StringConstant), vec![vec!["hi"]]);
        assert_eq!(
            sink.rows(Relation::FieldModifier)[..3],
            [
                vec!["private", "<a.Main: int count>"],
                vec!["static", "<a.Main: int count>"],
                vec!["final", "<a.Main: int count>"],
            ]
        );
    }

    #[test]
    fn fail_fast_translation() {
        let options = Options {
            fail_fast: true,
            ..Options::default()
        };
        let (_, result) = translate(&options);
        assert!(matches!(result, Err(FactsError::MissingResult { .. })));
    }

    #[test]
    fn broken_field_is_skipped() {
        let container = Container::from_json(
            r#"{
                "fields": [{"class": "La/Bad;", "name": "ok", "type": "I"}],
                "classes": [{
                    "class": "La/Bad;",
                    "superclass": "Ljava/lang/Object;",
                    "access_flags": 1,
                    "fields": [{"field": 7, "access_flags": 1}, {"field": 0, "access_flags": 1}]
                }]
            }"#,
        )
        .unwrap();
        let sink = MemorySink::new();
        let sigs = SignatureCache::new();
        let def = &container.classes()[0];

        let translated = ClassWriter::new(&container, &sink, &sigs, &Options::default(), def)
            .write()
            .unwrap();
        assert_eq!(translated.failures, 1);
        assert_eq!(translated.defined_fields.len(), 1);
        assert_eq!(
            sink.rows(Relation::Field),
            vec![vec!["<a.Bad: int ok>", "a.Bad", "ok", "int"]]
        );
        assert_eq!(sink.rows(Relation::ClassType), vec![vec!["a.Bad"]]);

        let options = Options {
            fail_fast: true,
            ..Options::default()
        };
        let result = ClassWriter::new(&container, &MemorySink::new(), &sigs, &options, def).write();
        assert!(result.is_err());
    }

    #[test]
    fn application_classes() {
        let options = Options {
            app_regex: Some(Regex::new(r"^b\.").unwrap()),
            ..Options::default()
        };
        let (sink, result) = translate(&options);
        result.unwrap();
        assert_eq!(sink.count(Relation::ApplicationClass), 0);
    }

    #[test]
    fn java_floats() {
        assert_eq!(java_float(1.0), "1.0");
        assert_eq!(java_float(-0.25), "-0.25");
        assert_eq!(java_float(f64::INFINITY), "Infinity");
        assert_eq!(java_float(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(java_float(f64::NAN), "NaN");
        assert_eq!(java_float(0.1f32), "0.1");
    }
}
