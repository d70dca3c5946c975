//! Identifiers of facts entities.
//!
//! Every entity written in a fact (method, variable, instruction, heap
//! allocation...) is named by a string built from the identifier of its
//! enclosing method. Numbered identifiers use a [`SessionCounter`] so that
//! two occurrences of the same kind in one method get distinct names.

use std::collections::HashMap;

/// Per-method counters of numbered identifiers, one counter per kind.
#[derive(Debug, Default)]
pub struct SessionCounter {
    counters: HashMap<String, usize>,
}

impl SessionCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next number of the given kind, starting at 0.
    pub fn next_number(&mut self, kind: &str) -> usize {
        let counter = self.counters.entry(kind.to_string()).or_insert(0);
        let n = *counter;
        *counter += 1;
        n
    }
}

/// `<C: R name(P1,P2)>`
#[must_use]
pub fn method_id(class: &str, return_type: &str, name: &str, params: &[String]) -> String {
    format!("<{class}: {return_type} {name}({})>", params.join(","))
}

/// `<C: T name>`
#[must_use]
pub fn field_id(class: &str, type_: &str, name: &str) -> String {
    format!("<{class}: {type_} {name}>")
}

#[must_use]
pub fn class_constant(class: &str) -> String {
    format!("<class {class}>")
}

#[must_use]
pub fn method_handle_constant(handle: &str) -> String {
    format!("<handle {handle}>")
}

/// `(P1,P2)R`
#[must_use]
pub fn method_type_constant(params: &[String], return_type: &str) -> String {
    format!("({}){return_type}", params.join(","))
}

#[must_use]
pub fn local(method: &str, reg: usize) -> String {
    format!("{method}/v{reg}")
}

#[must_use]
pub fn param(method: &str, n: usize) -> String {
    format!("{method}/p{n}")
}

#[must_use]
pub fn this_var(method: &str) -> String {
    param(method, 0)
}

#[must_use]
pub fn native_return_var(method: &str) -> String {
    format!("{method}/@native-return")
}

/// JNI symbol of a native method.
#[must_use]
pub fn native_method_id(class: &str, name: &str) -> String {
    format!("Java_{}_{name}", class.replace('.', "_"))
}

#[must_use]
pub fn instruction_id(method: &str, kind: &str, index: usize) -> String {
    format!("{method}/{kind}/{index}")
}

#[must_use]
pub fn numbered_instruction_id(method: &str, kind: &str, counter: &mut SessionCounter) -> String {
    instruction_id(method, kind, counter.next_number(kind))
}

#[must_use]
pub fn heap_alloc_id(method: &str, type_: &str, counter: &mut SessionCounter) -> String {
    format!("{method}/new {type_}/{}", counter.next_number(type_))
}

#[must_use]
pub fn handler_kind(exception_type: &str) -> String {
    format!("catch {exception_type}")
}

#[must_use]
pub fn throw_kind(var: &str) -> String {
    format!("throw {var}")
}

#[must_use]
pub fn str_of_line(line: Option<u32>) -> String {
    line.map_or_else(|| "-1".to_string(), |l| l.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_and_field_ids() {
        let params = vec!["int".to_string(), "java.lang.String".to_string()];
        assert_eq!(
            method_id("a.B", "void", "run", &params),
            "<a.B: void run(int,java.lang.String)>"
        );
        assert_eq!(method_id("a.B", "int", "get", &[]), "<a.B: int get()>");
        assert_eq!(field_id("a.B", "long", "count"), "<a.B: long count>");
        assert_eq!(native_method_id("a.b.C", "init"), "Java_a_b_C_init");
    }

    #[test]
    fn numbered_ids() {
        let mut counter = SessionCounter::new();
        assert_eq!(
            numbered_instruction_id("m", "a.B.run", &mut counter),
            "m/a.B.run/0"
        );
        assert_eq!(
            numbered_instruction_id("m", "a.B.run", &mut counter),
            "m/a.B.run/1"
        );
        assert_eq!(heap_alloc_id("m", "int[]", &mut counter), "m/new int[]/0");
        assert_eq!(heap_alloc_id("m", "a.B", &mut counter), "m/new a.B/0");
        assert_eq!(str_of_line(None), "-1");
    }
}
