//! Translation of one method definition.
//!
//! A [`MethodWriter`] owns all the state of one method translation: the
//! address map, the pending idioms and the numbering counters. Nothing
//! survives the method, so methods can be translated in any order.

mod decoder;
mod handlers;

use crate::addrmap::AddressMap;
use crate::errors::FactsResult;
use crate::hierarchy::FieldOp;
use crate::patterns::{CarryOver, FillArrayEntry, PatternManager, SwitchEntry};
use crate::relations::Relation;
use crate::repr::{self, SessionCounter};
use crate::signatures::{MethodSig, SignatureCache};
use crate::sink::{self, FactSink};
use df_dex::code::{CodeItem, DebugItem};
use df_dex::methods::MethodDef;
use df_dex::registers::Reg;
use df_dex::values::EncodedValue;
use df_dex::{Addr, Container};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use self::handlers::MoveException;

const THROWS_ANNOTATION: &str = "dalvik.annotation.Throws";

/// Facts of a method that are not written directly.
#[derive(Debug)]
pub struct TranslatedMethod {
    pub id: String,
    pub instructions: usize,
    pub field_ops: Vec<FieldOp>,
}

pub struct MethodWriter<'a> {
    container: &'a Container,
    sink: &'a dyn FactSink,
    sigs: &'a SignatureCache,
    def: &'a MethodDef,
    sig: Arc<MethodSig>,
    is_static: bool,
    local_reg_count: usize,
    counter: SessionCounter,
    lines: BTreeMap<Addr, u32>,
    addresses: AddressMap,
    current_addr: Addr,
    carry: CarryOver,
    fill_arrays: PatternManager<FillArrayEntry>,
    switches: PatternManager<SwitchEntry>,
    exception_moves: Vec<MoveException>,
    declared_vars: HashSet<String>,
    field_ops: Vec<FieldOp>,
}

impl<'a> MethodWriter<'a> {
    pub fn new(
        container: &'a Container,
        sink: &'a dyn FactSink,
        sigs: &'a SignatureCache,
        def: &'a MethodDef,
    ) -> FactsResult<Self> {
        let sig = sigs.method(container, def.method())?;
        let is_static = def.is_static();
        let local_reg_count = def.code().map_or(0, |code| {
            let params_width = sig.params_width() + usize::from(!is_static);
            usize::from(code.registers_size())
                .checked_sub(params_width)
                .unwrap_or_else(|| {
                    warn!(
                        "{}: {} registers cannot hold {params_width} parameter registers",
                        sig.id(),
                        code.registers_size()
                    );
                    0
                })
        });

        Ok(Self {
            container,
            sink,
            sigs,
            def,
            sig,
            is_static,
            local_reg_count,
            counter: SessionCounter::new(),
            lines: BTreeMap::new(),
            addresses: AddressMap::new(),
            current_addr: Addr::entry(),
            carry: CarryOver::new(),
            fill_arrays: PatternManager::new(),
            switches: PatternManager::new(),
            exception_moves: Vec::new(),
            declared_vars: HashSet::new(),
            field_ops: Vec::new(),
        })
    }

    /// Method id, `<C: R name(P)>`.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        self.sig.id()
    }

    /// Writes every fact of the method. Fails on the first fatal decoding
    /// error, in which case the facts already written are kept.
    pub fn write(mut self) -> FactsResult<TranslatedMethod> {
        self.write_header();

        let mut instructions = 0;
        let def = self.def;
        if let Some(code) = def.code() {
            instructions = self.write_code(code)?;
        }

        Ok(TranslatedMethod {
            id: self.sig.id().to_string(),
            instructions,
            field_ops: self.field_ops,
        })
    }

    fn write_header(&mut self) {
        let def = self.def;
        let sig = Arc::clone(&self.sig);
        let m = sig.id();

        self.add(
            Relation::Method,
            &[
                m,
                sig.name(),
                &sig.params_signature(),
                sig.class(),
                sig.return_type(),
                sig.descriptor(),
                &sig.arity().to_string(),
            ],
        );

        for annotation in def.annotations() {
            let annotation_type = annotation.type_().to_java_string();
            self.add(Relation::MethodAnnotation, &[m, &annotation_type]);
            if annotation_type != THROWS_ANNOTATION {
                continue;
            }
            if let Some(EncodedValue::Array(values)) = annotation.element("value") {
                for value in values {
                    if let EncodedValue::Type(exception) = value {
                        self.add(
                            Relation::MethodDeclaresException,
                            &[&exception.to_java_string(), m],
                        );
                    }
                }
            }
        }

        for modifier in def.flags().modifiers() {
            self.add(Relation::MethodModifier, &[modifier, m]);
        }

        // parameters are named after their register offset, like the
        // registers holding them in the body
        let mut offset = usize::from(!self.is_static);
        for (i, (param, param_type)) in sig.params().iter().zip(sig.param_types()).enumerate() {
            let var = repr::param(m, offset);
            let pos = i.to_string();
            self.declare(&var);
            self.add(Relation::FormalParam, &[&pos, m, &var]);
            self.add(Relation::VarType, &[&var, param]);
            for annotation in def.parameter_annotations(i) {
                self.add(
                    Relation::ParamAnnotation,
                    &[m, &pos, &annotation.type_().to_java_string()],
                );
            }
            offset += param_type.reg_width();
        }

        if !self.is_static {
            let this = repr::this_var(m);
            self.declare(&this);
            self.add(Relation::ThisVar, &[m, &this]);
            self.add(Relation::VarType, &[&this, sig.class()]);
        }

        if def.is_native() {
            let native_id = repr::native_method_id(sig.class(), sig.name());
            self.add(Relation::NativeMethodId, &[m, &native_id]);
            if !sig.returns_void() {
                let var = repr::native_return_var(m);
                self.declare(&var);
                self.add(Relation::NativeReturnVar, &[&var, m]);
                self.add(Relation::VarType, &[&var, sig.return_type()]);
            }
        }
    }

    fn write_code(&mut self, code: &'a CodeItem) -> FactsResult<usize> {
        self.read_debug_items(code);

        let mut count = 0;
        for labeled in code.iter_labeled() {
            self.current_addr = labeled.addr();
            self.addresses.insert(labeled.addr(), labeled.index());
            self.decode(labeled.index(), labeled.instr())?;
            count += 1;
        }
        // one past the end, target of exception ranges covering the last
        // instruction
        self.addresses.insert(code.end_addr(), count + 1);

        self.fill_arrays
            .check_everything_consumed("fill-array-data", self.sig.id());
        self.switches.check_everything_consumed("switch", self.sig.id());

        self.write_exception_handlers(code.tries());

        let unresolved = self.addresses.resolve_and_write(self.sink, self.sig.id());
        if unresolved > 0 {
            debug!("{}: {unresolved} unresolved edges", self.sig.id());
        }
        Ok(count)
    }

    fn read_debug_items(&mut self, code: &CodeItem) {
        for item in code.debug_items() {
            match item {
                DebugItem::LineNumber { addr, line } => {
                    self.lines.insert(*addr, *line);
                }
                DebugItem::PrologueEnd { addr } if addr.0 != 0 => {
                    info!(
                        "{}: prologue ends at address {addr}, instructions start there",
                        self.sig.id()
                    );
                }
                _ => (),
            }
        }
    }

    #[inline]
    fn add(&self, relation: Relation, columns: &[&str]) {
        self.sink.add(relation, columns);
    }

    /// Source line of the current instruction: the line of the closest
    /// line table entry at or before its address.
    fn line(&self) -> Option<u32> {
        self.lines
            .range(..=self.current_addr)
            .next_back()
            .map(|(_, line)| *line)
    }

    fn declare(&mut self, var: &str) {
        if self.declared_vars.insert(var.to_string()) {
            self.sink
                .add(Relation::VarDeclaringMethod, &[var, self.sig.id()]);
        }
    }

    /// Variable of a register: a local below the local register count, a
    /// parameter above.
    fn local(&mut self, reg: Reg) -> String {
        let r = usize::from(reg.value());
        let var = if r < self.local_reg_count {
            repr::local(self.sig.id(), r)
        } else {
            repr::param(self.sig.id(), r - self.local_reg_count)
        };
        self.declare(&var);
        var
    }

    fn insn(&self, kind: &str, index: usize) -> String {
        repr::instruction_id(self.sig.id(), kind, index)
    }

    fn numbered_insn(&mut self, kind: &str) -> String {
        repr::numbered_instruction_id(self.sig.id(), kind, &mut self.counter)
    }

    fn container(&self) -> &'a Container {
        self.container
    }

    fn write_string_constant(&self, constant: &str) -> String {
        sink::write_string_constant(self.sink, constant)
    }

    /// Writes a fresh heap allocation of `type_` assigned to `var` by the
    /// instruction at `index`, and returns the heap id.
    fn heap_allocation(&mut self, index: usize, type_: &str, var: &str, empty: bool) -> String {
        let heap = repr::heap_alloc_id(self.sig.id(), type_, &mut self.counter);
        let insn = self.insn(decoder::ASSIGN, index);
        let line = repr::str_of_line(self.line());
        self.add(Relation::NormalHeap, &[&heap, type_]);
        self.add(
            Relation::AssignHeapAllocation,
            &[&insn, &index.to_string(), &heap, var, self.sig.id(), &line],
        );
        if empty {
            self.add(Relation::EmptyArray, &[&heap]);
        }
        heap
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::sink::MemorySink;

    /// Reference tables of the test container. Method 0 is the translated
    /// one, `a.Main.run(long, int)`, taking three parameter registers.
    const TABLES: &str = r#"
        "types": [
            "[I", "La/Main;", "Ljava/lang/String;", "Ljava/io/IOException;",
            "Ljava/lang/RuntimeException;", "[Ljava/lang/String;", "Ljava/lang/Object;"
        ],
        "strings": ["hello", ""],
        "fields": [
            {"class": "La/Main;", "name": "count", "type": "I"},
            {"class": "La/Main;", "name": "NAME", "type": "Ljava/lang/String;"}
        ],
        "methods": [
            {"class": "La/Main;", "name": "run", "params": ["J", "I"], "return": "V"},
            {"class": "La/Util;", "name": "compute", "params": [], "return": "I"},
            {"class": "La/Util;", "name": "join", "params": ["Ljava/lang/String;", "J"], "return": "Ljava/lang/String;"},
            {"class": "La/Main;", "name": "size", "params": [], "return": "I"}
        ],
        "protos": [
            {"params": ["I"], "return": "Ljava/lang/String;"}
        ],
        "method_handles": [
            {"kind": "invoke-static", "target": {"method": 1}},
            {"kind": "static-get", "target": {"field": 0}}
        ],
        "call_sites": [
            {"bootstrap": 0, "name": "apply", "proto": 0}
        ]"#;

    /// Container with one class `a.Main` defining method 0 with the given
    /// access flags and code item (JSON).
    pub(crate) fn container(flags: u32, code: &str) -> Container {
        let json = format!(
            r#"{{{TABLES},
            "classes": [{{
                "class": "La/Main;",
                "superclass": "Ljava/lang/Object;",
                "access_flags": 1,
                "methods": [{{"method": 0, "access_flags": {flags}, "code": {code}}}]
            }}]}}"#
        );
        Container::from_json(&json).unwrap()
    }

    pub(crate) fn row(columns: &[&str]) -> Vec<String> {
        columns.iter().map(ToString::to_string).collect()
    }

    /// Translates method 0 of `container` into a fresh sink.
    pub(crate) fn translate(container: &Container) -> (MemorySink, FactsResult<TranslatedMethod>) {
        let sink = MemorySink::new();
        let sigs = SignatureCache::new();
        let def = &container.classes()[0].methods()[0];
        let result = MethodWriter::new(container, &sink, &sigs, def).and_then(MethodWriter::write);
        (sink, result)
    }

    /// Translates a public static `run` with 8 registers (`v5`..`v7` hold the
    /// parameters) and the given instructions.
    pub(crate) fn translate_static(instructions: &str) -> (MemorySink, FactsResult<TranslatedMethod>) {
        let code = format!(r#"{{"registers_size": 8, "instructions": {instructions}}}"#);
        translate(&container(9, &code))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::sink::MemorySink;

    const RUN: &str = "<a.Main: void run(long,int)>";

    #[test]
    fn static_header() {
        let (sink, result) = translate_static(r#"[{"op": "return-void"}]"#);
        let translated = result.unwrap();
        assert_eq!(translated.id, RUN);
        assert_eq!(translated.instructions, 1);

        assert_eq!(
            sink.rows(Relation::Method),
            vec![vec![RUN, "run", "(long,int)", "a.Main", "void", "(JI)V", "2"]]
        );
        assert_eq!(
            sink.rows(Relation::MethodModifier),
            vec![vec!["public", RUN], vec!["static", RUN]]
        );
        // the long takes p0 and p1
        let (p0, p2) = (format!("{RUN}/p0"), format!("{RUN}/p2"));
        assert_eq!(
            sink.rows(Relation::FormalParam),
            vec![row(&["0", RUN, &p0]), row(&["1", RUN, &p2])]
        );
        assert_eq!(sink.count(Relation::ThisVar), 0);
        assert_eq!(
            sink.rows(Relation::ReturnVoid),
            vec![row(&[&format!("{RUN}/return-void/1"), "1", RUN])]
        );
    }

    #[test]
    fn instance_header() {
        let code = r#"{"registers_size": 5, "instructions": [{"op": "return", "args": 4}]}"#;
        let (sink, result) = translate(&container(1, code));
        result.unwrap();

        let this = format!("{RUN}/p0");
        let (p1, p3) = (format!("{RUN}/p1"), format!("{RUN}/p3"));
        assert_eq!(sink.rows(Relation::ThisVar), vec![row(&[RUN, &this])]);
        assert_eq!(
            sink.rows(Relation::FormalParam),
            vec![row(&["0", RUN, &p1]), row(&["1", RUN, &p3])]
        );
        assert!(sink
            .rows(Relation::VarType)
            .contains(&row(&[&this, "a.Main"])));
        // one local register, v1 is the receiver
        assert_eq!(
            sink.rows(Relation::Return),
            vec![row(&[&format!("{RUN}/return/1"), "1", &p3, RUN])]
        );
    }

    #[test]
    fn native_and_annotations() {
        let json = format!(
            r#"{{{},
            "classes": [{{
                "class": "La/Util;",
                "access_flags": 1,
                "methods": [{{
                    "method": 1,
                    "access_flags": 265,
                    "annotations": [{{
                        "type": "Ldalvik/annotation/Throws;",
                        "elements": [{{"name": "value", "value": {{"array": [{{"type": "Ljava/io/IOException;"}}]}}}}]
                    }}]
                }}]
            }}]}}"#,
            r#""methods": [
                {"class": "La/Main;", "name": "run", "params": ["J", "I"], "return": "V"},
                {"class": "La/b/Util;", "name": "compute", "params": [], "return": "I"}
            ]"#
        );
        let container = Container::from_json(&json).unwrap();
        let sink = MemorySink::new();
        let sigs = SignatureCache::new();
        let def = &container.classes()[0].methods()[0];
        let translated = MethodWriter::new(&container, &sink, &sigs, def)
            .and_then(MethodWriter::write)
            .unwrap();
        assert_eq!(translated.instructions, 0);

        let m = "<a.b.Util: int compute()>";
        assert_eq!(
            sink.rows(Relation::NativeMethodId),
            vec![vec![m, "Java_a_b_Util_compute"]]
        );
        assert_eq!(
            sink.rows(Relation::NativeReturnVar),
            vec![row(&[&format!("{m}/@native-return"), m])]
        );
        assert_eq!(
            sink.rows(Relation::MethodDeclaresException),
            vec![vec!["java.io.IOException", m]]
        );
        assert_eq!(
            sink.rows(Relation::MethodAnnotation),
            vec![vec![m, "dalvik.annotation.Throws"]]
        );
    }

    #[test]
    fn address_map_has_one_past_the_end_entry() {
        let (sink, result) = translate_static(
            r#"[
                {"op": "const16", "args": [0, 300]},
                {"op": "nop"},
                {"op": "return-void"}
            ]"#,
        );
        assert_eq!(result.unwrap().instructions, 3);
        let map = sink.rows(Relation::DexInstructionAddressMap);
        let entries: Vec<(&str, &str)> = map
            .iter()
            .map(|row| (row[1].as_str(), row[2].as_str()))
            .collect();
        assert_eq!(entries, vec![("1", "0"), ("2", "2"), ("3", "3"), ("4", "4")]);
    }

    #[test]
    fn locals_are_declared_once() {
        let (sink, result) = translate_static(
            r#"[
                {"op": "move", "args": [0, 1]},
                {"op": "move", "args": [1, 0]},
                {"op": "return-void"}
            ]"#,
        );
        result.unwrap();
        let declared: Vec<String> = sink
            .rows(Relation::VarDeclaringMethod)
            .into_iter()
            .map(|row| row[0].clone())
            .collect();
        assert_eq!(
            declared,
            vec![
                format!("{RUN}/p0"),
                format!("{RUN}/p2"),
                format!("{RUN}/v1"),
                format!("{RUN}/v0")
            ]
        );
    }

    #[test]
    fn lines_of_instructions() {
        let code = r#"{
            "registers_size": 8,
            "instructions": [
                {"op": "new-instance", "args": [0, 1]},
                {"op": "new-instance", "args": [1, 1]},
                {"op": "return-void"}
            ],
            "debug_items": [{"kind": "line-number", "addr": 2, "line": 40}]
        }"#;
        let (sink, result) = translate(&container(9, code));
        result.unwrap();
        let lines: Vec<String> = sink
            .rows(Relation::AssignHeapAllocation)
            .into_iter()
            .map(|row| row[5].clone())
            .collect();
        assert_eq!(lines, vec!["-1", "40"]);
    }

    #[test]
    fn translation_is_repeatable() {
        let instructions = r#"[
            {"op": "const4", "args": [0, 0]},
            {"op": "if-eqz", "args": [0, 6]},
            {"op": "invoke-static", "args": [[], 1]},
            {"op": "move-result", "args": 1},
            {"op": "return-void"}
        ]"#;
        let (first, _) = translate_static(instructions);
        let (second, _) = translate_static(instructions);
        for relation in first.relations() {
            assert_eq!(first.rows(relation), second.rows(relation));
        }
        assert_eq!(first.relations(), second.relations());
    }
}
