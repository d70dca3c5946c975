//! Instruction decoding.
//!
//! Every opcode of [`Instr`] is matched explicitly, without wildcard, so that
//! a new variant cannot be silently skipped.

use super::handlers::MoveException as PendingMoveException;
use super::MethodWriter;
use crate::addrmap::PendingEdge;
use crate::errors::{FactsError, FactsResult};
use crate::hierarchy::FieldOp;
use crate::patterns::{FillArrayEntry, NewArrayInfo, ResultProducer, SwitchEntry};
use crate::relations::Relation;
use crate::repr;
use crate::typeinfer;
use df_dex::fields::FieldRef;
use df_dex::instrs::{Instr, Instruction};
use df_dex::methods::{CallSiteRef, HandleTarget, MethodHandleRef, MethodRef};
use df_dex::registers::Reg;
use df_dex::types::{ProtoRef, Type};
use df_dex::{Addr, Index};
use log::{debug, warn};

pub(super) const ASSIGN: &str = "assign";

/// Operand positions of `IfVar` and `AssignOperFrom`.
const L_OP: &str = "1";
const R_OP: &str = "2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InvokeKind {
    Static,
    Special,
    Virtual,
    Super,
}

impl InvokeKind {
    const fn relation(self) -> Relation {
        match self {
            Self::Static => Relation::StaticMethodInvocation,
            Self::Special => Relation::SpecialMethodInvocation,
            Self::Virtual => Relation::VirtualMethodInvocation,
            Self::Super => Relation::SuperMethodInvocation,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldAccess {
    Load,
    Store,
}

impl<'a> MethodWriter<'a> {
    /// Writes the facts of the instruction at `index`, located at the
    /// current address.
    #[allow(clippy::enum_glob_use, clippy::too_many_lines)]
    pub(super) fn decode(&mut self, index: usize, instr: &'a Instr) -> FactsResult<()> {
        use Instr::*;

        match instr {
            Nop => (),

            Move(to, from)
            | MoveFrom16(to, from)
            | Move16(to, from)
            | MoveWide(to, from)
            | MoveWideFrom16(to, from)
            | MoveWide16(to, from)
            | MoveObject(to, from)
            | MoveObjectFrom16(to, from)
            | MoveObject16(to, from) => self.write_move(index, instr, *to, *from),
            MoveResult(reg) | MoveResultWide(reg) | MoveResultObject(reg) => {
                self.write_move_result(index, *reg)?;
            }
            MoveException(reg) => self.exception_moves.push(PendingMoveException {
                reg: *reg,
                addr: self.current_addr,
                index,
            }),

            ReturnVoid => {
                let insn = self.insn("return-void", index);
                self.add(
                    Relation::ReturnVoid,
                    &[&insn, &index.to_string(), self.id()],
                );
            }
            Return(reg) | ReturnWide(reg) | ReturnObject(reg) => self.write_return(index, *reg),

            Const4(reg, lit) => self.write_narrow_constant(index, instr, *reg, i64::from(*lit)),
            Const16(reg, lit) => self.write_narrow_constant(index, instr, *reg, i64::from(*lit)),
            Const(reg, lit) => self.write_narrow_constant(index, instr, *reg, i64::from(*lit)),
            ConstHigh16(reg, lit) => {
                self.write_narrow_constant(index, instr, *reg, i64::from(*lit) << 16);
            }
            ConstWide16(reg, lit) => self.write_num_constant(index, instr, *reg, i64::from(*lit)),
            ConstWide32(reg, lit) => self.write_num_constant(index, instr, *reg, i64::from(*lit)),
            ConstWide(reg, lit) => self.write_num_constant(index, instr, *reg, *lit),
            ConstWideHigh16(reg, lit) => {
                self.write_num_constant(index, instr, *reg, i64::from(*lit) << 48);
            }
            ConstString(reg, s) | ConstStringJumbo(reg, s) => {
                self.write_const_string(index, *reg, *s)?;
            }
            ConstClass(reg, t) => self.write_const_class(index, *reg, *t)?,

            MonitorEnter(reg) => {
                self.write_monitor(Relation::EnterMonitor, "enter-monitor", index, *reg);
            }
            MonitorExit(reg) => {
                self.write_monitor(Relation::ExitMonitor, "exit-monitor", index, *reg);
            }
            CheckCast(reg, t) => self.write_cast(index, *reg, *t)?,
            InstanceOf(to, from, t) => self.write_instance_of(index, *to, *from, *t)?,
            ArrayLength(to, array) => self.write_unop(index, instr, *to, *array),
            NewInstance(reg, t) => self.write_new_instance(index, *reg, *t)?,
            NewArray(reg, size, t) => self.write_new_array(index, *reg, *size, *t)?,
            FilledNewArray(regs, t) => self.write_filled_new_array(index, regs.iter().collect(), *t)?,
            FilledNewArrayRange(regs, t) => {
                self.write_filled_new_array(index, regs.iter().collect(), *t)?;
            }
            FillArrayData(reg, offset) => self.write_fill_array_data(index, *reg, *offset),

            Throw(reg) => self.write_throw(index, *reg),
            Goto(_) | Goto16(_) | Goto32(_) => {
                let insn = self.insn("goto", index);
                let target = self.branch_target(instr);
                self.addresses
                    .queue(PendingEdge::branch(Relation::Goto, insn, index, target));
            }
            PackedSwitch(reg, offset) => {
                self.write_switch(Relation::TableSwitch, index, *reg, *offset);
            }
            SparseSwitch(reg, offset) => {
                self.write_switch(Relation::LookupSwitch, index, *reg, *offset);
            }

            CmplFloat(to, a, b)
            | CmpgFloat(to, a, b)
            | CmplDouble(to, a, b)
            | CmpgDouble(to, a, b)
            | CmpLong(to, a, b) => self.write_binop(index, instr, *to, *a, Some(*b)),

            IfEq(a, b, _) => self.write_if(index, instr, "==", *a, Some(*b)),
            IfNe(a, b, _) => self.write_if(index, instr, "!=", *a, Some(*b)),
            IfLt(a, b, _) => self.write_if(index, instr, "<", *a, Some(*b)),
            IfGe(a, b, _) => self.write_if(index, instr, ">=", *a, Some(*b)),
            IfGt(a, b, _) => self.write_if(index, instr, ">", *a, Some(*b)),
            IfLe(a, b, _) => self.write_if(index, instr, "<=", *a, Some(*b)),
            IfEqz(a, _) => self.write_if(index, instr, "==", *a, None),
            IfNez(a, _) => self.write_if(index, instr, "!=", *a, None),
            IfLtz(a, _) => self.write_if(index, instr, "<", *a, None),
            IfGez(a, _) => self.write_if(index, instr, ">=", *a, None),
            IfGtz(a, _) => self.write_if(index, instr, ">", *a, None),
            IfLez(a, _) => self.write_if(index, instr, "<=", *a, None),

            Aget(value, array, idx)
            | AgetWide(value, array, idx)
            | AgetObject(value, array, idx)
            | AgetBoolean(value, array, idx)
            | AgetByte(value, array, idx)
            | AgetChar(value, array, idx)
            | AgetShort(value, array, idx) => {
                self.write_array_access(Relation::LoadArrayIndex, index, *value, *array, *idx);
            }
            Aput(value, array, idx)
            | AputWide(value, array, idx)
            | AputObject(value, array, idx)
            | AputBoolean(value, array, idx)
            | AputByte(value, array, idx)
            | AputChar(value, array, idx)
            | AputShort(value, array, idx) => {
                self.write_array_access(Relation::StoreArrayIndex, index, *value, *array, *idx);
            }

            Iget(value, object, field)
            | IgetWide(value, object, field)
            | IgetObject(value, object, field)
            | IgetBoolean(value, object, field)
            | IgetByte(value, object, field)
            | IgetChar(value, object, field)
            | IgetShort(value, object, field) => {
                self.write_field_access(FieldAccess::Load, index, *value, Some(*object), *field)?;
            }
            Iput(value, object, field)
            | IputWide(value, object, field)
            | IputObject(value, object, field)
            | IputBoolean(value, object, field)
            | IputByte(value, object, field)
            | IputChar(value, object, field)
            | IputShort(value, object, field) => {
                self.write_field_access(FieldAccess::Store, index, *value, Some(*object), *field)?;
            }
            Sget(value, field)
            | SgetWide(value, field)
            | SgetObject(value, field)
            | SgetBoolean(value, field)
            | SgetByte(value, field)
            | SgetChar(value, field)
            | SgetShort(value, field) => {
                self.write_field_access(FieldAccess::Load, index, *value, None, *field)?;
            }
            Sput(value, field)
            | SputWide(value, field)
            | SputObject(value, field)
            | SputBoolean(value, field)
            | SputByte(value, field)
            | SputChar(value, field)
            | SputShort(value, field) => {
                self.write_field_access(FieldAccess::Store, index, *value, None, *field)?;
            }

            InvokeVirtual(regs, m) | InvokeInterface(regs, m) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke(InvokeKind::Virtual, index, &regs, *m, None)?;
            }
            InvokeSuper(regs, m) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke(InvokeKind::Super, index, &regs, *m, None)?;
            }
            InvokeDirect(regs, m) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke(InvokeKind::Special, index, &regs, *m, None)?;
            }
            InvokeStatic(regs, m) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke(InvokeKind::Static, index, &regs, *m, None)?;
            }
            InvokeVirtualRange(regs, m) | InvokeInterfaceRange(regs, m) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke(InvokeKind::Virtual, index, &regs, *m, None)?;
            }
            InvokeSuperRange(regs, m) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke(InvokeKind::Super, index, &regs, *m, None)?;
            }
            InvokeDirectRange(regs, m) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke(InvokeKind::Special, index, &regs, *m, None)?;
            }
            InvokeStaticRange(regs, m) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke(InvokeKind::Static, index, &regs, *m, None)?;
            }

            NegInt(to, from)
            | NotInt(to, from)
            | NegLong(to, from)
            | NotLong(to, from)
            | NegFloat(to, from)
            | NegDouble(to, from)
            | IntToLong(to, from)
            | IntToFloat(to, from)
            | IntToDouble(to, from)
            | LongToInt(to, from)
            | LongToFloat(to, from)
            | LongToDouble(to, from)
            | FloatToInt(to, from)
            | FloatToLong(to, from)
            | FloatToDouble(to, from)
            | DoubleToInt(to, from)
            | DoubleToLong(to, from)
            | DoubleToFloat(to, from)
            | IntToByte(to, from)
            | IntToChar(to, from)
            | IntToShort(to, from) => self.write_unop(index, instr, *to, *from),

            AddInt(to, a, b)
            | SubInt(to, a, b)
            | MulInt(to, a, b)
            | DivInt(to, a, b)
            | RemInt(to, a, b)
            | AndInt(to, a, b)
            | OrInt(to, a, b)
            | XorInt(to, a, b)
            | ShlInt(to, a, b)
            | ShrInt(to, a, b)
            | UshrInt(to, a, b)
            | AddLong(to, a, b)
            | SubLong(to, a, b)
            | MulLong(to, a, b)
            | DivLong(to, a, b)
            | RemLong(to, a, b)
            | AndLong(to, a, b)
            | OrLong(to, a, b)
            | XorLong(to, a, b)
            | ShlLong(to, a, b)
            | ShrLong(to, a, b)
            | UshrLong(to, a, b)
            | AddFloat(to, a, b)
            | SubFloat(to, a, b)
            | MulFloat(to, a, b)
            | DivFloat(to, a, b)
            | RemFloat(to, a, b)
            | AddDouble(to, a, b)
            | SubDouble(to, a, b)
            | MulDouble(to, a, b)
            | DivDouble(to, a, b)
            | RemDouble(to, a, b) => self.write_binop(index, instr, *to, *a, Some(*b)),

            AddInt2addr(to, b)
            | SubInt2addr(to, b)
            | MulInt2addr(to, b)
            | DivInt2addr(to, b)
            | RemInt2addr(to, b)
            | AndInt2addr(to, b)
            | OrInt2addr(to, b)
            | XorInt2addr(to, b)
            | ShlInt2addr(to, b)
            | ShrInt2addr(to, b)
            | UshrInt2addr(to, b)
            | AddLong2addr(to, b)
            | SubLong2addr(to, b)
            | MulLong2addr(to, b)
            | DivLong2addr(to, b)
            | RemLong2addr(to, b)
            | AndLong2addr(to, b)
            | OrLong2addr(to, b)
            | XorLong2addr(to, b)
            | ShlLong2addr(to, b)
            | ShrLong2addr(to, b)
            | UshrLong2addr(to, b)
            | AddFloat2addr(to, b)
            | SubFloat2addr(to, b)
            | MulFloat2addr(to, b)
            | DivFloat2addr(to, b)
            | RemFloat2addr(to, b)
            | AddDouble2addr(to, b)
            | SubDouble2addr(to, b)
            | MulDouble2addr(to, b)
            | DivDouble2addr(to, b)
            | RemDouble2addr(to, b) => self.write_binop(index, instr, *to, *to, Some(*b)),

            AddIntLit16(to, a, _)
            | RsubInt(to, a, _)
            | MulIntLit16(to, a, _)
            | DivIntLit16(to, a, _)
            | RemIntLit16(to, a, _)
            | AndIntLit16(to, a, _)
            | OrIntLit16(to, a, _)
            | XorIntLit16(to, a, _) => self.write_binop(index, instr, *to, *a, None),
            AddIntLit8(to, a, _)
            | RsubIntLit8(to, a, _)
            | MulIntLit8(to, a, _)
            | DivIntLit8(to, a, _)
            | RemIntLit8(to, a, _)
            | AndIntLit8(to, a, _)
            | OrIntLit8(to, a, _)
            | XorIntLit8(to, a, _)
            | ShlIntLit8(to, a, _)
            | ShrIntLit8(to, a, _)
            | UshrIntLit8(to, a, _) => self.write_binop(index, instr, *to, *a, None),

            InvokePolymorphic(regs, m, proto) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke_polymorphic(index, &regs, *m, *proto)?;
            }
            InvokePolymorphicRange(regs, m, proto) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke_polymorphic(index, &regs, *m, *proto)?;
            }
            InvokeCustom(regs, call_site) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke_custom(index, &regs, *call_site)?;
            }
            InvokeCustomRange(regs, call_site) => {
                let regs: Vec<Reg> = regs.iter().collect();
                self.write_invoke_custom(index, &regs, *call_site)?;
            }
            ConstMethodHandle(reg, handle) => self.write_const_method_handle(index, *reg, *handle)?,
            ConstMethodType(reg, proto) => self.write_const_method_type(index, *reg, *proto)?,

            PackedSwitchPayload(first_key, targets) => {
                let cases: Vec<(i32, i32)> = (0..)
                    .map(|i| first_key.wrapping_add(i))
                    .zip(targets.iter().copied())
                    .collect();
                self.write_switch_payload(Relation::TableSwitchTarget, &cases);
            }
            SparseSwitchPayload(keys, targets) => {
                let cases: Vec<(i32, i32)> = keys
                    .iter()
                    .copied()
                    .zip(targets.iter().copied())
                    .collect();
                self.write_switch_payload(Relation::LookupSwitchTarget, &cases);
            }
            FillArrayDataPayload(width, values) => self.write_array_payload(*width, values),

            Optimized(opcode, _) if instr.is_optional() => {
                debug!(
                    "{}: ignoring odex-only opcode 0x{opcode:02x} at index {index}",
                    self.id()
                );
            }
            Optimized(..) | Unknown(..) => {
                return Err(FactsError::UnknownOpcode {
                    method: self.id().to_string(),
                    opcode: instr.to_string(),
                    line: repr::str_of_line(self.line()),
                })
            }
        }
        Ok(())
    }

    fn branch_target(&self, instr: &Instr) -> Option<Addr> {
        instr
            .target_offset()
            .and_then(|offset| Addr::from_offset(self.current_addr, offset))
    }

    fn write_statement_type(&self, insn: &str, instr: &Instr) {
        match typeinfer::statement_type(instr) {
            Some((in_type, out_type)) => {
                self.add(
                    Relation::StatementType,
                    &[insn, in_type.name(), out_type.name()],
                );
            }
            None => warn!("{}: no statement type for {instr}", self.id()),
        }
    }

    fn write_move(&mut self, index: usize, instr: &Instr, to: Reg, from: Reg) {
        let insn = self.insn(ASSIGN, index);
        let from = self.local(from);
        let to = self.local(to);
        self.add(
            Relation::AssignLocal,
            &[&insn, &index.to_string(), &from, &to, self.id()],
        );
        self.write_statement_type(&insn, instr);
    }

    /// Consumes the result of the instruction just before.
    fn write_move_result(&mut self, index: usize, reg: Reg) -> FactsResult<()> {
        let Some(pending) = self.carry.take_result() else {
            return Err(FactsError::MissingResult {
                method: self.id().to_string(),
                index,
            });
        };
        if pending.index + 1 != index {
            return Err(FactsError::StaleResult {
                method: self.id().to_string(),
                index,
                producer: pending.index,
            });
        }

        match pending.producer {
            ResultProducer::Invoke { insn } => {
                let var = self.local(reg);
                self.add(Relation::AssignReturnValue, &[&insn, &var]);
            }
            ResultProducer::FilledArray {
                array_type,
                elements,
            } => {
                let array = self.local(reg);
                let heap = self.heap_allocation(index, &array_type, &array, elements.is_empty());
                let insn = self.insn(ASSIGN, index);
                let idx = index.to_string();
                for (i, element) in elements.into_iter().enumerate() {
                    let var = self.local(element);
                    self.add(
                        Relation::ArrayInitialValueFromLocal,
                        &[&insn, &idx, &array, &i.to_string(), &var, &heap, self.id()],
                    );
                }
            }
        }
        Ok(())
    }

    fn write_return(&mut self, index: usize, reg: Reg) {
        let insn = self.insn("return", index);
        let var = self.local(reg);
        self.add(
            Relation::Return,
            &[&insn, &index.to_string(), &var, self.id()],
        );
    }

    /// 32 bits literal load, candidate size of a following `new-array`.
    fn write_narrow_constant(&mut self, index: usize, instr: &Instr, reg: Reg, literal: i64) {
        self.carry.narrow_constant(index, reg, literal);
        self.write_num_constant(index, instr, reg, literal);
    }

    fn write_num_constant(&mut self, index: usize, instr: &Instr, reg: Reg, literal: i64) {
        let insn = self.insn(ASSIGN, index);
        let var = self.local(reg);
        self.add(
            Relation::AssignNumConstant,
            &[&insn, &index.to_string(), &literal.to_string(), &var, self.id()],
        );
        self.write_statement_type(&insn, instr);
    }

    fn write_const_string(&mut self, index: usize, reg: Reg, s: Index<String>) -> FactsResult<()> {
        let constant = self.container().get(s)?;
        let heap = self.write_string_constant(constant);
        self.write_constant_allocation(index, reg, &heap);
        Ok(())
    }

    fn write_const_class(&mut self, index: usize, reg: Reg, t: Index<Type>) -> FactsResult<()> {
        let class = self.container().get(t)?.to_java_string();
        let heap = repr::class_constant(&class);
        self.add(Relation::ClassHeap, &[&heap, &class]);
        self.write_constant_allocation(index, reg, &heap);
        Ok(())
    }

    /// Assignment of a constant object (string, class, method type or
    /// handle) named by `heap`.
    fn write_constant_allocation(&mut self, index: usize, reg: Reg, heap: &str) {
        let insn = self.insn(ASSIGN, index);
        let var = self.local(reg);
        let line = repr::str_of_line(self.line());
        self.add(
            Relation::AssignHeapAllocation,
            &[&insn, &index.to_string(), heap, &var, self.id(), &line],
        );
    }

    fn write_monitor(&mut self, relation: Relation, kind: &str, index: usize, reg: Reg) {
        let insn = self.insn(kind, index);
        let var = self.local(reg);
        self.add(relation, &[&insn, &index.to_string(), &var, self.id()]);
    }

    fn write_cast(&mut self, index: usize, reg: Reg, t: Index<Type>) -> FactsResult<()> {
        let type_ = self.container().get(t)?.to_java_string();
        let insn = self.insn(ASSIGN, index);
        let var = self.local(reg);
        self.add(
            Relation::AssignCast,
            &[&insn, &index.to_string(), &var, &var, &type_, self.id()],
        );
        Ok(())
    }

    fn write_instance_of(
        &mut self,
        index: usize,
        to: Reg,
        from: Reg,
        t: Index<Type>,
    ) -> FactsResult<()> {
        let class = self.container().get(t)?.to_java_string();
        let insn = self.insn(ASSIGN, index);
        let from = self.local(from);
        let to = self.local(to);
        self.add(
            Relation::AssignInstanceOf,
            &[&insn, &index.to_string(), &from, &to, &class, self.id()],
        );
        Ok(())
    }

    fn write_new_instance(&mut self, index: usize, reg: Reg, t: Index<Type>) -> FactsResult<()> {
        let type_ = self.container().get(t)?.to_java_string();
        let var = self.local(reg);
        self.heap_allocation(index, &type_, &var, false);
        Ok(())
    }

    fn write_array_type(&self, array_type: &Type) {
        let name = array_type.to_java_string();
        self.add(Relation::ArrayType, &[&name]);
        if let Some(component) = array_type.component_type() {
            self.add(
                Relation::ComponentType,
                &[&name, &component.to_java_string()],
            );
        }
    }

    fn write_new_array(
        &mut self,
        index: usize,
        reg: Reg,
        size: Reg,
        t: Index<Type>,
    ) -> FactsResult<()> {
        let array_type = self.container().get(t)?;
        self.write_array_type(array_type);
        let empty = self.carry.take_zero_size(index, size);
        let var = self.local(reg);
        let heap = self.heap_allocation(index, &array_type.to_java_string(), &var, empty);
        self.carry.set_new_array(NewArrayInfo { index, heap });
        Ok(())
    }

    fn write_filled_new_array(
        &mut self,
        index: usize,
        elements: Vec<Reg>,
        t: Index<Type>,
    ) -> FactsResult<()> {
        let array_type = self.container().get(t)?;
        self.write_array_type(array_type);
        self.carry.produce_result(
            index,
            ResultProducer::FilledArray {
                array_type: array_type.to_java_string(),
                elements,
            },
        );
        Ok(())
    }

    fn write_fill_array_data(&mut self, index: usize, reg: Reg, offset: i32) {
        let Some(new_array) = self.carry.take_new_array() else {
            warn!(
                "{}: fill-array-data at index {index} without a preceding new-array",
                self.id()
            );
            return;
        };
        if index > new_array.index + 2 {
            warn!(
                "{}: fill-array-data at index {index} is far from its new-array at index {}",
                self.id(),
                new_array.index
            );
        }
        match Addr::from_offset(self.current_addr, offset) {
            Some(target) => self.fill_arrays.register(
                target,
                FillArrayEntry {
                    reg,
                    index,
                    new_array,
                },
            ),
            None => warn!(
                "{}: fill-array-data at index {index} points before the method entry",
                self.id()
            ),
        }
    }

    fn write_array_payload(&mut self, width: u16, values: &[i64]) {
        let entries = self.fill_arrays.take(self.current_addr);
        if entries.is_empty() {
            warn!(
                "{}: no fill-array-data for the array payload at address {}",
                self.id(),
                self.current_addr
            );
            return;
        }
        let type_ = match width {
            1 => "byte",
            2 => "short",
            4 => "int",
            8 => "long",
            _ => {
                warn!(
                    "{}: unsupported array payload element width {width}",
                    self.id()
                );
                return;
            }
        };

        for entry in entries {
            let insn = self.insn(ASSIGN, entry.index);
            let idx = entry.index.to_string();
            let array = self.local(entry.reg);
            for (i, value) in values.iter().enumerate() {
                let value = value.to_string();
                self.add(Relation::NumConstantRaw, &[&value, type_]);
                self.add(
                    Relation::ArrayInitialValueFromConst,
                    &[
                        &insn,
                        &idx,
                        &array,
                        &i.to_string(),
                        &value,
                        &entry.new_array.heap,
                        self.id(),
                    ],
                );
            }
        }
    }

    fn write_throw(&mut self, index: usize, reg: Reg) {
        let insn = self.numbered_insn(&repr::throw_kind(&reg.to_string()));
        let var = self.local(reg);
        self.add(
            Relation::Throw,
            &[&insn, &index.to_string(), &var, self.id()],
        );
    }

    fn write_if(&mut self, index: usize, instr: &Instr, operator: &str, a: Reg, b: Option<Reg>) {
        let insn = self.insn("if", index);
        let target = self.branch_target(instr);
        self.addresses
            .queue(PendingEdge::branch(Relation::If, insn.clone(), index, target));

        let left = self.local(a);
        self.add(Relation::IfVar, &[&insn, L_OP, &left]);
        if let Some(b) = b {
            let right = self.local(b);
            self.add(Relation::IfVar, &[&insn, R_OP, &right]);
        }
        self.add(Relation::OperatorAt, &[&insn, operator]);
    }

    fn write_switch(&mut self, relation: Relation, index: usize, reg: Reg, offset: i32) {
        let insn = self.insn("switch", index);
        let var = self.local(reg);
        self.add(relation, &[&insn, &index.to_string(), &var, self.id()]);
        match Addr::from_offset(self.current_addr, offset) {
            Some(target) => self.switches.register(
                target,
                SwitchEntry {
                    addr: self.current_addr,
                    index,
                },
            ),
            None => warn!(
                "{}: switch at index {index} points before the method entry",
                self.id()
            ),
        }
    }

    /// Queues one edge per case of every switch using the payload at the
    /// current address. `cases` are keys with targets relative to the switch.
    fn write_switch_payload(&mut self, relation: Relation, cases: &[(i32, i32)]) {
        let entries = self.switches.take(self.current_addr);
        if entries.is_empty() {
            warn!(
                "{}: no switch for the switch payload at address {}",
                self.id(),
                self.current_addr
            );
        }
        for entry in entries {
            let insn = self.insn("switch", entry.index);
            for (key, offset) in cases {
                let target = Addr::from_offset(entry.addr, *offset);
                self.addresses.queue(PendingEdge::switch_case(
                    relation,
                    insn.clone(),
                    entry.index,
                    *key,
                    target,
                ));
            }
        }
    }

    fn write_array_access(
        &mut self,
        relation: Relation,
        index: usize,
        value: Reg,
        array: Reg,
        idx: Reg,
    ) {
        let insn = self.insn(ASSIGN, index);
        let value = self.local(value);
        let array = self.local(array);
        let idx = self.local(idx);
        self.add(
            relation,
            &[&insn, &index.to_string(), &value, &array, self.id()],
        );
        self.add(Relation::ArrayInsnIndex, &[&insn, &idx]);
    }

    /// Queues a field access. Its fact is written once the declaring class
    /// of the field is known.
    fn write_field_access(
        &mut self,
        access: FieldAccess,
        index: usize,
        value: Reg,
        object: Option<Reg>,
        field: Index<FieldRef>,
    ) -> FactsResult<()> {
        let field = self.sigs.field(self.container(), field)?;
        let (relation, kind) = match (access, object.is_some()) {
            (FieldAccess::Load, true) => (Relation::LoadInstanceField, "read-field-"),
            (FieldAccess::Load, false) => (Relation::LoadStaticField, "read-field-"),
            (FieldAccess::Store, true) => (Relation::StoreInstanceField, "write-field-"),
            (FieldAccess::Store, false) => (Relation::StoreStaticField, "write-field-"),
        };
        let insn = self.numbered_insn(&format!("{kind}{}", field.name()));
        let var = self.local(value);
        let base = object.map(|reg| self.local(reg));
        let method = self.id().to_string();
        self.field_ops
            .push(FieldOp::new(relation, insn, index, var, base, field, method));
        Ok(())
    }

    /// Splits invocation registers into the receiver, if `has_receiver`, and
    /// one register per parameter. Wide parameters take two registers, only
    /// the first one is kept.
    fn split_arguments(
        &self,
        regs: &[Reg],
        params: &[Type],
        has_receiver: bool,
    ) -> FactsResult<(Option<Reg>, Vec<Reg>)> {
        let mut regs = regs.iter().copied();
        let receiver = if has_receiver {
            let receiver = regs.next().ok_or_else(|| FactsError::MissingReceiver {
                method: self.id().to_string(),
            })?;
            Some(receiver)
        } else {
            None
        };

        let remaining: Vec<Reg> = regs.collect();
        let expected: usize = params.iter().map(Type::reg_width).sum();
        if remaining.len() < expected {
            return Err(FactsError::MissingArguments {
                method: self.id().to_string(),
                expected,
                available: remaining.len(),
            });
        }

        let mut slots = remaining.into_iter();
        let mut args = Vec::with_capacity(params.len());
        for param in params {
            if let Some(reg) = slots.next() {
                args.push(reg);
            }
            if param.is_wide() {
                slots.next();
            }
        }
        Ok((receiver, args))
    }

    /// Writes an invocation and makes its result available to a following
    /// `move-result`. Arguments are walked with the parameters of `proto`
    /// when given, else with those of the method. Returns the instruction id.
    fn write_invoke(
        &mut self,
        kind: InvokeKind,
        index: usize,
        regs: &[Reg],
        m: Index<MethodRef>,
        proto: Option<Index<ProtoRef>>,
    ) -> FactsResult<String> {
        let container = self.container();
        let sig = self.sigs.method(container, m)?;
        let params = match proto {
            Some(proto) => container.get(proto)?.params(),
            None => sig.param_types(),
        };
        let (receiver, args) = self.split_arguments(regs, params, kind != InvokeKind::Static)?;
        let insn = self.numbered_insn(&sig.mid());

        let base = receiver.map(|reg| self.local(reg));
        let first = match &base {
            Some(base) => {
                self.add(Relation::ActualParam, &["0", &insn, base]);
                1
            }
            None => 0,
        };
        for (i, reg) in args.into_iter().enumerate() {
            let var = self.local(reg);
            self.add(
                Relation::ActualParam,
                &[&(first + i).to_string(), &insn, &var],
            );
        }

        if let Some(line) = self.line() {
            self.add(Relation::MethodInvocationLine, &[&insn, &line.to_string()]);
        }

        let idx = index.to_string();
        match &base {
            Some(base) => self.add(
                kind.relation(),
                &[&insn, &idx, sig.id(), base, self.id()],
            ),
            None => self.add(kind.relation(), &[&insn, &idx, sig.id(), self.id()]),
        }

        self.carry.produce_result(
            index,
            ResultProducer::Invoke { insn: insn.clone() },
        );
        Ok(insn)
    }

    fn write_invoke_polymorphic(
        &mut self,
        index: usize,
        regs: &[Reg],
        m: Index<MethodRef>,
        proto: Index<ProtoRef>,
    ) -> FactsResult<()> {
        let insn = self.write_invoke(InvokeKind::Virtual, index, regs, m, Some(proto))?;
        let sig = self.sigs.method(self.container(), m)?;
        self.add(Relation::PolymorphicInvocation, &[&insn, sig.name()]);
        Ok(())
    }

    fn write_invoke_custom(
        &mut self,
        index: usize,
        regs: &[Reg],
        call_site: Index<CallSiteRef>,
    ) -> FactsResult<()> {
        let container = self.container();
        let call_site = container.get(call_site)?;
        let proto = container.get(call_site.proto())?;
        let handle = container.get(call_site.bootstrap())?;
        let bootstrap = self.handle_target_id(handle)?;

        let (_, args) = self.split_arguments(regs, proto.params(), false)?;
        let insn = self.numbered_insn(&format!("invokedynamic {}", call_site.name()));
        for (i, reg) in args.into_iter().enumerate() {
            let var = self.local(reg);
            self.add(Relation::ActualParam, &[&i.to_string(), &insn, &var]);
        }

        let params: Vec<String> = proto.params().iter().map(Type::to_java_string).collect();
        let params_signature = format!("({})", params.join(","));
        let return_type = proto.return_type().to_java_string();
        self.add(
            Relation::DynamicMethodInvocation,
            &[
                &insn,
                &index.to_string(),
                &bootstrap,
                call_site.name(),
                &return_type,
                &params.len().to_string(),
                &params_signature,
                &handle.kind().reference_kind().to_string(),
                self.id(),
            ],
        );
        for (i, param) in params.iter().enumerate() {
            self.add(
                Relation::DynamicMethodInvocationParamType,
                &[&insn, &i.to_string(), param],
            );
        }
        self.write_string_constant(call_site.name());
        self.write_string_constant(&format!("{return_type}{params_signature}"));

        self.carry
            .produce_result(index, ResultProducer::Invoke { insn });
        Ok(())
    }

    fn handle_target_id(&self, handle: &MethodHandleRef) -> FactsResult<String> {
        let container = self.container();
        Ok(match handle.target() {
            HandleTarget::Method(m) => self.sigs.method(container, m)?.id().to_string(),
            HandleTarget::Field(f) => self.sigs.field(container, f)?.id().to_string(),
        })
    }

    fn write_const_method_handle(
        &mut self,
        index: usize,
        reg: Reg,
        handle: Index<MethodHandleRef>,
    ) -> FactsResult<()> {
        let container = self.container();
        let handle = container.get(handle)?;
        let heap = match handle.target() {
            HandleTarget::Method(m) => {
                let sig = self.sigs.method(container, m)?;
                let heap = repr::method_handle_constant(sig.id());
                self.add(
                    Relation::MethodHandleConstant,
                    &[
                        &heap,
                        sig.id(),
                        sig.return_type(),
                        &sig.params().join(","),
                        &sig.arity().to_string(),
                    ],
                );
                heap
            }
            HandleTarget::Field(f) => {
                let field = self.sigs.field(container, f)?;
                debug!(
                    "{}: field accessor handle on {} has no method handle fact",
                    self.id(),
                    field.id()
                );
                repr::method_handle_constant(field.id())
            }
        };
        self.write_constant_allocation(index, reg, &heap);
        Ok(())
    }

    fn write_const_method_type(
        &mut self,
        index: usize,
        reg: Reg,
        proto: Index<ProtoRef>,
    ) -> FactsResult<()> {
        let proto = self.container().get(proto)?;
        let params: Vec<String> = proto.params().iter().map(Type::to_java_string).collect();
        let return_type = proto.return_type().to_java_string();
        let method_type = repr::method_type_constant(&params, &return_type);
        for (i, param) in params.iter().enumerate() {
            self.add(
                Relation::MethodTypeConstantParam,
                &[&method_type, &i.to_string(), param],
            );
        }
        self.add(
            Relation::MethodTypeConstant,
            &[
                &method_type,
                &params.len().to_string(),
                &return_type,
                &params.join(","),
            ],
        );
        self.write_constant_allocation(index, reg, &method_type);
        Ok(())
    }

    fn write_unop(&mut self, index: usize, instr: &Instr, to: Reg, from: Reg) {
        let insn = self.insn(ASSIGN, index);
        let from = self.local(from);
        let to = self.local(to);
        self.add(
            Relation::AssignUnop,
            &[&insn, &index.to_string(), &to, self.id()],
        );
        self.add(Relation::AssignOperFrom, &[&insn, L_OP, &from]);
        self.write_statement_type(&insn, instr);
    }

    /// Binary operation; `b` is `None` when the second operand is a literal.
    fn write_binop(&mut self, index: usize, instr: &Instr, to: Reg, a: Reg, b: Option<Reg>) {
        let insn = self.insn(ASSIGN, index);
        let a = self.local(a);
        let b = b.map(|reg| self.local(reg));
        let to = self.local(to);
        self.add(
            Relation::AssignBinop,
            &[&insn, &index.to_string(), &to, self.id()],
        );
        self.add(Relation::AssignOperFrom, &[&insn, L_OP, &a]);
        if let Some(b) = &b {
            self.add(Relation::AssignOperFrom, &[&insn, R_OP, b]);
        }
        self.write_statement_type(&insn, instr);
    }
}
