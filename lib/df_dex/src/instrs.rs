//! Dalvik bytecode instructions definitions.
//!
//! Instructions come already decoded from the disassembler: one variant per
//! opcode with its register, literal, offset and reference operands. In the
//! container files each instruction is an object `{"op": ..., "args": ...}`
//! where `op` is the kebab-case variant name (`const4`, `invoke-virtual-range`,
//! `add-int-lit8`...) and `args` the operands in declaration order.

use crate::fields::FieldRef;
use crate::methods::{CallSiteRef, MethodHandleRef, MethodRef};
use crate::registers::{Reg, RegList, RegRange};
use crate::types::{ProtoRef, Type};
use crate::Index;
use instruction_derive::Instruction;
use serde::Deserialize;
use std::fmt;

pub trait Instruction {
    fn mnemonic(&self) -> &str;
    /// Width of the instruction in 16-bit code units.
    fn size(&self) -> usize;
    fn is_payload(&self) -> bool;
    fn is_optional(&self) -> bool;
}

#[derive(Debug, Clone, Deserialize, Instruction)]
#[serde(tag = "op", content = "args", rename_all = "kebab-case")]
pub enum Instr {
    // moves and returns
    #[instruction(mnemonic = "nop", format = "10x")]
    Nop,
    #[instruction(mnemonic = "move", format = "12x")]
    Move(Reg, Reg),
    #[instruction(mnemonic = "move/from16", format = "22x")]
    MoveFrom16(Reg, Reg),
    #[instruction(mnemonic = "move/16", format = "32x")]
    Move16(Reg, Reg),
    #[instruction(mnemonic = "move-wide", format = "12x")]
    MoveWide(Reg, Reg),
    #[instruction(mnemonic = "move-wide/from16", format = "22x")]
    MoveWideFrom16(Reg, Reg),
    #[instruction(mnemonic = "move-wide/16", format = "32x")]
    MoveWide16(Reg, Reg),
    #[instruction(mnemonic = "move-object", format = "12x")]
    MoveObject(Reg, Reg),
    #[instruction(mnemonic = "move-object/from16", format = "22x")]
    MoveObjectFrom16(Reg, Reg),
    #[instruction(mnemonic = "move-object/16", format = "32x")]
    MoveObject16(Reg, Reg),
    #[instruction(mnemonic = "move-result", format = "11x")]
    MoveResult(Reg),
    #[instruction(mnemonic = "move-result-wide", format = "11x")]
    MoveResultWide(Reg),
    #[instruction(mnemonic = "move-result-object", format = "11x")]
    MoveResultObject(Reg),
    #[instruction(mnemonic = "move-exception", format = "11x")]
    MoveException(Reg),
    #[instruction(mnemonic = "return-void", format = "10x")]
    ReturnVoid,
    #[instruction(mnemonic = "return", format = "11x")]
    Return(Reg),
    #[instruction(mnemonic = "return-wide", format = "11x")]
    ReturnWide(Reg),
    #[instruction(mnemonic = "return-object", format = "11x")]
    ReturnObject(Reg),

    // constants
    #[instruction(mnemonic = "const/4", format = "11n")]
    Const4(Reg, i8),
    #[instruction(mnemonic = "const/16", format = "21s")]
    Const16(Reg, i16),
    #[instruction(mnemonic = "const", format = "31i")]
    Const(Reg, i32),
    #[instruction(mnemonic = "const/high16", format = "21h")]
    ConstHigh16(Reg, i16),
    #[instruction(mnemonic = "const-wide/16", format = "21s")]
    ConstWide16(Reg, i16),
    #[instruction(mnemonic = "const-wide/32", format = "31i")]
    ConstWide32(Reg, i32),
    #[instruction(mnemonic = "const-wide", format = "51l")]
    ConstWide(Reg, i64),
    #[instruction(mnemonic = "const-wide/high16", format = "21h")]
    ConstWideHigh16(Reg, i16),
    #[instruction(mnemonic = "const-string", format = "21c")]
    ConstString(Reg, Index<String>),
    #[instruction(mnemonic = "const-string/jumbo", format = "31c")]
    ConstStringJumbo(Reg, Index<String>),
    #[instruction(mnemonic = "const-class", format = "21c")]
    ConstClass(Reg, Index<Type>),

    // monitors, casts and allocations
    #[instruction(mnemonic = "monitor-enter", format = "11x")]
    MonitorEnter(Reg),
    #[instruction(mnemonic = "monitor-exit", format = "11x")]
    MonitorExit(Reg),
    #[instruction(mnemonic = "check-cast", format = "21c")]
    CheckCast(Reg, Index<Type>),
    #[instruction(mnemonic = "instance-of", format = "22c")]
    InstanceOf(Reg, Reg, Index<Type>),
    #[instruction(mnemonic = "array-length", format = "12x")]
    ArrayLength(Reg, Reg),
    #[instruction(mnemonic = "new-instance", format = "21c")]
    NewInstance(Reg, Index<Type>),
    #[instruction(mnemonic = "new-array", format = "22c")]
    NewArray(Reg, Reg, Index<Type>),
    #[instruction(mnemonic = "filled-new-array", format = "35c")]
    FilledNewArray(RegList, Index<Type>),
    #[instruction(mnemonic = "filled-new-array/range", format = "3rc")]
    FilledNewArrayRange(RegRange, Index<Type>),
    #[instruction(mnemonic = "fill-array-data", format = "31t")]
    FillArrayData(Reg, i32),

    // control flow
    #[instruction(mnemonic = "throw", format = "11x")]
    Throw(Reg),
    #[instruction(mnemonic = "goto", format = "10t")]
    Goto(i8),
    #[instruction(mnemonic = "goto/16", format = "20t")]
    Goto16(i16),
    #[instruction(mnemonic = "goto/32", format = "30t")]
    Goto32(i32),
    #[instruction(mnemonic = "packed-switch", format = "31t")]
    PackedSwitch(Reg, i32),
    #[instruction(mnemonic = "sparse-switch", format = "31t")]
    SparseSwitch(Reg, i32),

    // comparisons
    #[instruction(mnemonic = "cmpl-float", format = "23x")]
    CmplFloat(Reg, Reg, Reg),
    #[instruction(mnemonic = "cmpg-float", format = "23x")]
    CmpgFloat(Reg, Reg, Reg),
    #[instruction(mnemonic = "cmpl-double", format = "23x")]
    CmplDouble(Reg, Reg, Reg),
    #[instruction(mnemonic = "cmpg-double", format = "23x")]
    CmpgDouble(Reg, Reg, Reg),
    #[instruction(mnemonic = "cmp-long", format = "23x")]
    CmpLong(Reg, Reg, Reg),

    // conditional branches
    #[instruction(mnemonic = "if-eq", format = "22t")]
    IfEq(Reg, Reg, i16),
    #[instruction(mnemonic = "if-ne", format = "22t")]
    IfNe(Reg, Reg, i16),
    #[instruction(mnemonic = "if-lt", format = "22t")]
    IfLt(Reg, Reg, i16),
    #[instruction(mnemonic = "if-ge", format = "22t")]
    IfGe(Reg, Reg, i16),
    #[instruction(mnemonic = "if-gt", format = "22t")]
    IfGt(Reg, Reg, i16),
    #[instruction(mnemonic = "if-le", format = "22t")]
    IfLe(Reg, Reg, i16),
    #[instruction(mnemonic = "if-eqz", format = "21t")]
    IfEqz(Reg, i16),
    #[instruction(mnemonic = "if-nez", format = "21t")]
    IfNez(Reg, i16),
    #[instruction(mnemonic = "if-ltz", format = "21t")]
    IfLtz(Reg, i16),
    #[instruction(mnemonic = "if-gez", format = "21t")]
    IfGez(Reg, i16),
    #[instruction(mnemonic = "if-gtz", format = "21t")]
    IfGtz(Reg, i16),
    #[instruction(mnemonic = "if-lez", format = "21t")]
    IfLez(Reg, i16),

    // array accesses
    #[instruction(mnemonic = "aget", format = "23x")]
    Aget(Reg, Reg, Reg),
    #[instruction(mnemonic = "aget-wide", format = "23x")]
    AgetWide(Reg, Reg, Reg),
    #[instruction(mnemonic = "aget-object", format = "23x")]
    AgetObject(Reg, Reg, Reg),
    #[instruction(mnemonic = "aget-boolean", format = "23x")]
    AgetBoolean(Reg, Reg, Reg),
    #[instruction(mnemonic = "aget-byte", format = "23x")]
    AgetByte(Reg, Reg, Reg),
    #[instruction(mnemonic = "aget-char", format = "23x")]
    AgetChar(Reg, Reg, Reg),
    #[instruction(mnemonic = "aget-short", format = "23x")]
    AgetShort(Reg, Reg, Reg),
    #[instruction(mnemonic = "aput", format = "23x")]
    Aput(Reg, Reg, Reg),
    #[instruction(mnemonic = "aput-wide", format = "23x")]
    AputWide(Reg, Reg, Reg),
    #[instruction(mnemonic = "aput-object", format = "23x")]
    AputObject(Reg, Reg, Reg),
    #[instruction(mnemonic = "aput-boolean", format = "23x")]
    AputBoolean(Reg, Reg, Reg),
    #[instruction(mnemonic = "aput-byte", format = "23x")]
    AputByte(Reg, Reg, Reg),
    #[instruction(mnemonic = "aput-char", format = "23x")]
    AputChar(Reg, Reg, Reg),
    #[instruction(mnemonic = "aput-short", format = "23x")]
    AputShort(Reg, Reg, Reg),

    // instance field accesses
    #[instruction(mnemonic = "iget", format = "22c")]
    Iget(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iget-wide", format = "22c")]
    IgetWide(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iget-object", format = "22c")]
    IgetObject(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iget-boolean", format = "22c")]
    IgetBoolean(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iget-byte", format = "22c")]
    IgetByte(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iget-char", format = "22c")]
    IgetChar(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iget-short", format = "22c")]
    IgetShort(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iput", format = "22c")]
    Iput(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iput-wide", format = "22c")]
    IputWide(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iput-object", format = "22c")]
    IputObject(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iput-boolean", format = "22c")]
    IputBoolean(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iput-byte", format = "22c")]
    IputByte(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iput-char", format = "22c")]
    IputChar(Reg, Reg, Index<FieldRef>),
    #[instruction(mnemonic = "iput-short", format = "22c")]
    IputShort(Reg, Reg, Index<FieldRef>),

    // static field accesses
    #[instruction(mnemonic = "sget", format = "21c")]
    Sget(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sget-wide", format = "21c")]
    SgetWide(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sget-object", format = "21c")]
    SgetObject(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sget-boolean", format = "21c")]
    SgetBoolean(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sget-byte", format = "21c")]
    SgetByte(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sget-char", format = "21c")]
    SgetChar(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sget-short", format = "21c")]
    SgetShort(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sput", format = "21c")]
    Sput(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sput-wide", format = "21c")]
    SputWide(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sput-object", format = "21c")]
    SputObject(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sput-boolean", format = "21c")]
    SputBoolean(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sput-byte", format = "21c")]
    SputByte(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sput-char", format = "21c")]
    SputChar(Reg, Index<FieldRef>),
    #[instruction(mnemonic = "sput-short", format = "21c")]
    SputShort(Reg, Index<FieldRef>),

    // invocations
    #[instruction(mnemonic = "invoke-virtual", format = "35c")]
    InvokeVirtual(RegList, Index<MethodRef>),
    #[instruction(mnemonic = "invoke-super", format = "35c")]
    InvokeSuper(RegList, Index<MethodRef>),
    #[instruction(mnemonic = "invoke-direct", format = "35c")]
    InvokeDirect(RegList, Index<MethodRef>),
    #[instruction(mnemonic = "invoke-static", format = "35c")]
    InvokeStatic(RegList, Index<MethodRef>),
    #[instruction(mnemonic = "invoke-interface", format = "35c")]
    InvokeInterface(RegList, Index<MethodRef>),
    #[instruction(mnemonic = "invoke-virtual/range", format = "3rc")]
    InvokeVirtualRange(RegRange, Index<MethodRef>),
    #[instruction(mnemonic = "invoke-super/range", format = "3rc")]
    InvokeSuperRange(RegRange, Index<MethodRef>),
    #[instruction(mnemonic = "invoke-direct/range", format = "3rc")]
    InvokeDirectRange(RegRange, Index<MethodRef>),
    #[instruction(mnemonic = "invoke-static/range", format = "3rc")]
    InvokeStaticRange(RegRange, Index<MethodRef>),
    #[instruction(mnemonic = "invoke-interface/range", format = "3rc")]
    InvokeInterfaceRange(RegRange, Index<MethodRef>),

    // unary operations and conversions
    #[instruction(mnemonic = "neg-int", format = "12x")]
    NegInt(Reg, Reg),
    #[instruction(mnemonic = "not-int", format = "12x")]
    NotInt(Reg, Reg),
    #[instruction(mnemonic = "neg-long", format = "12x")]
    NegLong(Reg, Reg),
    #[instruction(mnemonic = "not-long", format = "12x")]
    NotLong(Reg, Reg),
    #[instruction(mnemonic = "neg-float", format = "12x")]
    NegFloat(Reg, Reg),
    #[instruction(mnemonic = "neg-double", format = "12x")]
    NegDouble(Reg, Reg),
    #[instruction(mnemonic = "int-to-long", format = "12x")]
    IntToLong(Reg, Reg),
    #[instruction(mnemonic = "int-to-float", format = "12x")]
    IntToFloat(Reg, Reg),
    #[instruction(mnemonic = "int-to-double", format = "12x")]
    IntToDouble(Reg, Reg),
    #[instruction(mnemonic = "long-to-int", format = "12x")]
    LongToInt(Reg, Reg),
    #[instruction(mnemonic = "long-to-float", format = "12x")]
    LongToFloat(Reg, Reg),
    #[instruction(mnemonic = "long-to-double", format = "12x")]
    LongToDouble(Reg, Reg),
    #[instruction(mnemonic = "float-to-int", format = "12x")]
    FloatToInt(Reg, Reg),
    #[instruction(mnemonic = "float-to-long", format = "12x")]
    FloatToLong(Reg, Reg),
    #[instruction(mnemonic = "float-to-double", format = "12x")]
    FloatToDouble(Reg, Reg),
    #[instruction(mnemonic = "double-to-int", format = "12x")]
    DoubleToInt(Reg, Reg),
    #[instruction(mnemonic = "double-to-long", format = "12x")]
    DoubleToLong(Reg, Reg),
    #[instruction(mnemonic = "double-to-float", format = "12x")]
    DoubleToFloat(Reg, Reg),
    #[instruction(mnemonic = "int-to-byte", format = "12x")]
    IntToByte(Reg, Reg),
    #[instruction(mnemonic = "int-to-char", format = "12x")]
    IntToChar(Reg, Reg),
    #[instruction(mnemonic = "int-to-short", format = "12x")]
    IntToShort(Reg, Reg),

    // binary operations
    #[instruction(mnemonic = "add-int", format = "23x")]
    AddInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "sub-int", format = "23x")]
    SubInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "mul-int", format = "23x")]
    MulInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "div-int", format = "23x")]
    DivInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "rem-int", format = "23x")]
    RemInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "and-int", format = "23x")]
    AndInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "or-int", format = "23x")]
    OrInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "xor-int", format = "23x")]
    XorInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "shl-int", format = "23x")]
    ShlInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "shr-int", format = "23x")]
    ShrInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "ushr-int", format = "23x")]
    UshrInt(Reg, Reg, Reg),
    #[instruction(mnemonic = "add-long", format = "23x")]
    AddLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "sub-long", format = "23x")]
    SubLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "mul-long", format = "23x")]
    MulLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "div-long", format = "23x")]
    DivLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "rem-long", format = "23x")]
    RemLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "and-long", format = "23x")]
    AndLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "or-long", format = "23x")]
    OrLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "xor-long", format = "23x")]
    XorLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "shl-long", format = "23x")]
    ShlLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "shr-long", format = "23x")]
    ShrLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "ushr-long", format = "23x")]
    UshrLong(Reg, Reg, Reg),
    #[instruction(mnemonic = "add-float", format = "23x")]
    AddFloat(Reg, Reg, Reg),
    #[instruction(mnemonic = "sub-float", format = "23x")]
    SubFloat(Reg, Reg, Reg),
    #[instruction(mnemonic = "mul-float", format = "23x")]
    MulFloat(Reg, Reg, Reg),
    #[instruction(mnemonic = "div-float", format = "23x")]
    DivFloat(Reg, Reg, Reg),
    #[instruction(mnemonic = "rem-float", format = "23x")]
    RemFloat(Reg, Reg, Reg),
    #[instruction(mnemonic = "add-double", format = "23x")]
    AddDouble(Reg, Reg, Reg),
    #[instruction(mnemonic = "sub-double", format = "23x")]
    SubDouble(Reg, Reg, Reg),
    #[instruction(mnemonic = "mul-double", format = "23x")]
    MulDouble(Reg, Reg, Reg),
    #[instruction(mnemonic = "div-double", format = "23x")]
    DivDouble(Reg, Reg, Reg),
    #[instruction(mnemonic = "rem-double", format = "23x")]
    RemDouble(Reg, Reg, Reg),

    // binary operations, destination is the first source
    #[instruction(mnemonic = "add-int/2addr", format = "12x")]
    AddInt2addr(Reg, Reg),
    #[instruction(mnemonic = "sub-int/2addr", format = "12x")]
    SubInt2addr(Reg, Reg),
    #[instruction(mnemonic = "mul-int/2addr", format = "12x")]
    MulInt2addr(Reg, Reg),
    #[instruction(mnemonic = "div-int/2addr", format = "12x")]
    DivInt2addr(Reg, Reg),
    #[instruction(mnemonic = "rem-int/2addr", format = "12x")]
    RemInt2addr(Reg, Reg),
    #[instruction(mnemonic = "and-int/2addr", format = "12x")]
    AndInt2addr(Reg, Reg),
    #[instruction(mnemonic = "or-int/2addr", format = "12x")]
    OrInt2addr(Reg, Reg),
    #[instruction(mnemonic = "xor-int/2addr", format = "12x")]
    XorInt2addr(Reg, Reg),
    #[instruction(mnemonic = "shl-int/2addr", format = "12x")]
    ShlInt2addr(Reg, Reg),
    #[instruction(mnemonic = "shr-int/2addr", format = "12x")]
    ShrInt2addr(Reg, Reg),
    #[instruction(mnemonic = "ushr-int/2addr", format = "12x")]
    UshrInt2addr(Reg, Reg),
    #[instruction(mnemonic = "add-long/2addr", format = "12x")]
    AddLong2addr(Reg, Reg),
    #[instruction(mnemonic = "sub-long/2addr", format = "12x")]
    SubLong2addr(Reg, Reg),
    #[instruction(mnemonic = "mul-long/2addr", format = "12x")]
    MulLong2addr(Reg, Reg),
    #[instruction(mnemonic = "div-long/2addr", format = "12x")]
    DivLong2addr(Reg, Reg),
    #[instruction(mnemonic = "rem-long/2addr", format = "12x")]
    RemLong2addr(Reg, Reg),
    #[instruction(mnemonic = "and-long/2addr", format = "12x")]
    AndLong2addr(Reg, Reg),
    #[instruction(mnemonic = "or-long/2addr", format = "12x")]
    OrLong2addr(Reg, Reg),
    #[instruction(mnemonic = "xor-long/2addr", format = "12x")]
    XorLong2addr(Reg, Reg),
    #[instruction(mnemonic = "shl-long/2addr", format = "12x")]
    ShlLong2addr(Reg, Reg),
    #[instruction(mnemonic = "shr-long/2addr", format = "12x")]
    ShrLong2addr(Reg, Reg),
    #[instruction(mnemonic = "ushr-long/2addr", format = "12x")]
    UshrLong2addr(Reg, Reg),
    #[instruction(mnemonic = "add-float/2addr", format = "12x")]
    AddFloat2addr(Reg, Reg),
    #[instruction(mnemonic = "sub-float/2addr", format = "12x")]
    SubFloat2addr(Reg, Reg),
    #[instruction(mnemonic = "mul-float/2addr", format = "12x")]
    MulFloat2addr(Reg, Reg),
    #[instruction(mnemonic = "div-float/2addr", format = "12x")]
    DivFloat2addr(Reg, Reg),
    #[instruction(mnemonic = "rem-float/2addr", format = "12x")]
    RemFloat2addr(Reg, Reg),
    #[instruction(mnemonic = "add-double/2addr", format = "12x")]
    AddDouble2addr(Reg, Reg),
    #[instruction(mnemonic = "sub-double/2addr", format = "12x")]
    SubDouble2addr(Reg, Reg),
    #[instruction(mnemonic = "mul-double/2addr", format = "12x")]
    MulDouble2addr(Reg, Reg),
    #[instruction(mnemonic = "div-double/2addr", format = "12x")]
    DivDouble2addr(Reg, Reg),
    #[instruction(mnemonic = "rem-double/2addr", format = "12x")]
    RemDouble2addr(Reg, Reg),

    // binary operations with a 16 bits literal
    #[instruction(mnemonic = "add-int/lit16", format = "22s")]
    AddIntLit16(Reg, Reg, i16),
    #[instruction(mnemonic = "rsub-int", format = "22s")]
    RsubInt(Reg, Reg, i16),
    #[instruction(mnemonic = "mul-int/lit16", format = "22s")]
    MulIntLit16(Reg, Reg, i16),
    #[instruction(mnemonic = "div-int/lit16", format = "22s")]
    DivIntLit16(Reg, Reg, i16),
    #[instruction(mnemonic = "rem-int/lit16", format = "22s")]
    RemIntLit16(Reg, Reg, i16),
    #[instruction(mnemonic = "and-int/lit16", format = "22s")]
    AndIntLit16(Reg, Reg, i16),
    #[instruction(mnemonic = "or-int/lit16", format = "22s")]
    OrIntLit16(Reg, Reg, i16),
    #[instruction(mnemonic = "xor-int/lit16", format = "22s")]
    XorIntLit16(Reg, Reg, i16),

    // binary operations with a 8 bits literal
    #[instruction(mnemonic = "add-int/lit8", format = "22b")]
    AddIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "rsub-int/lit8", format = "22b")]
    RsubIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "mul-int/lit8", format = "22b")]
    MulIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "div-int/lit8", format = "22b")]
    DivIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "rem-int/lit8", format = "22b")]
    RemIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "and-int/lit8", format = "22b")]
    AndIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "or-int/lit8", format = "22b")]
    OrIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "xor-int/lit8", format = "22b")]
    XorIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "shl-int/lit8", format = "22b")]
    ShlIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "shr-int/lit8", format = "22b")]
    ShrIntLit8(Reg, Reg, i8),
    #[instruction(mnemonic = "ushr-int/lit8", format = "22b")]
    UshrIntLit8(Reg, Reg, i8),

    // method handles and call sites
    #[instruction(mnemonic = "invoke-polymorphic", format = "45cc")]
    InvokePolymorphic(RegList, Index<MethodRef>, Index<ProtoRef>),
    #[instruction(mnemonic = "invoke-polymorphic/range", format = "4rcc")]
    InvokePolymorphicRange(RegRange, Index<MethodRef>, Index<ProtoRef>),
    #[instruction(mnemonic = "invoke-custom", format = "35c")]
    InvokeCustom(RegList, Index<CallSiteRef>),
    #[instruction(mnemonic = "invoke-custom/range", format = "3rc")]
    InvokeCustomRange(RegRange, Index<CallSiteRef>),
    #[instruction(mnemonic = "const-method-handle", format = "21c")]
    ConstMethodHandle(Reg, Index<MethodHandleRef>),
    #[instruction(mnemonic = "const-method-type", format = "21c")]
    ConstMethodType(Reg, Index<ProtoRef>),

    // data pseudo-instructions
    /// First key and relative targets of a `packed-switch`.
    #[instruction(
        mnemonic = "packed-switch-payload",
        format = "custom",
        size = "(_1.len() * 2) + 4",
        payload
    )]
    PackedSwitchPayload(i32, Vec<i32>),

    /// Keys and relative targets of a `sparse-switch`.
    #[instruction(
        mnemonic = "sparse-switch-payload",
        format = "custom",
        size = "(_1.len() * 4) + 2",
        payload
    )]
    SparseSwitchPayload(Vec<i32>, Vec<i32>),

    /// Element width in bytes and elements of a `fill-array-data`.
    #[instruction(
        mnemonic = "fill-array-data-payload",
        format = "custom",
        size = "(usize::from(*_0) * _1.len() + 1) / 2 + 4",
        payload
    )]
    FillArrayDataPayload(u16, Vec<i64>),

    // opcodes outside of the standard set
    /// Opcode only found in optimized dex files, with its width in code units.
    #[instruction(
        mnemonic = "odex-only",
        format = "custom",
        size = "usize::from(*_1)",
        optional
    )]
    Optimized(u8, u16),

    /// Opcode the disassembler could not identify, with its width in code units.
    #[instruction(mnemonic = "unknown", format = "custom", size = "usize::from(*_1)")]
    Unknown(u8, u16),
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Optimized(op, _) | Self::Unknown(op, _) => {
                write!(f, "{} (0x{op:02x})", self.mnemonic())
            }
            _ => write!(f, "{}", self.mnemonic()),
        }
    }
}

impl Instr {
    /// Returns the relative offset, in code units, carried by branches and by
    /// instructions pointing to a payload.
    #[allow(clippy::enum_glob_use)]
    #[must_use]
    pub fn target_offset(&self) -> Option<i32> {
        use Instr::*;
        match self {
            Goto(off) => Some(i32::from(*off)),
            Goto16(off) => Some(i32::from(*off)),
            Goto32(off) => Some(*off),
            IfEq(_, _, off) | IfNe(_, _, off) | IfLt(_, _, off) | IfGe(_, _, off)
            | IfGt(_, _, off) | IfLe(_, _, off) => Some(i32::from(*off)),
            IfEqz(_, off) | IfNez(_, off) | IfLtz(_, off) | IfGez(_, off) | IfGtz(_, off)
            | IfLez(_, off) => Some(i32::from(*off)),
            PackedSwitch(_, off) | SparseSwitch(_, off) | FillArrayData(_, off) => Some(*off),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_in_code_units() {
        assert_eq!(Instr::Nop.size(), 1);
        assert_eq!(Instr::ConstWide(Reg::from(0u16), 1).size(), 5);
        assert_eq!(Instr::Goto32(4).size(), 3);
        assert_eq!(Instr::PackedSwitchPayload(0, vec![3, 5, 7]).size(), 10);
        assert_eq!(Instr::SparseSwitchPayload(vec![1, 9], vec![3, 5]).size(), 10);
        assert_eq!(Instr::FillArrayDataPayload(4, vec![1, 2, 3]).size(), 10);
        assert_eq!(Instr::FillArrayDataPayload(1, vec![1, 2, 3]).size(), 6);
        assert_eq!(Instr::Optimized(0xe3, 2).size(), 2);
    }

    #[test]
    fn flags() {
        assert!(Instr::PackedSwitchPayload(0, vec![]).is_payload());
        assert!(!Instr::Nop.is_payload());
        assert!(Instr::Optimized(0xe3, 2).is_optional());
        assert!(!Instr::Unknown(0x3e, 1).is_optional());
        assert_eq!(Instr::AddIntLit8(Reg::from(0u16), Reg::from(1u16), 3).mnemonic(), "add-int/lit8");
    }

    #[test]
    fn json_operands() {
        let instrs: Vec<Instr> = serde_json::from_str(
            r#"[
                {"op": "nop"},
                {"op": "const4", "args": [1, 0]},
                {"op": "move-result-object", "args": 3},
                {"op": "invoke-static-range", "args": [{"first": 4, "count": 2}, 7]},
                {"op": "if-eqz", "args": [0, -6]},
                {"op": "fill-array-data-payload", "args": [4, [1, 2, 3]]}
            ]"#,
        )
        .unwrap();
        assert_eq!(instrs.len(), 6);
        assert!(matches!(instrs[1], Instr::Const4(_, 0)));
        assert!(matches!(instrs[2], Instr::MoveResultObject(_)));
        assert_eq!(instrs[4].target_offset(), Some(-6));
        assert!(matches!(&instrs[3], Instr::InvokeStaticRange(r, _) if r.len() == 2));
    }
}
