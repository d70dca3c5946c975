//! Light per-instruction typing of arithmetic, conversion, move and constant
//! opcodes.

use df_dex::instrs::Instr;
use strum::IntoStaticStr;

/// Type categories of register contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum InferType {
    /// Untyped 32 bits pattern.
    Bits32,
    /// Untyped 64 bits pattern.
    Bits64,
    Int32,
    Long,
    Float,
    Double,
    Byte,
    Char,
    Short,
    Obj,
    /// Any 32 bits primitive.
    Prim32,
    /// Any 64 bits primitive.
    Prim64,
}

impl InferType {
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Returns the input and output type categories of an instruction, if it
/// belongs to the typed families.
#[allow(clippy::enum_glob_use)]
#[must_use]
pub fn statement_type(instr: &Instr) -> Option<(InferType, InferType)> {
    use InferType::*;
    use Instr::*;

    let types = match instr {
        AddInt(..) | SubInt(..) | MulInt(..) | DivInt(..) | RemInt(..) | AndInt(..)
        | OrInt(..) | XorInt(..) | ShlInt(..) | ShrInt(..) | UshrInt(..) | RsubInt(..)
        | AddInt2addr(..) | SubInt2addr(..) | MulInt2addr(..) | DivInt2addr(..)
        | RemInt2addr(..) | AndInt2addr(..) | OrInt2addr(..) | XorInt2addr(..)
        | ShlInt2addr(..) | ShrInt2addr(..) | UshrInt2addr(..) | AddIntLit16(..)
        | MulIntLit16(..) | DivIntLit16(..) | RemIntLit16(..) | AndIntLit16(..)
        | OrIntLit16(..) | XorIntLit16(..) | AddIntLit8(..) | RsubIntLit8(..)
        | MulIntLit8(..) | DivIntLit8(..) | RemIntLit8(..) | AndIntLit8(..)
        | OrIntLit8(..) | XorIntLit8(..) | ShlIntLit8(..) | ShrIntLit8(..)
        | UshrIntLit8(..) | NegInt(..) | NotInt(..) => (Int32, Int32),

        AddLong(..) | SubLong(..) | MulLong(..) | DivLong(..) | RemLong(..) | AndLong(..)
        | OrLong(..) | XorLong(..) | ShlLong(..) | ShrLong(..) | UshrLong(..) | CmpLong(..)
        | AddLong2addr(..) | SubLong2addr(..) | MulLong2addr(..) | DivLong2addr(..)
        | RemLong2addr(..) | AndLong2addr(..) | OrLong2addr(..) | XorLong2addr(..)
        | ShlLong2addr(..) | ShrLong2addr(..) | UshrLong2addr(..) | NegLong(..)
        | NotLong(..) => (Long, Long),

        AddFloat(..) | SubFloat(..) | MulFloat(..) | DivFloat(..) | RemFloat(..)
        | CmplFloat(..) | CmpgFloat(..) | AddFloat2addr(..) | SubFloat2addr(..)
        | MulFloat2addr(..) | DivFloat2addr(..) | RemFloat2addr(..) | NegFloat(..) => {
            (Float, Float)
        }

        AddDouble(..) | SubDouble(..) | MulDouble(..) | DivDouble(..) | RemDouble(..)
        | CmplDouble(..) | CmpgDouble(..) | AddDouble2addr(..) | SubDouble2addr(..)
        | MulDouble2addr(..) | DivDouble2addr(..) | RemDouble2addr(..) | NegDouble(..) => {
            (Double, Double)
        }

        IntToLong(..) => (Int32, Long),
        IntToFloat(..) => (Int32, Float),
        IntToDouble(..) => (Int32, Double),
        IntToByte(..) => (Int32, Byte),
        IntToChar(..) => (Int32, Char),
        IntToShort(..) => (Int32, Short),
        LongToInt(..) => (Long, Int32),
        LongToFloat(..) => (Long, Float),
        LongToDouble(..) => (Long, Double),
        FloatToInt(..) => (Float, Int32),
        FloatToLong(..) => (Float, Long),
        FloatToDouble(..) => (Float, Double),
        DoubleToInt(..) => (Double, Int32),
        DoubleToLong(..) => (Double, Long),
        DoubleToFloat(..) => (Double, Float),
        ArrayLength(..) => (Obj, Int32),

        Move(..) | MoveFrom16(..) | Move16(..) => (Prim32, Prim32),
        MoveWide(..) | MoveWideFrom16(..) | MoveWide16(..) => (Prim64, Prim64),
        MoveObject(..) | MoveObjectFrom16(..) | MoveObject16(..) => (Obj, Obj),

        Const4(..) | Const16(..) | Const(..) | ConstHigh16(..) => (Bits32, Bits32),
        ConstWide16(..) | ConstWide32(..) | ConstWide(..) | ConstWideHigh16(..) => {
            (Bits64, Bits64)
        }

        _ => return None,
    };
    Some(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_dex::registers::Reg;

    fn r(n: u16) -> Reg {
        Reg::from(n)
    }

    #[test]
    fn conversions() {
        assert_eq!(
            statement_type(&Instr::IntToDouble(r(0), r(1))),
            Some((InferType::Int32, InferType::Double))
        );
        assert_eq!(
            statement_type(&Instr::DoubleToInt(r(0), r(2))),
            Some((InferType::Double, InferType::Int32))
        );
        assert_eq!(
            statement_type(&Instr::ArrayLength(r(0), r(1))),
            Some((InferType::Obj, InferType::Int32))
        );
    }

    #[test]
    fn untyped_families() {
        assert_eq!(statement_type(&Instr::ReturnVoid), None);
        assert_eq!(statement_type(&Instr::Goto(3)), None);
        assert_eq!(
            statement_type(&Instr::ConstWideHigh16(r(0), 1)),
            Some((InferType::Bits64, InferType::Bits64))
        );
    }

    #[test]
    fn names() {
        assert_eq!(InferType::Bits32.name(), "BITS32");
        assert_eq!(InferType::Prim64.name(), "PRIM64");
        assert_eq!(InferType::Obj.name(), "OBJ");
    }
}
