//! The closed set of output relations.

use strum::{EnumIter, IntoStaticStr};

/// Output relation. Each one is stored in its own `<name>.facts` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, IntoStaticStr)]
pub enum Relation {
    ActualParam,
    ApplicationClass,
    ArrayInitialValueFromConst,
    ArrayInitialValueFromLocal,
    ArrayInsnIndex,
    ArrayType,
    AssignBinop,
    AssignCast,
    AssignHeapAllocation,
    AssignInstanceOf,
    AssignLocal,
    AssignNumConstant,
    AssignOperFrom,
    AssignReturnValue,
    AssignUnop,
    ClassHeap,
    ClassModifier,
    ClassType,
    ComponentType,
    DexInstructionAddressMap,
    DirectSuperclass,
    DirectSuperinterface,
    DynamicMethodInvocation,
    #[strum(serialize = "DynamicMethodInvocation-ParamType")]
    DynamicMethodInvocationParamType,
    EmptyArray,
    EnterMonitor,
    ExceptionHandler,
    #[strum(serialize = "ExceptionHandler-FormalParam")]
    ExceptionHandlerFormalParam,
    #[strum(serialize = "ExceptionHandler-Previous")]
    ExceptionHandlerPrevious,
    ExitMonitor,
    Field,
    #[strum(serialize = "Field-Annotation")]
    FieldAnnotation,
    FieldInitialValue,
    #[strum(serialize = "Field-Modifier")]
    FieldModifier,
    FormalParam,
    Goto,
    If,
    IfVar,
    InterfaceType,
    LoadArrayIndex,
    LoadInstanceField,
    LoadStaticField,
    LookupSwitch,
    #[strum(serialize = "LookupSwitch-Target")]
    LookupSwitchTarget,
    Method,
    #[strum(serialize = "Method-Annotation")]
    MethodAnnotation,
    #[strum(serialize = "Method-DeclaresException")]
    MethodDeclaresException,
    MethodHandleConstant,
    #[strum(serialize = "MethodInvocation-Line")]
    MethodInvocationLine,
    #[strum(serialize = "Method-Modifier")]
    MethodModifier,
    MethodTypeConstant,
    MethodTypeConstantParam,
    NativeMethodId,
    NativeReturnVar,
    NormalHeap,
    NumConstantRaw,
    OperatorAt,
    #[strum(serialize = "Param-Annotation")]
    ParamAnnotation,
    PhantomMethod,
    PhantomType,
    PolymorphicInvocation,
    Return,
    ReturnVoid,
    SpecialMethodInvocation,
    StatementType,
    StaticMethodInvocation,
    StoreArrayIndex,
    StoreInstanceField,
    StoreStaticField,
    StringConstant,
    StringRaw,
    SuperMethodInvocation,
    TableSwitch,
    #[strum(serialize = "TableSwitch-Target")]
    TableSwitchTarget,
    ThisVar,
    Throw,
    #[strum(serialize = "Type-Annotation")]
    TypeAnnotation,
    #[strum(serialize = "Var-DeclaringMethod")]
    VarDeclaringMethod,
    #[strum(serialize = "Var-Type")]
    VarType,
    VirtualMethodInvocation,
}

impl Relation {
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.facts", self.name())
    }
}
