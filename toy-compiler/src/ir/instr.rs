use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    /// Boolean produced by comparisons.
    I1,
    I32,
    F32,
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IrType::I1 => "i1",
            IrType::I32 => "i32",
            IrType::F32 => "float",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// SSA register: defined exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg {
    pub id: usize,
    pub ty: IrType,
}

/// Addressable storage for one named variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    id: usize,
    ty: IrType,
    name: String,
}

impl Slot {
    pub fn new(id: usize, ty: IrType, name: impl Into<String>) -> Self {
        Self {
            id,
            ty,
            name: name.into(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Type of the value held in the slot.
    pub fn ty(&self) -> IrType {
        self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.name)
    }
}

/// An operand: a constant or the result of an earlier instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    ConstInt(i32),
    ConstFloat(f32),
    Reg(Reg),
}

impl Value {
    pub fn ty(&self) -> IrType {
        match self {
            Value::ConstInt(_) => IrType::I32,
            Value::ConstFloat(_) => IrType::F32,
            Value::Reg(r) => r.ty,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::ConstInt(i) => write!(f, "{i}"),
            Value::ConstFloat(x) => write!(f, "{x:?}"),
            Value::Reg(r) => write!(f, "%{}", r.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    SDiv,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

impl Opcode {
    pub fn is_float(self) -> bool {
        matches!(self, Opcode::FAdd | Opcode::FSub | Opcode::FMul | Opcode::FDiv)
    }

    /// Operand (and result) type the opcode is defined on.
    pub fn operand_type(self) -> IrType {
        if self.is_float() {
            IrType::F32
        } else {
            IrType::I32
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::SDiv => "sdiv",
            Opcode::FAdd => "fadd",
            Opcode::FSub => "fsub",
            Opcode::FMul => "fmul",
            Opcode::FDiv => "fdiv",
        };
        write!(f, "{}", s)
    }
}

/// Signed integer comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    Sgt,
    Slt,
    Eq,
    Ne,
    Sle,
    Sge,
}

/// Ordered floating-point comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealPredicate {
    Ogt,
    Olt,
    Oeq,
    One,
    Ole,
    Oge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Predicate {
    Int(IntPredicate),
    Real(RealPredicate),
}

impl Predicate {
    pub fn operand_type(self) -> IrType {
        match self {
            Predicate::Int(_) => IrType::I32,
            Predicate::Real(_) => IrType::F32,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Predicate::Int(IntPredicate::Sgt) => "icmp sgt",
            Predicate::Int(IntPredicate::Slt) => "icmp slt",
            Predicate::Int(IntPredicate::Eq) => "icmp eq",
            Predicate::Int(IntPredicate::Ne) => "icmp ne",
            Predicate::Int(IntPredicate::Sle) => "icmp sle",
            Predicate::Int(IntPredicate::Sge) => "icmp sge",
            Predicate::Real(RealPredicate::Ogt) => "fcmp ogt",
            Predicate::Real(RealPredicate::Olt) => "fcmp olt",
            Predicate::Real(RealPredicate::Oeq) => "fcmp oeq",
            Predicate::Real(RealPredicate::One) => "fcmp one",
            Predicate::Real(RealPredicate::Ole) => "fcmp ole",
            Predicate::Real(RealPredicate::Oge) => "fcmp oge",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// `%slot = alloca ty`
    Alloca { slot: Slot },

    /// `%dst = load ty, ptr %slot`
    Load { dst: Reg, slot: Slot },

    /// `store ty value, ptr %slot`
    Store { value: Value, slot: Slot },

    /// `%dst = op ty lhs, rhs`
    Binary {
        dst: Reg,
        op: Opcode,
        lhs: Value,
        rhs: Value,
    },

    /// `%dst = icmp/fcmp pred ty lhs, rhs`
    Compare {
        dst: Reg,
        pred: Predicate,
        lhs: Value,
        rhs: Value,
    },

    /// `br label %target`
    Br { target: BlockId },

    /// `br i1 cond, label %then, label %else`
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },

    /// `ret void`
    RetVoid,
}

impl Instr {
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instr::Br { .. } | Instr::CondBr { .. } | Instr::RetVoid)
    }

    /// Blocks this instruction may transfer control to.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Instr::Br { target } => vec![*target],
            Instr::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            _ => Vec::new(),
        }
    }

    /// Check operand types against what the instruction is defined on.
    pub fn type_error(&self) -> Option<String> {
        match self {
            Instr::Load { dst, slot } if dst.ty != slot.ty() => Some(format!(
                "load of {} from slot {} holding {}",
                dst.ty,
                slot,
                slot.ty()
            )),
            Instr::Store { value, slot } if value.ty() != slot.ty() => Some(format!(
                "store of {} {} into slot {} holding {}",
                value.ty(),
                value,
                slot,
                slot.ty()
            )),
            Instr::Binary { op, lhs, rhs, dst } => {
                let want = op.operand_type();
                if lhs.ty() != want || rhs.ty() != want || dst.ty != want {
                    Some(format!(
                        "'{}' expects {} operands, got {} and {}",
                        op,
                        want,
                        lhs.ty(),
                        rhs.ty()
                    ))
                } else {
                    None
                }
            }
            Instr::Compare { pred, lhs, rhs, dst } => {
                let want = pred.operand_type();
                if lhs.ty() != want || rhs.ty() != want || dst.ty != IrType::I1 {
                    Some(format!(
                        "'{}' expects {} operands, got {} and {}",
                        pred,
                        want,
                        lhs.ty(),
                        rhs.ty()
                    ))
                } else {
                    None
                }
            }
            Instr::CondBr { cond, .. } if cond.ty() != IrType::I1 => Some(format!(
                "conditional branch on {} {} instead of i1",
                cond.ty(),
                cond
            )),
            _ => None,
        }
    }
}
