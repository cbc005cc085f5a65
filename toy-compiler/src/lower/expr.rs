use super::unit::CompilationUnit;
use super::value::{ValueType, VmValue};
use crate::ast::{BinaryOp, Expression};
use crate::ir::{IntPredicate, IrBuilder, Opcode, Predicate, RealPredicate, Value};
use crate::{CompileError, SemanticErrorKind};

impl<B: IrBuilder> CompilationUnit<B> {
    /// Lower an expression bottom-up, operands left to right.
    pub fn lower_expression(&mut self, e: &Expression) -> Result<VmValue, CompileError> {
        match e {
            Expression::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expression(lhs)?;
                let rhs = self.lower_expression(rhs)?;
                if op.is_arithmetic() {
                    self.build_math_op(*op, lhs, rhs)
                } else {
                    self.build_cmp_op(*op, lhs, rhs)
                }
            }

            Expression::Assign { target, value } => {
                // Resolve before touching the right-hand side.
                let storage = self.symbols.resolve(target)?.clone();
                let rhs = self.lower_expression(value)?;

                if rhs.ty() != storage.ty {
                    return Err(CompileError::semantic(
                        SemanticErrorKind::TypeMismatch,
                        "=",
                        format!(
                            "cannot assign {} to '{}' of type {}",
                            rhs.ty(),
                            target,
                            storage.ty
                        ),
                    ));
                }

                let v = self.operand(rhs)?;
                self.backend.store(v, &storage.slot)?;
                Ok(VmValue::Storage {
                    storage,
                    stored: Some(v),
                })
            }

            Expression::Identifier(name) => {
                let storage = self.symbols.resolve(name)?;
                let ty = storage.ty;
                let slot = storage.slot.clone();
                let loaded = self.backend.load(&slot)?;
                Ok(VmValue::pure(ty, loaded))
            }

            Expression::IntConstant(n) => {
                Ok(VmValue::pure(ValueType::Int, self.backend.const_int(*n)))
            }

            Expression::FloatConstant(x) => {
                Ok(VmValue::pure(ValueType::Float, self.backend.const_float(*x)))
            }
        }
    }

    /// Lower a branch condition to an `i1`. Numeric conditions are compared
    /// against zero.
    pub fn lower_condition(&mut self, e: &Expression) -> Result<Value, CompileError> {
        let cond = self.lower_expression(e)?;
        let ty = cond.ty();
        let v = self.operand(cond)?;
        match ty {
            ValueType::Bool => Ok(v),
            ValueType::Int => {
                let zero = self.backend.const_int(0);
                Ok(self
                    .backend
                    .compare(Predicate::Int(IntPredicate::Ne), v, zero)?)
            }
            ValueType::Float => {
                let zero = self.backend.const_float(0.0);
                Ok(self
                    .backend
                    .compare(Predicate::Real(RealPredicate::One), v, zero)?)
            }
        }
    }

    /// The SSA value to feed an instruction. Storage-backed values reuse what
    /// was just stored and only fall back to a load when nothing was.
    fn operand(&mut self, v: VmValue) -> Result<Value, CompileError> {
        match v {
            VmValue::Pure { value, .. } => Ok(value),
            VmValue::Storage {
                stored: Some(value),
                ..
            } => Ok(value),
            VmValue::Storage {
                storage,
                stored: None,
            } => Ok(self.backend.load(&storage.slot)?),
        }
    }

    fn build_math_op(
        &mut self,
        op: BinaryOp,
        lhs: VmValue,
        rhs: VmValue,
    ) -> Result<VmValue, CompileError> {
        let ty = check_operands(op, &lhs, &rhs)?;
        let opcode = map_arith(op, ty);
        let l = self.operand(lhs)?;
        let r = self.operand(rhs)?;
        let result = self.backend.binary_arith(opcode, l, r)?;
        Ok(VmValue::pure(ty, result))
    }

    fn build_cmp_op(
        &mut self,
        op: BinaryOp,
        lhs: VmValue,
        rhs: VmValue,
    ) -> Result<VmValue, CompileError> {
        let ty = check_operands(op, &lhs, &rhs)?;
        let pred = map_cmp(op, ty);
        let l = self.operand(lhs)?;
        let r = self.operand(rhs)?;
        let result = self.backend.compare(pred, l, r)?;
        Ok(VmValue::pure(ValueType::Bool, result))
    }
}

/// Both operands must share one numeric type; there is no implicit widening.
fn check_operands(op: BinaryOp, lhs: &VmValue, rhs: &VmValue) -> Result<ValueType, CompileError> {
    match (lhs.ty(), rhs.ty()) {
        (l, r) if l == r && l != ValueType::Bool => Ok(l),
        (l, r) => Err(CompileError::semantic(
            SemanticErrorKind::TypeMismatch,
            op.symbol(),
            format!("operator '{}' applied to {} and {}", op.symbol(), l, r),
        )),
    }
}

pub fn map_arith(op: BinaryOp, ty: ValueType) -> Opcode {
    let float = ty == ValueType::Float;
    match op {
        BinaryOp::Add if float => Opcode::FAdd,
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub if float => Opcode::FSub,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul if float => Opcode::FMul,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div if float => Opcode::FDiv,
        BinaryOp::Div => Opcode::SDiv,
        _ => unreachable!("map_arith called with comparison operator"),
    }
}

pub fn map_cmp(op: BinaryOp, ty: ValueType) -> Predicate {
    if ty == ValueType::Float {
        Predicate::Real(match op {
            BinaryOp::Gt => RealPredicate::Ogt,
            BinaryOp::Lt => RealPredicate::Olt,
            BinaryOp::Eq => RealPredicate::Oeq,
            BinaryOp::Ne => RealPredicate::One,
            BinaryOp::Le => RealPredicate::Ole,
            BinaryOp::Ge => RealPredicate::Oge,
            _ => unreachable!("map_cmp called with arithmetic operator"),
        })
    } else {
        Predicate::Int(match op {
            BinaryOp::Gt => IntPredicate::Sgt,
            BinaryOp::Lt => IntPredicate::Slt,
            BinaryOp::Eq => IntPredicate::Eq,
            BinaryOp::Ne => IntPredicate::Ne,
            BinaryOp::Le => IntPredicate::Sle,
            BinaryOp::Ge => IntPredicate::Sge,
            _ => unreachable!("map_cmp called with arithmetic operator"),
        })
    }
}
