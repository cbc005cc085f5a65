use crate::ast::TypeSpecifier;
use crate::ir::{IrType, Slot, Value};
use std::fmt;

/// Source-level type of a lowered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Float,
    /// Result of a comparison; not declarable.
    Bool,
}

impl ValueType {
    pub fn ir_type(self) -> IrType {
        match self {
            ValueType::Int => IrType::I32,
            ValueType::Float => IrType::F32,
            ValueType::Bool => IrType::I1,
        }
    }
}

impl From<TypeSpecifier> for ValueType {
    fn from(ty: TypeSpecifier) -> Self {
        match ty {
            TypeSpecifier::Int => ValueType::Int,
            TypeSpecifier::Float => ValueType::Float,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
        };
        write!(f, "{}", s)
    }
}

/// A declared variable and the storage backing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    pub ty: ValueType,
    pub identifier: String,
    pub slot: Slot,
}

/// Result of lowering an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum VmValue {
    /// Addressable value: the target of an assignment. `stored` is the value
    /// the assignment wrote, so consumers need not reload it.
    Storage {
        storage: Storage,
        stored: Option<Value>,
    },
    /// SSA result with no address.
    Pure { ty: ValueType, value: Value },
}

impl VmValue {
    pub fn pure(ty: ValueType, value: Value) -> Self {
        VmValue::Pure { ty, value }
    }

    pub fn ty(&self) -> ValueType {
        match self {
            VmValue::Storage { storage, .. } => storage.ty,
            VmValue::Pure { ty, .. } => *ty,
        }
    }
}
