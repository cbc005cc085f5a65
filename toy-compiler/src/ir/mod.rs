//! Intermediate representation and the builder interface the lowering pass
//! drives.
//!
//! - [`IrBuilder`]: the capability the lowering pass calls into.
//! - [`ModuleBuilder`] / [`Module`]: the in-memory SSA implementation.
//! - [`Instr`], [`Value`] and friends: the instruction vocabulary.

mod instr;
mod module;

pub use instr::*;
pub use module::{BasicBlock, Function, Module, ModuleBuilder};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuilderError {
    #[error("no insertion point is set")]
    NoInsertionPoint,

    #[error("the routine has no entry block to hold storage")]
    NoEntryBlock,

    #[error("unknown block {0}")]
    UnknownBlock(BlockId),

    #[error("block '{block}' is already terminated")]
    BlockTerminated { block: String },

    #[error("ill-typed instruction in block '{block}': {reason}")]
    IllTyped { block: String, reason: String },

    #[error("verification failed in block '{block}': {reason}")]
    Verification { block: String, reason: String },
}

// ============================================================================
// Builder trait
// ============================================================================

/// Operations the lowering pass needs from an IR backend.
///
/// Every instruction-building call appends at the current insertion point;
/// storage allocation is the exception and always lands in the entry block.
pub trait IrBuilder {
    /// What [`IrBuilder::finish`] hands downstream.
    type Output;

    fn declare_storage(&mut self, ty: IrType, name: &str) -> Result<Slot, BuilderError>;
    fn load(&mut self, slot: &Slot) -> Result<Value, BuilderError>;
    fn store(&mut self, value: Value, slot: &Slot) -> Result<(), BuilderError>;
    fn binary_arith(&mut self, op: Opcode, lhs: Value, rhs: Value) -> Result<Value, BuilderError>;
    fn compare(&mut self, pred: Predicate, lhs: Value, rhs: Value) -> Result<Value, BuilderError>;

    fn const_int(&self, value: i32) -> Value {
        Value::ConstInt(value)
    }

    fn const_float(&self, value: f32) -> Value {
        Value::ConstFloat(value)
    }

    // ── Blocks and control flow ─────────────────────────────────────────
    fn new_block(&mut self, name: &str) -> BlockId;
    fn set_insertion_point(&mut self, block: BlockId) -> Result<(), BuilderError>;
    fn insertion_block(&self) -> Option<BlockId>;
    fn is_terminated(&self, block: BlockId) -> bool;
    fn branch(&mut self, target: BlockId) -> Result<(), BuilderError>;
    fn conditional_branch(
        &mut self,
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), BuilderError>;
    fn return_void(&mut self) -> Result<(), BuilderError>;

    // ── Finalisation ────────────────────────────────────────────────────
    fn verify(&self) -> Result<(), BuilderError>;
    fn emit(&self) -> String;
    fn finish(self) -> Self::Output;
}
