//! AST to IR lowering.
//!
//! A [`CompilationUnit`] owns the builder and the symbol table for one
//! translation unit; the tree walk itself is split across `stmt` and `expr`.

mod expr;
mod stmt;
mod unit;
mod value;

pub use unit::CompilationUnit;
pub use value::{Storage, ValueType, VmValue};

use crate::ast::TranslationUnit;
use crate::ir::{Module, ModuleBuilder};
use crate::{CompileError, CompileOptions};
use log::debug;

/// Lower a translation unit into a verified module.
///
/// The unit is closed on every path; on failure the partially built module
/// is dropped and only the error is returned.
pub fn compile(unit: &TranslationUnit, options: &CompileOptions) -> Result<Module, CompileError> {
    let backend = ModuleBuilder::new(&options.module_name);
    let mut cu = CompilationUnit::open(options, backend)?;

    match cu.lower(unit) {
        Ok(()) => cu.close(),
        Err(err) => {
            debug!("lowering of '{}' failed: {}", options.module_name, err);
            if let Err(close_err) = cu.close() {
                debug!("discarded unit '{}': {}", options.module_name, close_err);
            }
            Err(err)
        }
    }
}
