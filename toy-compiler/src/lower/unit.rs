use crate::ast::TranslationUnit;
use crate::ir::{BlockId, IrBuilder};
use crate::symbol_table::SymbolTable;
use crate::{CompileError, CompileOptions, InternalFault, RedeclarationPolicy};
use log::{debug, trace};

/// Lowering state for one translation unit: the backend handle, the symbol
/// table and the redeclaration policy.
pub struct CompilationUnit<B: IrBuilder> {
    pub(super) backend: B,
    pub(super) symbols: SymbolTable,
    pub(super) redeclaration: RedeclarationPolicy,
    name: String,
}

impl<B: IrBuilder> CompilationUnit<B> {
    /// Create the entry block of the implicit routine and position the
    /// builder there.
    pub fn open(options: &CompileOptions, mut backend: B) -> Result<Self, CompileError> {
        let entry = backend.new_block("entry");
        backend.set_insertion_point(entry)?;
        debug!("opened unit '{}'", options.module_name);

        Ok(Self {
            backend,
            symbols: SymbolTable::new(),
            redeclaration: options.redeclaration,
            name: options.module_name.clone(),
        })
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Lower the unit's top-level statements into the current block.
    pub fn lower(&mut self, unit: &TranslationUnit) -> Result<(), CompileError> {
        self.lower_statement_list(&unit.statements)
    }

    /// Seal the open block with a return, verify, and hand over the
    /// backend's output. The symbol table is released here.
    pub fn close(self) -> Result<B::Output, CompileError> {
        let Self {
            mut backend, name, ..
        } = self;

        let current = backend
            .insertion_block()
            .ok_or(InternalFault::NoInsertionPoint)?;
        if !backend.is_terminated(current) {
            backend.return_void()?;
        }

        trace!("unit '{}':\n{}", name, backend.emit());
        if let Err(err) = backend.verify() {
            debug!("unit '{}' failed verification: {}", name, err);
            return Err(err.into());
        }

        debug!("closed unit '{}'", name);
        Ok(backend.finish())
    }

    pub(super) fn current_block(&self) -> Result<BlockId, CompileError> {
        Ok(self
            .backend
            .insertion_block()
            .ok_or(InternalFault::NoInsertionPoint)?)
    }

    /// Move the insertion point to `block`. The block being left must
    /// already end in a terminator.
    pub(super) fn move_to(&mut self, block: BlockId) -> Result<(), CompileError> {
        let current = self.current_block()?;
        if !self.backend.is_terminated(current) {
            return Err(InternalFault::UnterminatedBlock(current).into());
        }
        self.backend.set_insertion_point(block)?;
        Ok(())
    }

    /// Branch to `target` unless the current block is already terminated.
    pub(super) fn seal_with_branch(&mut self, target: BlockId) -> Result<(), CompileError> {
        let current = self.current_block()?;
        if !self.backend.is_terminated(current) {
            trace!("br {} -> {}", current, target);
            self.backend.branch(target)?;
        }
        Ok(())
    }
}
