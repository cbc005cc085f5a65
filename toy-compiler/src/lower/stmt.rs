use super::unit::CompilationUnit;
use super::value::{Storage, ValueType};
use crate::ast::{
    CompoundStatement, Declaration, SelectionStatement, Statement, StatementList, WhileStatement,
};
use crate::ir::{BlockId, IrBuilder};
use crate::{CompileError, RedeclarationPolicy, SemanticErrorKind};
use log::trace;

impl<B: IrBuilder> CompilationUnit<B> {
    pub fn lower_statement_list(&mut self, list: &StatementList) -> Result<(), CompileError> {
        for s in list {
            self.lower_statement(s)?;
        }
        Ok(())
    }

    pub fn lower_statement(&mut self, s: &Statement) -> Result<(), CompileError> {
        match s {
            Statement::Declaration(d) => self.lower_declaration(d),
            Statement::Expression(e) => self.lower_expression(e).map(|_| ()),
            Statement::Compound(c) => self.lower_compound(c),
            Statement::Selection(s) => self.lower_selection(s),
            Statement::While(w) => self.lower_while(w),
        }
    }

    pub fn lower_declaration(&mut self, d: &Declaration) -> Result<(), CompileError> {
        if self.symbols.contains(&d.identifier)
            && self.redeclaration == RedeclarationPolicy::Reject
        {
            return Err(CompileError::semantic(
                SemanticErrorKind::DuplicateDeclaration,
                &d.identifier,
                format!("Identifier '{}' is already declared", d.identifier),
            ));
        }

        let ty = ValueType::from(d.type_specifier);
        let slot = self.backend.declare_storage(ty.ir_type(), &d.identifier)?;
        trace!("declare {} {} -> {}", ty, d.identifier, slot);

        self.symbols.put(Storage {
            ty,
            identifier: d.identifier.clone(),
            slot,
        });
        Ok(())
    }

    /// Blocks do not open a scope; the statements share the unit's table.
    pub fn lower_compound(&mut self, c: &CompoundStatement) -> Result<(), CompileError> {
        self.lower_statement_list(&c.statements)
    }

    /// ```text
    ///   <cond>; br cond, then, (else | endif)
    /// then:   <then body>; br endif
    /// else:   <else body>; br endif
    /// endif:
    /// ```
    pub fn lower_selection(&mut self, s: &SelectionStatement) -> Result<(), CompileError> {
        let cond = self.lower_condition(&s.condition)?;

        let then_block = self.backend.new_block("then");
        let else_block = s.else_body.as_ref().map(|_| self.backend.new_block("else"));
        let join = self.backend.new_block("endif");

        self.backend
            .conditional_branch(cond, then_block, else_block.unwrap_or(join))?;

        self.lower_body(then_block, &s.then_body, join)?;
        if let (Some(block), Some(body)) = (else_block, &s.else_body) {
            self.lower_body(block, body, join)?;
        }

        self.move_to(join)
    }

    /// ```text
    ///   br while.cond
    /// while.cond: <cond>; br cond, while.body, while.end
    /// while.body: <body>; br while.cond
    /// while.end:
    /// ```
    pub fn lower_while(&mut self, w: &WhileStatement) -> Result<(), CompileError> {
        let cond_block = self.backend.new_block("while.cond");
        let body_block = self.backend.new_block("while.body");
        let after = self.backend.new_block("while.end");

        self.seal_with_branch(cond_block)?;
        self.move_to(cond_block)?;

        let cond = self.lower_condition(&w.condition)?;
        self.backend.conditional_branch(cond, body_block, after)?;

        // Back-edge: the condition is re-evaluated before every iteration.
        self.lower_body(body_block, &w.body, cond_block)?;

        self.move_to(after)
    }

    /// Lower `body` into `block`, then fall through to `continuation`.
    fn lower_body(
        &mut self,
        block: BlockId,
        body: &CompoundStatement,
        continuation: BlockId,
    ) -> Result<(), CompileError> {
        self.move_to(block)?;
        self.lower_compound(body)?;
        self.seal_with_branch(continuation)
    }
}
