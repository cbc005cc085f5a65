use super::{BlockId, BuilderError, Instr, IrBuilder, IrType, Opcode, Predicate, Reg, Slot, Value};
use log::trace;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

// ============================================================================
// Module structure
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    name: String,
    instrs: Vec<Instr>,
}

impl BasicBlock {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// The final instruction, if it is a terminator.
    pub fn terminator(&self) -> Option<&Instr> {
        self.instrs.last().filter(|i| i.is_terminator())
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator().is_some()
    }
}

/// A `void ()` routine; block 0 is the entry block.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    name: String,
    blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.0)
    }

    pub fn entry(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    /// Every instruction in block order.
    pub fn instrs(&self) -> impl Iterator<Item = &Instr> {
        self.blocks.iter().flat_map(|b| b.instrs.iter())
    }

    fn block_label(&self, id: BlockId) -> String {
        self.block(id)
            .map(|b| format!("%{}", b.name))
            .unwrap_or_else(|| format!("%{}", id))
    }

    fn render_instr(&self, instr: &Instr) -> String {
        match instr {
            Instr::Alloca { slot } => format!("{} = alloca {}", slot, slot.ty()),
            Instr::Load { dst, slot } => {
                format!("%{} = load {}, ptr {}", dst.id, dst.ty, slot)
            }
            Instr::Store { value, slot } => {
                format!("store {} {}, ptr {}", value.ty(), value, slot)
            }
            Instr::Binary { dst, op, lhs, rhs } => {
                format!("%{} = {} {} {}, {}", dst.id, op, lhs.ty(), lhs, rhs)
            }
            Instr::Compare { dst, pred, lhs, rhs } => {
                format!("%{} = {} {} {}, {}", dst.id, pred, lhs.ty(), lhs, rhs)
            }
            Instr::Br { target } => format!("br label {}", self.block_label(*target)),
            Instr::CondBr {
                cond,
                then_block,
                else_block,
            } => format!(
                "br i1 {}, label {}, label {}",
                cond,
                self.block_label(*then_block),
                self.block_label(*else_block)
            ),
            Instr::RetVoid => "ret void".to_string(),
        }
    }

    /// Structural and type checks over the whole routine.
    pub fn verify(&self) -> Result<(), BuilderError> {
        if self.blocks.is_empty() {
            return Err(BuilderError::NoEntryBlock);
        }

        for block in &self.blocks {
            let fail = |reason: String| BuilderError::Verification {
                block: block.name.clone(),
                reason,
            };

            match block.instrs.last() {
                Some(last) if last.is_terminator() => {}
                Some(_) | None => return Err(fail("block does not end in a terminator".into())),
            }
            let terminators = block.instrs.iter().filter(|i| i.is_terminator()).count();
            if terminators != 1 {
                return Err(fail(format!("block has {} terminators", terminators)));
            }

            for instr in &block.instrs {
                if let Some(reason) = instr.type_error() {
                    return Err(fail(reason));
                }
                for succ in instr.successors() {
                    if self.block(succ).is_none() {
                        return Err(fail(format!("branch to unknown block {}", succ)));
                    }
                }
            }
        }

        // Every block must be reachable from the entry.
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([BlockId(0)]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(term) = self.block(id).and_then(BasicBlock::terminator) {
                queue.extend(term.successors());
            }
        }
        if let Some((_, block)) = self
            .blocks
            .iter()
            .enumerate()
            .find(|(i, _)| !seen.contains(&BlockId(*i)))
        {
            return Err(BuilderError::Verification {
                block: block.name.clone(),
                reason: "block is unreachable from the entry block".into(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "define void @{}() {{", self.name)?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block.name)?;
            for instr in &block.instrs {
                writeln!(f, "  {}", self.render_instr(instr))?;
            }
        }
        writeln!(f, "}}")
    }
}

/// One translation unit's worth of IR: a single implicit routine.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    name: String,
    function: Function,
}

impl Module {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn verify(&self) -> Result<(), BuilderError> {
        self.function.verify()
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.to_string().lines().map(str::to_string).collect()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        writeln!(f)?;
        write!(f, "{}", self.function)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`Module`] holding one `void main()` routine.
pub struct ModuleBuilder {
    module: Module,
    insertion: Option<BlockId>,
    next_reg: usize,
    next_slot: usize,
    /// Allocas sit at the top of the entry block, in declaration order.
    allocas: usize,
    /// Block labels and slot names share one namespace in the emitted text.
    locals: HashSet<String>,
    /// Next suffix to try per requested base name.
    suffixes: HashMap<String, usize>,
}

impl ModuleBuilder {
    pub fn new(module_name: &str) -> Self {
        Self {
            module: Module {
                name: module_name.to_string(),
                function: Function {
                    name: "main".to_string(),
                    blocks: Vec::new(),
                },
            },
            insertion: None,
            next_reg: 0,
            next_slot: 0,
            allocas: 0,
            locals: HashSet::new(),
            suffixes: HashMap::new(),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Reserve `base`, or `base` with the first free numeric suffix.
    fn unique_name(&mut self, base: &str) -> String {
        let mut n = self.suffixes.get(base).copied().unwrap_or(0);
        loop {
            let candidate = if n == 0 {
                base.to_string()
            } else {
                format!("{}{}", base, n)
            };
            n += 1;
            if self.locals.insert(candidate.clone()) {
                self.suffixes.insert(base.to_string(), n);
                return candidate;
            }
        }
    }

    fn new_reg(&mut self, ty: IrType) -> Reg {
        let reg = Reg {
            id: self.next_reg,
            ty,
        };
        self.next_reg += 1;
        reg
    }

    /// Append to the insertion block, refusing to write past a terminator or
    /// to build an ill-typed instruction.
    fn append(&mut self, instr: Instr) -> Result<(), BuilderError> {
        let id = self.insertion.ok_or(BuilderError::NoInsertionPoint)?;
        let block = self
            .module
            .function
            .blocks
            .get_mut(id.0)
            .ok_or(BuilderError::UnknownBlock(id))?;

        if block.is_terminated() {
            return Err(BuilderError::BlockTerminated {
                block: block.name.clone(),
            });
        }
        if let Some(reason) = instr.type_error() {
            return Err(BuilderError::IllTyped {
                block: block.name.clone(),
                reason,
            });
        }
        block.instrs.push(instr);
        Ok(())
    }

    fn check_block(&self, id: BlockId) -> Result<(), BuilderError> {
        match self.module.function.block(id) {
            Some(_) => Ok(()),
            None => Err(BuilderError::UnknownBlock(id)),
        }
    }
}

impl IrBuilder for ModuleBuilder {
    type Output = Module;

    fn declare_storage(&mut self, ty: IrType, name: &str) -> Result<Slot, BuilderError> {
        if self.module.function.blocks.is_empty() {
            return Err(BuilderError::NoEntryBlock);
        }
        let base = if name.is_empty() { "tmp" } else { name };
        let slot = Slot::new(self.next_slot, ty, self.unique_name(base));
        let entry = self
            .module
            .function
            .blocks
            .first_mut()
            .ok_or(BuilderError::NoEntryBlock)?;
        entry.instrs.insert(self.allocas, Instr::Alloca { slot: slot.clone() });
        self.allocas += 1;
        self.next_slot += 1;
        Ok(slot)
    }

    fn load(&mut self, slot: &Slot) -> Result<Value, BuilderError> {
        let dst = self.new_reg(slot.ty());
        self.append(Instr::Load {
            dst,
            slot: slot.clone(),
        })?;
        Ok(Value::Reg(dst))
    }

    fn store(&mut self, value: Value, slot: &Slot) -> Result<(), BuilderError> {
        self.append(Instr::Store {
            value,
            slot: slot.clone(),
        })
    }

    fn binary_arith(&mut self, op: Opcode, lhs: Value, rhs: Value) -> Result<Value, BuilderError> {
        let dst = self.new_reg(op.operand_type());
        self.append(Instr::Binary { dst, op, lhs, rhs })?;
        Ok(Value::Reg(dst))
    }

    fn compare(&mut self, pred: Predicate, lhs: Value, rhs: Value) -> Result<Value, BuilderError> {
        let dst = self.new_reg(IrType::I1);
        self.append(Instr::Compare {
            dst,
            pred,
            lhs,
            rhs,
        })?;
        Ok(Value::Reg(dst))
    }

    fn new_block(&mut self, name: &str) -> BlockId {
        let name = self.unique_name(name);
        let blocks = &mut self.module.function.blocks;
        blocks.push(BasicBlock {
            name,
            instrs: Vec::new(),
        });
        let id = BlockId(blocks.len() - 1);
        trace!("new block {} ({})", id, blocks[id.0].name);
        id
    }

    fn set_insertion_point(&mut self, block: BlockId) -> Result<(), BuilderError> {
        self.check_block(block)?;
        self.insertion = Some(block);
        Ok(())
    }

    fn insertion_block(&self) -> Option<BlockId> {
        self.insertion
    }

    fn is_terminated(&self, block: BlockId) -> bool {
        self.module
            .function
            .block(block)
            .map_or(false, BasicBlock::is_terminated)
    }

    fn branch(&mut self, target: BlockId) -> Result<(), BuilderError> {
        self.check_block(target)?;
        self.append(Instr::Br { target })
    }

    fn conditional_branch(
        &mut self,
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), BuilderError> {
        self.check_block(then_block)?;
        self.check_block(else_block)?;
        self.append(Instr::CondBr {
            cond,
            then_block,
            else_block,
        })
    }

    fn return_void(&mut self) -> Result<(), BuilderError> {
        self.append(Instr::RetVoid)
    }

    fn verify(&self) -> Result<(), BuilderError> {
        self.module.verify()
    }

    fn emit(&self) -> String {
        self.module.to_string()
    }

    fn finish(self) -> Module {
        self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IntPredicate;

    fn builder_at_entry() -> (ModuleBuilder, BlockId) {
        let mut b = ModuleBuilder::new("test");
        let entry = b.new_block("entry");
        b.set_insertion_point(entry).unwrap();
        (b, entry)
    }

    #[test]
    fn storage_is_hoisted_into_the_entry_block() {
        let (mut b, _) = builder_at_entry();
        let x = b.declare_storage(IrType::I32, "x").unwrap();
        b.store(Value::ConstInt(1), &x).unwrap();

        let other = b.new_block("other");
        b.branch(other).unwrap();
        b.set_insertion_point(other).unwrap();
        let y = b.declare_storage(IrType::F32, "y").unwrap();
        b.store(Value::ConstFloat(2.0), &y).unwrap();
        b.return_void().unwrap();

        let module = b.finish();
        let entry = module.function().entry().unwrap();
        assert!(matches!(&entry.instrs()[0], Instr::Alloca { slot } if slot.name() == "x"));
        assert!(matches!(&entry.instrs()[1], Instr::Alloca { slot } if slot.name() == "y"));
        assert!(module.verify().is_ok());
    }

    #[test]
    fn appending_after_terminator_is_rejected() {
        let (mut b, _) = builder_at_entry();
        b.return_void().unwrap();
        let err = b.return_void().unwrap_err();
        assert_eq!(
            err,
            BuilderError::BlockTerminated {
                block: "entry".into()
            }
        );
    }

    #[test]
    fn ill_typed_arith_is_rejected() {
        let (mut b, _) = builder_at_entry();
        let err = b
            .binary_arith(Opcode::FAdd, Value::ConstInt(1), Value::ConstInt(2))
            .unwrap_err();
        assert!(matches!(err, BuilderError::IllTyped { .. }));
    }

    #[test]
    fn verify_flags_unterminated_block() {
        let (mut b, _) = builder_at_entry();
        let x = b.declare_storage(IrType::I32, "x").unwrap();
        b.store(Value::ConstInt(1), &x).unwrap();
        assert!(matches!(
            b.verify(),
            Err(BuilderError::Verification { ref block, .. }) if block == "entry"
        ));
    }

    #[test]
    fn verify_flags_unreachable_block() {
        let (mut b, _) = builder_at_entry();
        b.return_void().unwrap();
        let orphan = b.new_block("orphan");
        b.set_insertion_point(orphan).unwrap();
        b.return_void().unwrap();
        assert!(matches!(
            b.verify(),
            Err(BuilderError::Verification { ref block, .. }) if block == "orphan"
        ));
    }

    #[test]
    fn block_and_slot_names_are_uniqued() {
        let (mut b, _) = builder_at_entry();
        let a = b.new_block("then");
        let c = b.new_block("then");
        let x0 = b.declare_storage(IrType::I32, "x").unwrap();
        let x1 = b.declare_storage(IrType::I32, "x").unwrap();

        let function = b.module().function();
        assert_eq!(function.block(a).unwrap().name(), "then");
        assert_eq!(function.block(c).unwrap().name(), "then1");
        assert_eq!(x0.name(), "x");
        assert_eq!(x1.name(), "x1");
    }

    #[test]
    fn suffixed_names_skip_names_already_taken() {
        let (mut b, _) = builder_at_entry();
        let x = b.declare_storage(IrType::I32, "x").unwrap();
        let x1 = b.declare_storage(IrType::I32, "x1").unwrap();
        let again = b.declare_storage(IrType::I32, "x").unwrap();
        assert_eq!((x.name(), x1.name(), again.name()), ("x", "x1", "x2"));
    }

    #[test]
    fn slots_and_blocks_share_one_namespace() {
        let (mut b, entry) = builder_at_entry();
        let slot = b.declare_storage(IrType::I32, "entry").unwrap();
        assert_eq!(slot.name(), "entry1");

        let block = b.new_block("entry");
        assert_eq!(b.module().function().block(block).unwrap().name(), "entry2");
        assert_eq!(b.module().function().block(entry).unwrap().name(), "entry");
    }

    #[test]
    fn emit_renders_llvm_style_text() {
        let (mut b, _) = builder_at_entry();
        let x = b.declare_storage(IrType::I32, "x").unwrap();
        b.store(Value::ConstInt(3), &x).unwrap();
        let v = b.load(&x).unwrap();
        let sum = b.binary_arith(Opcode::Add, v, Value::ConstInt(2)).unwrap();
        let cmp = b
            .compare(Predicate::Int(IntPredicate::Sgt), sum, Value::ConstInt(0))
            .unwrap();
        let done = b.new_block("done");
        b.conditional_branch(cmp, done, done).unwrap();
        b.set_insertion_point(done).unwrap();
        b.return_void().unwrap();

        let expected = "\
; ModuleID = 'test'

define void @main() {
entry:
  %x = alloca i32
  store i32 3, ptr %x
  %0 = load i32, ptr %x
  %1 = add i32 %0, 2
  %2 = icmp sgt i32 %1, 0
  br i1 %2, label %done, label %done

done:
  ret void
}
";
        assert_eq!(b.emit(), expected);
    }
}
