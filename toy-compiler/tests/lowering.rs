use toy_compiler::ir::{
    BasicBlock, BlockId, BuilderError, Instr, IntPredicate, IrBuilder, IrType, Module,
    ModuleBuilder, Opcode, Predicate, Slot, Value,
};
use toy_compiler::{
    compile_source, parse, CompilationUnit, CompileError, CompileOptions, InternalFault,
};

fn lower(source: &str) -> Module {
    compile_source(source, &CompileOptions::default()).expect("program should lower")
}

fn count(module: &Module, pred: impl Fn(&Instr) -> bool) -> usize {
    module.function().instrs().filter(|i| pred(i)).count()
}

fn block_named<'m>(module: &'m Module, name: &str) -> (BlockId, &'m BasicBlock) {
    module
        .function()
        .blocks()
        .iter()
        .enumerate()
        .find(|(_, b)| b.name() == name)
        .map(|(i, b)| (BlockId(i), b))
        .unwrap_or_else(|| panic!("no block named {name}"))
}

// ── Straight-line code ───────────────────────────────────────────────────

#[test]
fn declarations_stores_and_arithmetic() {
    let module = lower("int x; x = 3; int y; y = x + 2;");

    assert_eq!(count(&module, |i| matches!(i, Instr::Alloca { .. })), 2);
    assert_eq!(count(&module, |i| matches!(i, Instr::Load { .. })), 1);
    assert_eq!(count(&module, |i| matches!(i, Instr::Store { .. })), 2);

    let stores: Vec<_> = module
        .function()
        .instrs()
        .filter_map(|i| match i {
            Instr::Store { value, slot } => Some((*value, slot.name().to_string())),
            _ => None,
        })
        .collect();
    assert_eq!(stores[0], (Value::ConstInt(3), "x".to_string()));
    assert_eq!(stores[1].1, "y");

    let adds: Vec<_> = module
        .function()
        .instrs()
        .filter_map(|i| match i {
            Instr::Binary { op, rhs, .. } => Some((*op, *rhs)),
            _ => None,
        })
        .collect();
    assert_eq!(adds, vec![(Opcode::Add, Value::ConstInt(2))]);
}

#[test]
fn emitted_text() {
    let module = lower("int x; x = 3; int y; y = x + 2;");
    let expected = "\
; ModuleID = 'Toy'

define void @main() {
entry:
  %x = alloca i32
  %y = alloca i32
  store i32 3, ptr %x
  %0 = load i32, ptr %x
  %1 = add i32 %0, 2
  store i32 %1, ptr %y
  ret void
}
";
    assert_eq!(module.to_string(), expected);
}

#[test]
fn module_name_comes_from_options() {
    let options = CompileOptions {
        module_name: "demo".to_string(),
        ..CompileOptions::default()
    };
    let module = compile_source("int x;", &options).unwrap();
    assert_eq!(module.name(), "demo");
    assert_eq!(module.to_lines()[0], "; ModuleID = 'demo'");
}

#[test]
fn float_operands_use_float_opcodes() {
    let module = lower("float a; float b; a = 1.5; b = a * 2.0 - a / 4.0; b = b + a;");
    let ops: Vec<Opcode> = module
        .function()
        .instrs()
        .filter_map(|i| match i {
            Instr::Binary { op, .. } => Some(*op),
            _ => None,
        })
        .collect();
    assert_eq!(ops, vec![Opcode::FMul, Opcode::FDiv, Opcode::FSub, Opcode::FAdd]);
}

#[test]
fn integer_division_is_sdiv() {
    let module = lower("int a; a = 7 / 2;");
    assert_eq!(
        count(&module, |i| matches!(i, Instr::Binary { op: Opcode::SDiv, .. })),
        1
    );
}

#[test]
fn chained_assignment_reuses_stored_value() {
    let module = lower("int x; int y; y = x = 4;");

    assert_eq!(count(&module, |i| matches!(i, Instr::Load { .. })), 0);
    let stored: Vec<_> = module
        .function()
        .instrs()
        .filter_map(|i| match i {
            Instr::Store { value, slot } => Some((slot.name().to_string(), *value)),
            _ => None,
        })
        .collect();
    assert_eq!(
        stored,
        vec![
            ("x".to_string(), Value::ConstInt(4)),
            ("y".to_string(), Value::ConstInt(4)),
        ]
    );
}

#[test]
fn assignment_result_feeds_arithmetic() {
    let module = lower("int x; int y; y = (x = 2) + 1;");
    assert_eq!(count(&module, |i| matches!(i, Instr::Load { .. })), 0);
    assert!(module.function().instrs().any(|i| matches!(
        i,
        Instr::Binary { op: Opcode::Add, lhs: Value::ConstInt(2), rhs: Value::ConstInt(1), .. }
    )));
}

#[test]
fn variable_named_like_a_block_gets_its_own_name() {
    let module = lower("int entry; entry = 1;");
    let text = module.to_string();
    assert!(text.contains("entry:\n"));
    assert!(text.contains("%entry1 = alloca i32"));
    assert!(text.contains("store i32 1, ptr %entry1"));
}

// ── Control flow ─────────────────────────────────────────────────────────

#[test]
fn if_else_branches_join() {
    let module = lower("int x; int y; x = 1; if (x > 0) { y = 1; } else { y = 0; }");

    assert_eq!(count(&module, |i| matches!(i, Instr::CondBr { .. })), 1);

    let (then_id, then_block) = block_named(&module, "then");
    let (else_id, else_block) = block_named(&module, "else");
    let (join_id, join_block) = block_named(&module, "endif");

    let (_, entry) = block_named(&module, "entry");
    match entry.terminator() {
        Some(Instr::CondBr { then_block, else_block, .. }) => {
            assert_eq!((*then_block, *else_block), (then_id, else_id));
        }
        other => panic!("entry should end in a conditional branch, got {other:?}"),
    }

    assert_eq!(then_block.terminator(), Some(&Instr::Br { target: join_id }));
    assert_eq!(else_block.terminator(), Some(&Instr::Br { target: join_id }));
    assert_eq!(join_block.terminator(), Some(&Instr::RetVoid));
    assert!(module.verify().is_ok());
}

#[test]
fn if_without_else_falls_through_to_join() {
    let module = lower("int x; x = 1; if (x == 1) { x = 2; }");

    let (then_id, _) = block_named(&module, "then");
    let (join_id, _) = block_named(&module, "endif");
    let (_, entry) = block_named(&module, "entry");
    match entry.terminator() {
        Some(Instr::CondBr { then_block, else_block, .. }) => {
            assert_eq!((*then_block, *else_block), (then_id, join_id));
        }
        other => panic!("expected conditional branch, got {other:?}"),
    }
    assert!(module.function().blocks().iter().all(|b| b.name() != "else"));
}

#[test]
fn while_reevaluates_condition() {
    let module = lower("int x; x = 0; while (x < 10) { x = x + 1; }");

    let (cond_id, cond) = block_named(&module, "while.cond");
    let (body_id, body) = block_named(&module, "while.body");
    let (end_id, end) = block_named(&module, "while.end");
    let (_, entry) = block_named(&module, "entry");

    assert_eq!(entry.terminator(), Some(&Instr::Br { target: cond_id }));
    assert!(cond.instrs().iter().any(|i| matches!(
        i,
        Instr::Compare { pred: Predicate::Int(IntPredicate::Slt), .. }
    )));
    match cond.terminator() {
        Some(Instr::CondBr { then_block, else_block, .. }) => {
            assert_eq!((*then_block, *else_block), (body_id, end_id));
        }
        other => panic!("condition block should branch two ways, got {other:?}"),
    }
    assert_eq!(body.terminator(), Some(&Instr::Br { target: cond_id }));
    assert_eq!(end.terminator(), Some(&Instr::RetVoid));
}

#[test]
fn numeric_condition_compares_against_zero() {
    let module = lower("int x; x = 3; while (x) { x = x - 1; }");
    let (_, cond) = block_named(&module, "while.cond");
    assert!(cond.instrs().iter().any(|i| matches!(
        i,
        Instr::Compare { pred: Predicate::Int(IntPredicate::Ne), rhs: Value::ConstInt(0), .. }
    )));
}

#[test]
fn nested_control_flow_gets_unique_block_names() {
    let module = lower(
        "int i; i = 0;
         while (i < 3) {
             if (i == 1) { i = i + 2; }
             if (i == 2) { i = i + 1; } else { i = i + 1; }
         }",
    );
    for name in ["then", "then1", "endif", "endif1", "else"] {
        block_named(&module, name);
    }
    assert!(module.verify().is_ok());
}

#[test]
fn declarations_in_blocks_are_hoisted_and_stay_visible() {
    let module = lower("int c; c = 1; if (c) { int t; t = 2; } t = 3;");

    let (_, entry) = block_named(&module, "entry");
    let allocas: Vec<&str> = entry
        .instrs()
        .iter()
        .filter_map(|i| match i {
            Instr::Alloca { slot } => Some(slot.name()),
            _ => None,
        })
        .collect();
    assert_eq!(allocas, vec!["c", "t"]);
    assert!(matches!(entry.instrs()[0], Instr::Alloca { .. }));
    assert!(matches!(entry.instrs()[1], Instr::Alloca { .. }));
}

// ── Compilation unit ─────────────────────────────────────────────────────

#[test]
fn declared_names_stay_bound_until_close() {
    let unit = parse("int x; x = 1; float y; { int z; } y = 2.0;").unwrap();
    let mut cu =
        CompilationUnit::open(&CompileOptions::default(), ModuleBuilder::new("t")).unwrap();

    let mut expected = Vec::new();
    for stmt in &unit.statements {
        cu.lower_statement(stmt).unwrap();
        if let toy_compiler::ast::Statement::Declaration(d) = stmt {
            expected.push(d.identifier.clone());
        }
        for name in &expected {
            assert!(cu.symbols().contains(name), "{name} should be bound");
        }
    }
    // Declared inside a block, still visible at unit level.
    assert_eq!(cu.symbols().get("z").map(|s| s.slot.ty()), Some(IrType::I32));
    assert_eq!(cu.symbols().len(), 3);

    let module = cu.close().unwrap();
    assert!(module.verify().is_ok());
}

#[test]
fn close_seals_the_open_block() {
    let cu =
        CompilationUnit::open(&CompileOptions::default(), ModuleBuilder::new("empty")).unwrap();
    let module = cu.close().unwrap();

    let blocks = module.function().blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].instrs(), &[Instr::RetVoid]);
}

/// Forwards to a `ModuleBuilder` but drops unconditional branches, leaving
/// blocks without a terminator.
struct DroppingBranches(ModuleBuilder);

impl IrBuilder for DroppingBranches {
    type Output = Module;

    fn declare_storage(&mut self, ty: IrType, name: &str) -> Result<Slot, BuilderError> {
        self.0.declare_storage(ty, name)
    }
    fn load(&mut self, slot: &Slot) -> Result<Value, BuilderError> {
        self.0.load(slot)
    }
    fn store(&mut self, value: Value, slot: &Slot) -> Result<(), BuilderError> {
        self.0.store(value, slot)
    }
    fn binary_arith(&mut self, op: Opcode, lhs: Value, rhs: Value) -> Result<Value, BuilderError> {
        self.0.binary_arith(op, lhs, rhs)
    }
    fn compare(&mut self, pred: Predicate, lhs: Value, rhs: Value) -> Result<Value, BuilderError> {
        self.0.compare(pred, lhs, rhs)
    }
    fn new_block(&mut self, name: &str) -> BlockId {
        self.0.new_block(name)
    }
    fn set_insertion_point(&mut self, block: BlockId) -> Result<(), BuilderError> {
        self.0.set_insertion_point(block)
    }
    fn insertion_block(&self) -> Option<BlockId> {
        self.0.insertion_block()
    }
    fn is_terminated(&self, block: BlockId) -> bool {
        self.0.is_terminated(block)
    }
    fn branch(&mut self, _target: BlockId) -> Result<(), BuilderError> {
        Ok(())
    }
    fn conditional_branch(
        &mut self,
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), BuilderError> {
        self.0.conditional_branch(cond, then_block, else_block)
    }
    fn return_void(&mut self) -> Result<(), BuilderError> {
        self.0.return_void()
    }
    fn verify(&self) -> Result<(), BuilderError> {
        self.0.verify()
    }
    fn emit(&self) -> String {
        self.0.emit()
    }
    fn finish(self) -> Module {
        self.0.finish()
    }
}

#[test]
fn leaving_an_unterminated_block_is_an_internal_fault() {
    let unit = parse("int x; x = 1; if (x > 0) { x = 2; }").unwrap();
    let backend = DroppingBranches(ModuleBuilder::new("t"));
    let mut cu = CompilationUnit::open(&CompileOptions::default(), backend).unwrap();

    let err = cu.lower(&unit).unwrap_err();
    // The then-block (bb1) is left without its branch to the join.
    assert!(
        matches!(
            err,
            CompileError::Internal(InternalFault::UnterminatedBlock(BlockId(1)))
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn entering_a_loop_without_a_branch_is_an_internal_fault() {
    let unit = parse("int x; while (x < 3) { x = x + 1; }").unwrap();
    let backend = DroppingBranches(ModuleBuilder::new("t"));
    let mut cu = CompilationUnit::open(&CompileOptions::default(), backend).unwrap();

    // The entry block never gets its branch into the condition block.
    assert!(matches!(
        cu.lower(&unit),
        Err(CompileError::Internal(InternalFault::UnterminatedBlock(BlockId(0))))
    ));
}

// ── Sample programs ──────────────────────────────────────────────────────

#[test]
fn samples_compile_and_verify() {
    for sample in ["countdown", "branches", "average"] {
        let path = format!("../samples/{sample}.toy");
        let source = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {path}: {e}"));
        let module = compile_source(&source, &CompileOptions::default())
            .unwrap_or_else(|e| panic!("{sample}.toy should compile: {e}"));
        assert!(module.verify().is_ok());
    }
}
