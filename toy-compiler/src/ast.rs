//! Abstract syntax tree for one Toy translation unit.
//!
//! The tree is strictly owned parent → child: every node is held by exactly
//! one parent and there are no back-references. The only mutation after
//! construction is appending to a [`StatementList`].

use crate::InternalFault;

// ============================================================================
// Node kinds
// ============================================================================

/// Closed set of node kinds. The numeric tags are the ones used by the
/// parser's wire-level encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Declaration,
    Expression,
    StatementList,
    CompoundStatement,
    SelectionStatement,
    WhileStatement,
    TranslationUnit,
}

impl NodeKind {
    pub fn tag(self) -> u8 {
        match self {
            NodeKind::Declaration => 2,
            NodeKind::Expression => 3,
            NodeKind::StatementList => 4,
            NodeKind::CompoundStatement => 5,
            NodeKind::SelectionStatement => 6,
            NodeKind::WhileStatement => 7,
            NodeKind::TranslationUnit => 8,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, InternalFault> {
        match tag {
            2 => Ok(NodeKind::Declaration),
            3 => Ok(NodeKind::Expression),
            4 => Ok(NodeKind::StatementList),
            5 => Ok(NodeKind::CompoundStatement),
            6 => Ok(NodeKind::SelectionStatement),
            7 => Ok(NodeKind::WhileStatement),
            8 => Ok(NodeKind::TranslationUnit),
            other => Err(InternalFault::UnknownNodeKind(other)),
        }
    }
}

/// Borrowed view over any node, used for generic dispatch (printing).
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Declaration(&'a Declaration),
    Expression(&'a Expression),
    StatementList(&'a StatementList),
    CompoundStatement(&'a CompoundStatement),
    SelectionStatement(&'a SelectionStatement),
    WhileStatement(&'a WhileStatement),
    TranslationUnit(&'a TranslationUnit),
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Declaration(_) => NodeKind::Declaration,
            Node::Expression(_) => NodeKind::Expression,
            Node::StatementList(_) => NodeKind::StatementList,
            Node::CompoundStatement(_) => NodeKind::CompoundStatement,
            Node::SelectionStatement(_) => NodeKind::SelectionStatement,
            Node::WhileStatement(_) => NodeKind::WhileStatement,
            Node::TranslationUnit(_) => NodeKind::TranslationUnit,
        }
    }
}

macro_rules! node_from {
    ($($ty:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a $ty> for Node<'a> {
                fn from(node: &'a $ty) -> Self {
                    Node::$ty(node)
                }
            }
        )*
    };
}

node_from!(
    Declaration,
    Expression,
    StatementList,
    CompoundStatement,
    SelectionStatement,
    WhileStatement,
    TranslationUnit,
);

impl<'a> From<&'a Statement> for Node<'a> {
    fn from(stmt: &'a Statement) -> Self {
        match stmt {
            Statement::Declaration(d) => Node::Declaration(d),
            Statement::Expression(e) => Node::Expression(e),
            Statement::Compound(c) => Node::CompoundStatement(c),
            Statement::Selection(s) => Node::SelectionStatement(s),
            Statement::While(w) => Node::WhileStatement(w),
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSpecifier {
    Int,
    Float,
}

impl TypeSpecifier {
    pub fn keyword(self) -> &'static str {
        match self {
            TypeSpecifier::Int => "int",
            TypeSpecifier::Float => "float",
        }
    }
}

/// `int x;` / `float y;`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub type_specifier: TypeSpecifier,
    pub identifier: String,
}

impl Declaration {
    pub fn new(type_specifier: TypeSpecifier, identifier: impl Into<String>) -> Self {
        Self {
            type_specifier,
            identifier: identifier.into(),
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Operators that take two operand subexpressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Gt,
    Lt,
    Eq,
    Ne,
    Le,
    Ge,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    pub fn is_comparison(self) -> bool {
        !self.is_arithmetic()
    }

    /// Source spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
        }
    }
}

/// Operator kind of an expression node, including the leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Binary(BinaryOp),
    Assign,
    IntConstant,
    FloatConstant,
    Identifier,
}

impl Operator {
    /// Decode a parser operator code (1..=14).
    pub fn from_code(code: i32) -> Result<Self, InternalFault> {
        let op = match code {
            1 => Operator::Binary(BinaryOp::Add),
            2 => Operator::Binary(BinaryOp::Sub),
            3 => Operator::Binary(BinaryOp::Mul),
            4 => Operator::Binary(BinaryOp::Div),
            5 => Operator::Binary(BinaryOp::Gt),
            6 => Operator::Binary(BinaryOp::Lt),
            7 => Operator::Binary(BinaryOp::Eq),
            8 => Operator::Binary(BinaryOp::Ne),
            9 => Operator::Binary(BinaryOp::Le),
            10 => Operator::Binary(BinaryOp::Ge),
            11 => Operator::Assign,
            12 => Operator::IntConstant,
            13 => Operator::FloatConstant,
            14 => Operator::Identifier,
            other => return Err(InternalFault::UnknownOperator(other)),
        };
        Ok(op)
    }

    pub fn code(self) -> i32 {
        match self {
            Operator::Binary(BinaryOp::Add) => 1,
            Operator::Binary(BinaryOp::Sub) => 2,
            Operator::Binary(BinaryOp::Mul) => 3,
            Operator::Binary(BinaryOp::Div) => 4,
            Operator::Binary(BinaryOp::Gt) => 5,
            Operator::Binary(BinaryOp::Lt) => 6,
            Operator::Binary(BinaryOp::Eq) => 7,
            Operator::Binary(BinaryOp::Ne) => 8,
            Operator::Binary(BinaryOp::Le) => 9,
            Operator::Binary(BinaryOp::Ge) => 10,
            Operator::Assign => 11,
            Operator::IntConstant => 12,
            Operator::FloatConstant => 13,
            Operator::Identifier => 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Arithmetic or comparison over two operands, evaluated left to right.
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// `target = value`; the target is a name, not a subexpression.
    Assign {
        target: String,
        value: Box<Expression>,
    },
    IntConstant(i32),
    FloatConstant(f32),
    Identifier(String),
}

impl Expression {
    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Build a binary node from a decoded operator. Leaf and assignment
    /// operators have their own constructors and are rejected here.
    pub fn from_operator(
        op: Operator,
        lhs: Expression,
        rhs: Expression,
    ) -> Result<Self, InternalFault> {
        match op {
            Operator::Binary(op) => Ok(Expression::binary(op, lhs, rhs)),
            other => Err(InternalFault::UnknownOperator(other.code())),
        }
    }

    pub fn assign(target: impl Into<String>, value: Expression) -> Self {
        Expression::Assign {
            target: target.into(),
            value: Box::new(value),
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(name.into())
    }

    pub fn operator(&self) -> Operator {
        match self {
            Expression::Binary { op, .. } => Operator::Binary(*op),
            Expression::Assign { .. } => Operator::Assign,
            Expression::IntConstant(_) => Operator::IntConstant,
            Expression::FloatConstant(_) => Operator::FloatConstant,
            Expression::Identifier(_) => Operator::Identifier,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declaration(Declaration),
    Expression(Expression),
    Compound(CompoundStatement),
    Selection(SelectionStatement),
    While(WhileStatement),
}

impl Statement {
    pub fn kind(&self) -> NodeKind {
        Node::from(self).kind()
    }
}

impl From<Declaration> for Statement {
    fn from(d: Declaration) -> Self {
        Statement::Declaration(d)
    }
}

impl From<Expression> for Statement {
    fn from(e: Expression) -> Self {
        Statement::Expression(e)
    }
}

impl From<CompoundStatement> for Statement {
    fn from(c: CompoundStatement) -> Self {
        Statement::Compound(c)
    }
}

impl From<SelectionStatement> for Statement {
    fn from(s: SelectionStatement) -> Self {
        Statement::Selection(s)
    }
}

impl From<WhileStatement> for Statement {
    fn from(w: WhileStatement) -> Self {
        Statement::While(w)
    }
}

/// Ordered, append-only sequence of statements. Indices handed out by
/// [`StatementList::push`] stay valid for the lifetime of the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementList {
    statements: Vec<Statement>,
}

impl StatementList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statement(statement: impl Into<Statement>) -> Self {
        let mut list = Self::new();
        list.push(statement);
        list
    }

    /// Append a statement and return its index.
    pub fn push(&mut self, statement: impl Into<Statement>) -> usize {
        self.statements.push(statement.into());
        self.statements.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }
}

impl From<Vec<Statement>> for StatementList {
    fn from(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

impl<'a> IntoIterator for &'a StatementList {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A `{ ... }` block. Introduces no scope of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundStatement {
    pub statements: StatementList,
}

impl CompoundStatement {
    pub fn new(statements: StatementList) -> Self {
        Self { statements }
    }
}

/// `if (condition) { ... } [else { ... }]`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionStatement {
    pub condition: Expression,
    pub then_body: CompoundStatement,
    pub else_body: Option<CompoundStatement>,
}

impl SelectionStatement {
    pub fn new(
        condition: Expression,
        then_body: CompoundStatement,
        else_body: Option<CompoundStatement>,
    ) -> Self {
        Self {
            condition,
            then_body,
            else_body,
        }
    }
}

/// `while (condition) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: CompoundStatement,
}

impl WhileStatement {
    pub fn new(condition: Expression, body: CompoundStatement) -> Self {
        Self { condition, body }
    }
}

/// Root of the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationUnit {
    pub statements: StatementList,
}

impl TranslationUnit {
    pub fn new(statements: StatementList) -> Self {
        Self { statements }
    }
}
