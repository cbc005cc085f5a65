pub mod ast;
pub mod frontend;
pub mod ir;
pub mod lower;
pub mod printer;
pub mod symbol_table;

use thiserror::Error;

pub use lower::{compile, CompilationUnit};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexical error: {0}")]
    Lexical(#[from] frontend::lexer::LexicalError),

    #[error("Parse error ({line}:{col}): {message}\n  Context: {context}")]
    Parse {
        line: usize,
        col: usize,
        context: String,
        message: String,
    },

    #[error("SemanticError:{kind} '{symbol}' - {message}")]
    Semantic {
        kind: SemanticErrorKind,
        symbol: String,
        message: String,
    },

    #[error("Internal compiler fault: {0}")]
    Internal(#[from] InternalFault),

    #[error("Backend fault: {0}")]
    Backend(#[from] ir::BuilderError),
}

impl CompileError {
    pub fn semantic(
        kind: SemanticErrorKind,
        symbol: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CompileError::Semantic {
            kind,
            symbol: symbol.into(),
            message: message.into(),
        }
    }

    /// Kind of a semantic error, if this is one.
    pub fn semantic_kind(&self) -> Option<SemanticErrorKind> {
        match self {
            CompileError::Semantic { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// User errors detected from the AST and the symbol table alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    UnboundIdentifier,
    DuplicateDeclaration,
    TypeMismatch,
}

impl std::fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticErrorKind::UnboundIdentifier => write!(f, "UnboundIdentifier"),
            SemanticErrorKind::DuplicateDeclaration => write!(f, "DuplicateDeclaration"),
            SemanticErrorKind::TypeMismatch => write!(f, "TypeMismatch"),
        }
    }
}

/// Consistency faults. These point at a defect in whoever built the AST or
/// drove the builder, never at the user's program.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalFault {
    #[error("unknown node kind tag {0}")]
    UnknownNodeKind(u8),

    #[error("unknown expression operator code {0}")]
    UnknownOperator(i32),

    #[error("left block {0} without a terminator")]
    UnterminatedBlock(ir::BlockId),

    #[error("builder has no insertion point")]
    NoInsertionPoint,
}

// ============================================================================
// Options
// ============================================================================

/// What a second declaration of an already bound name does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedeclarationPolicy {
    /// Fail with [`SemanticErrorKind::DuplicateDeclaration`].
    #[default]
    Reject,
    /// Allocate fresh storage and rebind the name.
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub module_name: String,
    pub redeclaration: RedeclarationPolicy,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            module_name: "Toy".to_string(),
            redeclaration: RedeclarationPolicy::Reject,
        }
    }
}

/// Parse source text into a translation unit.
pub fn parse(source: &str) -> Result<ast::TranslationUnit, CompileError> {
    frontend::parse_translation_unit(source)
}

/// Parse and lower source text into a verified IR module.
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<ir::Module, CompileError> {
    let unit = parse(source)?;
    compile(&unit, options)
}
