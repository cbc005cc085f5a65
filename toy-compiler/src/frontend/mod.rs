//! Source front end: logos lexer feeding a LALRPOP grammar.

pub mod lexer;

lalrpop_util::lalrpop_mod!(
    #[allow(clippy::all)]
    pub grammar,
    "/frontend/grammar.rs"
);

use crate::ast::TranslationUnit;
use crate::CompileError;
use lalrpop_util::ParseError;
use lexer::{LexicalError, Token};

pub fn parse_translation_unit(source: &str) -> Result<TranslationUnit, CompileError> {
    grammar::TranslationUnitParser::new()
        .parse(lexer::tokens(source))
        .map_err(|e| syntax_error(source, e))
}

/// Locate a parser failure in the source. Lexer failures keep their own
/// variant since they already carry a position.
fn syntax_error(source: &str, err: ParseError<usize, Token, LexicalError>) -> CompileError {
    let expected_list = |expected: Vec<String>| {
        expected
            .iter()
            .map(|name| lexer::describe_terminal(name))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let (position, message) = match err {
        ParseError::User { error } => return CompileError::Lexical(error),
        ParseError::InvalidToken { location } => (location, "Invalid token".to_string()),
        ParseError::UnrecognizedEof { location, expected } => (
            location,
            format!("Unexpected end of input, expected {}", expected_list(expected)),
        ),
        ParseError::UnrecognizedToken {
            token: (start, token, _),
            expected,
        } => (
            start,
            format!("Unexpected {}, expected {}", token, expected_list(expected)),
        ),
        ParseError::ExtraToken {
            token: (start, token, _),
        } => (start, format!("Trailing {}", token)),
    };

    let (line, col) = lexer::line_col(source, position);
    CompileError::Parse {
        line,
        col,
        context: lexer::line_context(source, position),
        message,
    }
}
