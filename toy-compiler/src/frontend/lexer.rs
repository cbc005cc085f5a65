use logos::Logos;
use std::fmt;
use thiserror::Error;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[token("int")]
    Int,
    #[token("float")]
    Float,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i32>().ok())]
    IntLiteral(i32),

    // Overflow to infinity is an error, like out-of-range integers.
    #[regex(r"[0-9]+\.[0-9]+", |lex| {
        lex.slice().parse::<f32>().ok().filter(|x| x.is_finite())
    })]
    FloatLiteral(f32),

    // operators
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int => write!(f, "int"),
            Token::Float => write!(f, "float"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Ident(s) => write!(f, "'{}'", s),
            Token::IntLiteral(n) => write!(f, "{}", n),
            Token::FloatLiteral(x) => write!(f, "{}", x),
            Token::Eq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::Le => write!(f, "<="),
            Token::Ge => write!(f, ">="),
            Token::Gt => write!(f, ">"),
            Token::Lt => write!(f, "<"),
            Token::Assign => write!(f, "="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
        }
    }
}

/// Render a grammar terminal name from an "expected" list the way a user
/// would write it.
pub fn describe_terminal(name: &str) -> String {
    match name.trim_matches('"') {
        "identifier" => "identifier".into(),
        "int_literal" => "integer literal".into(),
        "float_literal" => "float literal".into(),
        punct => format!("'{}'", punct),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("stray '{unexpected_char}' at {line}:{column} (byte {location})\n  Context: {context}")]
pub struct LexicalError {
    pub location: usize,
    pub line: usize,
    pub column: usize,
    pub unexpected_char: char,
    pub context: String,
}

impl LexicalError {
    fn at(source: &str, location: usize) -> Self {
        let (line, column) = line_col(source, location);
        Self {
            location,
            line,
            column,
            unexpected_char: source[location..].chars().next().unwrap_or('\0'),
            context: line_context(source, location),
        }
    }
}

/// Largest char boundary not past `position`.
fn clamp(source: &str, position: usize) -> usize {
    let mut p = position.min(source.len());
    while !source.is_char_boundary(p) {
        p -= 1;
    }
    p
}

/// 1-based line and column (in chars) of a byte offset.
pub fn line_col(source: &str, position: usize) -> (usize, usize) {
    let before = &source[..clamp(source, position)];
    let line_start = before.rfind('\n').map_or(0, |nl| nl + 1);
    let line = before.matches('\n').count() + 1;
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// The trimmed source line containing `position`.
pub fn line_context(source: &str, position: usize) -> String {
    let position = clamp(source, position);
    let start = source[..position].rfind('\n').map_or(0, |nl| nl + 1);
    let end = source[position..]
        .find('\n')
        .map_or(source.len(), |nl| position + nl);
    source[start..end].trim().to_string()
}

/// `(start, token, end)` triples as the generated parser consumes them.
pub type Spanned = Result<(usize, Token, usize), LexicalError>;

pub fn tokens(source: &str) -> impl Iterator<Item = Spanned> + '_ {
    Token::lexer(source)
        .spanned()
        .map(move |(token, span)| match token {
            Ok(token) => Ok((span.start, token, span.end)),
            Err(()) => Err(LexicalError::at(source, span.start)),
        })
}
