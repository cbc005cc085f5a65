//! Source-like rendering of AST nodes, for diagnostics and round-tripping.
//!
//! Indentation depth is passed down the recursion rather than kept in shared
//! state, so every nesting level restores its caller's depth on return.

use crate::ast::{
    CompoundStatement, Declaration, Expression, Node, SelectionStatement, Statement,
    StatementList, TranslationUnit, WhileStatement,
};
use std::fmt::{self, Write};

pub struct Printer<W: Write> {
    out: W,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render any node at the given nesting depth. A bare expression is
    /// rendered as a statement, with its trailing `;`.
    pub fn print_node(&mut self, node: Node<'_>, depth: usize) -> fmt::Result {
        match node {
            Node::Declaration(d) => self.declaration(d),
            Node::Expression(e) => {
                self.expression(e)?;
                self.out.write_char(';')
            }
            Node::StatementList(list) => self.statement_list(list, depth),
            Node::CompoundStatement(c) => self.compound(c, depth),
            Node::SelectionStatement(s) => self.selection(s, depth),
            Node::WhileStatement(w) => self.while_statement(w, depth),
            Node::TranslationUnit(unit) => self.statement_list(&unit.statements, 0),
        }
    }

    fn tabs(&mut self, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            self.out.write_char('\t')?;
        }
        Ok(())
    }

    fn declaration(&mut self, d: &Declaration) -> fmt::Result {
        write!(self.out, "{} {};", d.type_specifier.keyword(), d.identifier)
    }

    pub fn expression(&mut self, e: &Expression) -> fmt::Result {
        match e {
            Expression::Binary { op, lhs, rhs } => {
                self.expression(lhs)?;
                write!(self.out, " {} ", op.symbol())?;
                self.expression(rhs)
            }
            Expression::Assign { target, value } => {
                write!(self.out, "{} = ", target)?;
                self.expression(value)
            }
            Expression::IntConstant(n) => write!(self.out, "{}", n),
            Expression::FloatConstant(x) => write!(self.out, "{:.6}", x),
            Expression::Identifier(name) => write!(self.out, "{}", name),
        }
    }

    /// One statement per line. Block-shaped statements lay out their own
    /// lines; simple statements get the list's indentation.
    fn statement_list(&mut self, list: &StatementList, depth: usize) -> fmt::Result {
        for stmt in list {
            if matches!(stmt, Statement::Declaration(_) | Statement::Expression(_)) {
                self.tabs(depth)?;
            }
            self.print_node(Node::from(stmt), depth)?;
            self.out.write_char('\n')?;
        }
        Ok(())
    }

    fn compound(&mut self, c: &CompoundStatement, depth: usize) -> fmt::Result {
        self.tabs(depth)?;
        self.out.write_str("{\n")?;
        self.statement_list(&c.statements, depth + 1)?;
        self.tabs(depth)?;
        self.out.write_str("}\n")
    }

    fn selection(&mut self, s: &SelectionStatement, depth: usize) -> fmt::Result {
        self.out.write_char('\n')?;
        self.tabs(depth)?;
        self.out.write_str("if (")?;
        self.expression(&s.condition)?;
        self.out.write_str(")\n")?;

        self.compound(&s.then_body, depth)?;

        if let Some(else_body) = &s.else_body {
            self.tabs(depth)?;
            self.out.write_str("else\n")?;
            self.compound(else_body, depth)?;
            self.out.write_char('\n')?;
        }
        Ok(())
    }

    fn while_statement(&mut self, w: &WhileStatement, depth: usize) -> fmt::Result {
        self.out.write_char('\n')?;
        self.tabs(depth)?;
        self.out.write_str("while (")?;
        self.expression(&w.condition)?;
        self.out.write_str(")\n")?;

        self.compound(&w.body, depth)?;
        self.out.write_char('\n')
    }
}

/// Render a node into a fresh string.
pub fn print_node<'a>(node: impl Into<Node<'a>>) -> String {
    let mut printer = Printer::new(String::new());
    // Writing into a String cannot fail.
    let _ = printer.print_node(node.into(), 0);
    printer.into_inner()
}

macro_rules! display_via_printer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    Printer::new(f).print_node(Node::from(self), 0)
                }
            }
        )*
    };
}

display_via_printer!(
    Declaration,
    StatementList,
    CompoundStatement,
    SelectionStatement,
    WhileStatement,
    TranslationUnit,
);

/// Expressions display without the statement terminator.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new(f).expression(self)
    }
}
