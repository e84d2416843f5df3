//! Formula abstract syntax tree
//!
//! The formula language is arithmetic over cells: number literals, A1 cell
//! references, unary sign, the four binary operators, and parentheses.

use slate_sheets_core::Position;
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Cell reference
    ///
    /// The position may lie outside the grid bounds; such references are
    /// preserved verbatim and fail with `#REF!` at evaluation time.
    Ref(Position),
    /// Unary operation
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        operand: Box<Expr>,
    },
    /// Binary operation
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x` (no-op on the value, preserved in the expression text)
    Plus,
    /// `-x`
    Negate,
}

impl UnaryOp {
    /// The operator's source character
    pub fn symbol(&self) -> char {
        match self {
            UnaryOp::Plus => '+',
            UnaryOp::Negate => '-',
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b`
    Divide,
}

impl BinaryOp {
    /// The operator's source character
    pub fn symbol(&self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => 1,
            BinaryOp::Multiply | BinaryOp::Divide => 2,
        }
    }

    /// True for operators whose right operand must keep explicit grouping
    /// at equal precedence (`a-(b+c)`, `a/(b*c)`)
    fn right_sensitive(&self) -> bool {
        matches!(self, BinaryOp::Subtract | BinaryOp::Divide)
    }
}

impl Expr {
    /// Precedence for canonical printing; atoms bind tightest
    fn precedence(&self) -> u8 {
        match self {
            Expr::Number(_) | Expr::Ref(_) => 4,
            Expr::Unary { .. } => 3,
            Expr::Binary { op, .. } => op.precedence(),
        }
    }

    /// Collect every cell reference in source order (duplicates included)
    pub fn collect_refs(&self, out: &mut Vec<Position>) {
        match self {
            Expr::Number(_) => {}
            Expr::Ref(pos) => out.push(*pos),
            Expr::Unary { operand, .. } => operand.collect_refs(out),
            Expr::Binary { left, right, .. } => {
                left.collect_refs(out);
                right.collect_refs(out);
            }
        }
    }

    fn fmt_child(child: &Expr, parens: bool, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if parens {
            write!(f, "({child})")
        } else {
            write!(f, "{child}")
        }
    }
}

/// Canonical rendering: no whitespace, minimal parentheses.
///
/// A child is parenthesized only when omitting the parentheses would change
/// how the text re-parses: lower-precedence children always, and
/// equal-precedence children on the right of `-` or `/`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Ref(pos) => write!(f, "{pos}"),
            Expr::Unary { op, operand } => {
                write!(f, "{}", op.symbol())?;
                Expr::fmt_child(operand, operand.precedence() < 3, f)
            }
            Expr::Binary { op, left, right } => {
                Expr::fmt_child(left, left.precedence() < op.precedence(), f)?;
                write!(f, "{}", op.symbol())?;
                let right_parens = right.precedence() < op.precedence()
                    || (right.precedence() == op.precedence() && op.right_sensitive());
                Expr::fmt_child(right, right_parens, f)
            }
        }
    }
}
