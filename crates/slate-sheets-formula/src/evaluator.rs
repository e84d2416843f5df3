//! Formula evaluation
//!
//! Executes an [`Expr`] against a [`Resolver`] that supplies the numeric
//! value of referenced cells. Arithmetic follows IEEE-754; the finiteness
//! check on the final result is applied by [`crate::Formula::evaluate`].

use crate::ast::{BinaryOp, Expr, UnaryOp};
use slate_sheets_core::{CellError, EvalResult, Position};

/// Supplies the numeric value of a referenced cell during evaluation.
///
/// Implementations return `Err` with the error category to propagate when
/// the referenced cell cannot produce a number. The resolver is only asked
/// about positions inside the grid bounds; out-of-range references fail
/// with [`CellError::Ref`] before the resolver is consulted.
pub trait Resolver {
    /// Resolve the current numeric value of the cell at `pos`
    fn resolve(&self, pos: Position) -> EvalResult;
}

impl<F> Resolver for F
where
    F: Fn(Position) -> EvalResult,
{
    fn resolve(&self, pos: Position) -> EvalResult {
        self(pos)
    }
}

/// Evaluate an expression against a resolver
pub fn evaluate(expr: &Expr, resolver: &impl Resolver) -> EvalResult {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ref(pos) => {
            if !pos.is_valid() {
                return Err(CellError::Ref);
            }
            resolver.resolve(*pos)
        }
        Expr::Unary { op, operand } => {
            let v = evaluate(operand, resolver)?;
            Ok(match op {
                UnaryOp::Plus => v,
                UnaryOp::Negate => -v,
            })
        }
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, resolver)?;
            let r = evaluate(right, resolver)?;
            Ok(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Subtract => l - r,
                BinaryOp::Multiply => l * r,
                BinaryOp::Divide => l / r,
            })
        }
    }
}
