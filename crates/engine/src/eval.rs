// Formula evaluator - reduces a token snapshot to a number
//
// Pass 1 folds percentages and coerces operands, pass 2 applies
// multiplicative then additive operators over the flat result.

use log::debug;
use thiserror::Error;

use crate::token::{DisplayMode, Operator, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Invalid formula")]
    InvalidFormula,
}

/// Output of percentage folding: numbers and operators only.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Item {
    Number(f64),
    /// `None` for operator tokens whose symbol is not a known operator
    Operator(Option<Operator>),
}

/// Evaluate a token snapshot to a finite number.
pub fn evaluate(tokens: &[Token]) -> Result<f64, EvalError> {
    let items = fold_percentages(tokens)?;
    let items = reduce_multiplicative(items)?;
    let result = reduce_additive(&items)?;
    if !result.is_finite() {
        return Err(EvalError::InvalidFormula);
    }
    Ok(result)
}

/// Evaluate and format for display. Never fails: errors come back as
/// `"Error: <message>"`.
pub fn evaluate_display(tokens: &[Token]) -> String {
    match evaluate(tokens) {
        Ok(n) => format_result(n),
        Err(e) => {
            debug!("evaluation of {} tokens failed: {}", tokens.len(), e);
            format!("Error: {}", e)
        }
    }
}

/// Integers print bare, everything else with exactly two decimals.
pub fn format_result(n: f64) -> String {
    if n.fract() == 0.0 {
        if n == 0.0 {
            // Avoid printing "-0"
            "0".to_string()
        } else {
            format!("{:.0}", n)
        }
    } else {
        format!("{:.2}", n)
    }
}

/// Numeric value of a number or variable token.
/// Variables fall back to 0; a number that doesn't parse is malformed.
fn operand_value(token: &Token) -> Result<f64, EvalError> {
    let parsed = parse_numeral(&token.raw_value);
    match token.kind {
        TokenKind::Variable => Ok(parsed.unwrap_or(0.0)),
        _ => parsed.ok_or(EvalError::InvalidFormula),
    }
}

fn parse_numeral(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn fold_percentages(tokens: &[Token]) -> Result<Vec<Item>, EvalError> {
    let mut items = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match token.kind {
            TokenKind::Number | TokenKind::Variable => {
                let value = operand_value(token)?;
                let next = tokens.get(i + 1).filter(|t| t.kind.is_operand());

                match (token.mode(), next) {
                    (DisplayMode::Percentage, Some(next)) => {
                        let base = operand_value(next)?;
                        items.push(Item::Number(value / 100.0 * base));
                        // The base operand is consumed by the percentage
                        i += 2;
                        continue;
                    }
                    _ => items.push(Item::Number(value)),
                }
            }
            TokenKind::Operator => items.push(Item::Operator(token.operator())),
            // Functions carry no arithmetic meaning
            TokenKind::Function => {}
        }
        i += 1;
    }

    Ok(items)
}

fn reduce_multiplicative(mut items: Vec<Item>) -> Result<Vec<Item>, EvalError> {
    let mut i = 0;

    while i < items.len() {
        let op = match items[i] {
            Item::Operator(Some(op @ (Operator::Mul | Operator::Div))) => op,
            _ => {
                i += 1;
                continue;
            }
        };

        if i == 0 || i + 1 >= items.len() {
            return Err(EvalError::InvalidFormula);
        }
        let (left, right) = match (items[i - 1], items[i + 1]) {
            (Item::Number(l), Item::Number(r)) => (l, r),
            _ => return Err(EvalError::InvalidFormula),
        };

        let result = if op == Operator::Mul {
            left * right
        } else {
            if right == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            left / right
        };

        // Collapse (left, op, right) into the left slot and rescan from there
        items[i - 1] = Item::Number(result);
        items.drain(i..=i + 1);
    }

    Ok(items)
}

fn reduce_additive(items: &[Item]) -> Result<f64, EvalError> {
    let mut iter = items.iter();
    let mut acc = match iter.next() {
        Some(Item::Number(n)) => *n,
        _ => return Err(EvalError::InvalidFormula),
    };

    loop {
        let op = match iter.next() {
            None => return Ok(acc),
            Some(Item::Operator(Some(op @ (Operator::Add | Operator::Sub)))) => *op,
            Some(_) => return Err(EvalError::InvalidFormula),
        };
        let value = match iter.next() {
            Some(Item::Number(n)) => *n,
            _ => return Err(EvalError::InvalidFormula),
        };
        if op == Operator::Add {
            acc += value;
        } else {
            acc -= value;
        }
    }
}
