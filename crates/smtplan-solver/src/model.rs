//! Satisfying assignments reported by an SMT solver.
//!
//! Solvers print models as a list of zero-arity `define-fun` entries, e.g.
//!
//! ```text
//! (
//!   (define-fun sta_load_0 () Bool true)
//!   (define-fun duration_load_0 () Real (/ 3.0 2.0))
//! )
//! ```
//!
//! Older z3 releases wrap the list in `(model ...)`. Both shapes are accepted.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelParseError {
    #[error("unbalanced parentheses in solver model at byte {0}")]
    Unbalanced(usize),
    #[error("solver model nested deeper than {MAX_NESTING} at byte {0}")]
    TooDeep(usize),
}

/// Models are a few levels deep; anything deeper is rejected before the
/// recursive walks below can exhaust the stack.
const MAX_NESTING: usize = 256;

/// A model (variable assignments) extracted from a SAT result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Model {
    pub values: BTreeMap<String, ModelValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelValue {
    Bool(bool),
    Int(i64),
    Real(f64),
}

impl Model {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ModelValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ModelValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value of `name`, widening integers.
    pub fn get_real(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ModelValue::Real(r)) => Some(*r),
            Some(ModelValue::Int(n)) => Some(*n as f64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

/// Parse the model section of a solver's stdout.
///
/// Anything outside parenthesised expressions (the leading `sat` verdict,
/// blank lines) is ignored. Entries with unsupported sorts or non-literal
/// values are skipped.
pub fn parse_model(output: &str) -> Result<Model, ModelParseError> {
    let mut model = Model::default();
    for expr in parse_sexprs(output)? {
        collect_definitions(&expr, &mut model);
    }
    Ok(model)
}

fn collect_definitions(expr: &SExpr, model: &mut Model) {
    let SExpr::List(items) = expr else {
        return;
    };
    match items.as_slice() {
        [SExpr::Atom(head), SExpr::Atom(name), SExpr::List(params), SExpr::Atom(sort), value]
            if head == "define-fun" =>
        {
            if !params.is_empty() {
                return;
            }
            if let Some(v) = literal_value(sort, value) {
                model.values.insert(unquote_symbol(name), v);
            }
        }
        _ => {
            for item in items {
                collect_definitions(item, model);
            }
        }
    }
}

fn unquote_symbol(name: &str) -> String {
    name.strip_prefix('|')
        .and_then(|s| s.strip_suffix('|'))
        .unwrap_or(name)
        .to_string()
}

fn literal_value(sort: &str, value: &SExpr) -> Option<ModelValue> {
    match sort {
        "Bool" => match value {
            SExpr::Atom(a) if a == "true" => Some(ModelValue::Bool(true)),
            SExpr::Atom(a) if a == "false" => Some(ModelValue::Bool(false)),
            _ => None,
        },
        "Int" => int_literal(value).map(ModelValue::Int),
        "Real" => real_literal(value).map(ModelValue::Real),
        _ => None,
    }
}

fn int_literal(value: &SExpr) -> Option<i64> {
    match value {
        SExpr::Atom(a) => a.parse::<i64>().ok(),
        SExpr::List(items) => match items.as_slice() {
            [SExpr::Atom(op), inner] if op == "-" => {
                int_literal(inner).and_then(i64::checked_neg)
            }
            _ => None,
        },
    }
}

fn real_literal(value: &SExpr) -> Option<f64> {
    match value {
        SExpr::Atom(a) => a.trim_end_matches('?').parse::<f64>().ok(),
        SExpr::List(items) => match items.as_slice() {
            [SExpr::Atom(op), inner] if op == "-" => real_literal(inner).map(|r| -r),
            [SExpr::Atom(op), num, den] if op == "/" => {
                let den = real_literal(den)?;
                if den == 0.0 {
                    return None;
                }
                Some(real_literal(num)? / den)
            }
            _ => None,
        },
    }
}

fn parse_sexprs(input: &str) -> Result<Vec<SExpr>, ModelParseError> {
    let mut stack: Vec<(usize, Vec<SExpr>)> = Vec::new();
    let mut top = Vec::new();
    let mut atom = String::new();
    let mut in_quoted_symbol = false;
    let mut in_string = false;
    let mut in_comment = false;

    for (idx, ch) in input.char_indices() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }
        if in_quoted_symbol || in_string {
            atom.push(ch);
            if (in_quoted_symbol && ch == '|') || (in_string && ch == '"') {
                in_quoted_symbol = false;
                in_string = false;
            }
            continue;
        }
        match ch {
            '(' => {
                flush_atom(&mut atom, &mut stack, &mut top);
                if stack.len() >= MAX_NESTING {
                    return Err(ModelParseError::TooDeep(idx));
                }
                stack.push((idx, Vec::new()));
            }
            ')' => {
                flush_atom(&mut atom, &mut stack, &mut top);
                let (_, items) = stack.pop().ok_or(ModelParseError::Unbalanced(idx))?;
                match stack.last_mut() {
                    Some((_, parent)) => parent.push(SExpr::List(items)),
                    None => top.push(SExpr::List(items)),
                }
            }
            ';' => {
                flush_atom(&mut atom, &mut stack, &mut top);
                in_comment = true;
            }
            '|' => {
                atom.push(ch);
                in_quoted_symbol = true;
            }
            '"' => {
                atom.push(ch);
                in_string = true;
            }
            c if c.is_whitespace() => flush_atom(&mut atom, &mut stack, &mut top),
            other => atom.push(other),
        }
    }
    flush_atom(&mut atom, &mut stack, &mut top);

    match stack.first() {
        Some((open, _)) => Err(ModelParseError::Unbalanced(*open)),
        None => Ok(top),
    }
}

fn flush_atom(atom: &mut String, stack: &mut [(usize, Vec<SExpr>)], top: &mut Vec<SExpr>) {
    if atom.is_empty() {
        return;
    }
    let done = SExpr::Atom(std::mem::take(atom));
    match stack.last_mut() {
        Some((_, items)) => items.push(done),
        None => top.push(done),
    }
}
