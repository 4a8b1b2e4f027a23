//! # Placeholder Resolution
//!
//! Statements reach the store as hand-written text with `$N` placeholders. To know which
//! positional parameter feeds which column, the store looks for the literal
//! `column = $N` fragment in the relevant clause.
//!
//! Resolution has two tiers:
//! 1. **Pattern**: `column = $N` found in the clause, the parameter is `params[N - 1]`.
//! 2. **Fallback**: no such fragment, a fixed position chosen by the caller of this module.
//!
//! Statement text is expected to be normalized first (see [`super::shape::normalize`]).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

static DELTA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bquantite\s*\+\s*(?:coalesce\(\s*)?\$(\d+)").expect("valid pattern")
});

/// The `SET` and `WHERE` parts of a normalized statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clauses<'a> {
    pub set: &'a str,
    pub filter: &'a str,
}

/// Splits a normalized statement into its `SET` and `WHERE` clauses.
/// Missing clauses are empty.
pub fn split_clauses(statement: &str) -> Clauses<'_> {
    let where_at = statement.find(" where ");
    let filter = where_at.map(|i| &statement[i + 7..]).unwrap_or("");
    let head = where_at.map(|i| &statement[..i]).unwrap_or(statement);
    let set = head.find(" set ").map(|i| &head[i + 5..]).unwrap_or("");
    Clauses { set, filter }
}

/// Columns the store resolves; their patterns are compiled once.
const KNOWN_COLUMNS: &[&str] = &[
    "id_utilisateur",
    "id_parcelle",
    "id_culture",
    "id_alerte",
    "id_intrant",
    "id_stock",
    "nom_parcelle",
    "surface",
    "date_semis",
    "statut",
    "quantite",
    "lu",
];

struct ColumnPatterns {
    /// `column = $N`
    assignment: Regex,
    /// `column =`
    mention: Regex,
}

impl ColumnPatterns {
    fn compile(column: &str) -> Self {
        // Column names are plain identifiers, escaping keeps that assumption honest.
        let column = regex::escape(column);
        Self {
            assignment: Regex::new(&format!(r"\b(?:\w+\.)?{}\s*=\s*\$(\d+)", column))
                .expect("escaped identifier is a valid pattern"),
            mention: Regex::new(&format!(r"\b(?:\w+\.)?{}\s*=", column))
                .expect("escaped identifier is a valid pattern"),
        }
    }
}

static PATTERNS: Lazy<HashMap<&'static str, ColumnPatterns>> = Lazy::new(|| {
    KNOWN_COLUMNS
        .iter()
        .map(|column| (*column, ColumnPatterns::compile(column)))
        .collect()
});

fn with_patterns<T>(column: &str, f: impl FnOnce(&ColumnPatterns) -> T) -> T {
    match PATTERNS.get(column) {
        Some(patterns) => f(patterns),
        None => f(&ColumnPatterns::compile(column)),
    }
}

/// Zero-based parameter index bound to `column` in `clause`, if written as `column = $N`.
pub fn placeholder_index(clause: &str, column: &str) -> Option<usize> {
    with_patterns(column, |p| {
        p.assignment
            .captures(clause)
            .and_then(|c| c[1].parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
    })
}

/// Whether `clause` compares or assigns `column` at all, placeholder or not.
pub fn mentions(clause: &str, column: &str) -> bool {
    with_patterns(column, |p| p.mention.is_match(clause))
}

fn mention_offset(clause: &str, column: &str) -> Option<usize> {
    with_patterns(column, |p| p.mention.find(clause).map(|m| m.start()))
}

/// Where a parameter index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Pattern(usize),
    Fallback(usize),
}

impl Position {
    pub fn index(&self) -> usize {
        match self {
            Position::Pattern(i) | Position::Fallback(i) => *i,
        }
    }
}

/// Two-tier resolution: `column = $N` in `clause`, else `fallback`.
pub fn resolve(clause: &str, column: &str, fallback: usize) -> Position {
    match placeholder_index(clause, column) {
        Some(i) => Position::Pattern(i),
        None => Position::Fallback(fallback),
    }
}

/// Zero-based index of the delta in `quantite = greatest(0, quantite + $N)`.
pub fn delta_index(set_clause: &str) -> Option<usize> {
    DELTA
        .captures(set_clause)
        .and_then(|c| c[1].parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
}

/// An assignment found in a `SET` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: &'static str,
    pub position: Position,
}

/// Finds which of `columns` are assigned in `set_clause` and the parameter feeding each.
///
/// Columns absent from the clause are skipped. A column assigned without a `$N`
/// placeholder falls back to its rank among the assigned columns, in textual order.
pub fn assignments(set_clause: &str, columns: &[&'static str]) -> Vec<Assignment> {
    let mut present: Vec<(usize, &'static str)> = columns
        .iter()
        .filter_map(|col| mention_offset(set_clause, col).map(|offset| (offset, *col)))
        .collect();
    present.sort_by_key(|(offset, _)| *offset);

    present
        .into_iter()
        .enumerate()
        .map(|(rank, (_, column))| Assignment {
            column,
            position: resolve(set_clause, column, rank),
        })
        .collect()
}

/// Parameter at `index`, treating SQL `NULL` like a missing parameter.
pub fn param(params: &[Value], index: usize) -> Option<&Value> {
    params.get(index).filter(|v| !v.is_null())
}

/// Reads an integer the way a loosely typed caller would send it: `3`, `3.0` or `"3"`.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim() {
            "true" | "t" | "1" => Some(true),
            "false" | "f" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
