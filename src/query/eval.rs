//! In-process evaluation of clauses against JSON rows.

use std::cmp::Ordering;

use serde_json::{Map, Value as Json};

use super::{Boolean, Clause, Operator, Predicate};
use crate::value::Value;

/// Evaluate clauses with SQL precedence: AND binds tighter than OR, so
/// `a and b or c` reads as `(a and b) or c`. No clauses match everything.
pub(crate) fn matches(clauses: &[Clause], row: &Map<String, Json>) -> bool {
    let mut any = false;
    let mut all: Option<bool> = None;

    for clause in clauses {
        let hit = predicate_matches(&clause.predicate, row);
        all = match (all, clause.boolean) {
            (None, _) => Some(hit),
            (Some(current), Boolean::And) => Some(current && hit),
            (Some(current), Boolean::Or) => {
                any |= current;
                Some(hit)
            }
        };
    }

    match all {
        None => true,
        Some(last) => any || last,
    }
}

fn predicate_matches(predicate: &Predicate, row: &Map<String, Json>) -> bool {
    match predicate {
        Predicate::Group(inner) => matches(inner, row),
        Predicate::Compare {
            column,
            operator,
            value,
        } => {
            let actual = attribute(row, column);
            compare(&actual, *operator, value)
        }
    }
}

pub(crate) fn attribute(row: &Map<String, Json>, column: &str) -> Value {
    // qualified names ("posts.title") resolve against the row itself
    let name = column.rsplit('.').next().unwrap_or(column);
    row.get(name).map(Value::from_json).unwrap_or(Value::Null)
}

fn compare(actual: &Value, operator: Operator, expected: &Value) -> bool {
    match (operator, expected) {
        // rendered as `is null` / `is not null`
        (Operator::Eq, Value::Null) => return actual.is_null(),
        (Operator::Ne, Value::Null) => return !actual.is_null(),
        _ => {}
    }

    match operator {
        Operator::Like => match (actual.as_text(), expected.as_text()) {
            (Some(text), Some(pattern)) => like_matches(&text, &pattern),
            _ => false,
        },
        Operator::Eq => actual.compare(expected) == Some(Ordering::Equal),
        Operator::Ne => matches!(actual.compare(expected), Some(o) if o != Ordering::Equal),
        Operator::Lt => actual.compare(expected) == Some(Ordering::Less),
        Operator::Lte => matches!(actual.compare(expected), Some(Ordering::Less | Ordering::Equal)),
        Operator::Gt => actual.compare(expected) == Some(Ordering::Greater),
        Operator::Gte => {
            matches!(actual.compare(expected), Some(Ordering::Greater | Ordering::Equal))
        }
    }
}

/// SQL LIKE: `%` matches any run, `_` any single character, ASCII
/// case-insensitive.
fn like_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();
    let pattern: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}
