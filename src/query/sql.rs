//! Parameterized SQL rendering of a [`Query`].

use super::{Boolean, Clause, Operator, Predicate, Query, DELETED_AT};
use crate::value::Value;

impl Query {
    /// Render `select ... from ... where ... order by ...` with `?` placeholders
    /// and the bindings in placeholder order. Eager loads run as separate
    /// queries and are not part of the statement.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut bindings = Vec::new();
        let mut sql = String::from("select ");
        if self.distinct {
            sql.push_str("distinct ");
        }
        sql.push_str("* from ");
        sql.push_str(&self.table);

        let predicates = render_clauses(&self.clauses, &mut bindings);
        let scope = self
            .excludes_trashed()
            .then(|| format!("{}.{} is null", self.table, DELETED_AT));

        match (predicates, scope) {
            (Some(p), Some(s)) => sql.push_str(&format!(" where ({}) and {}", p, s)),
            (Some(p), None) => sql.push_str(&format!(" where {}", p)),
            (None, Some(s)) => sql.push_str(&format!(" where {}", s)),
            (None, None) => {}
        }

        if !self.orders.is_empty() {
            let keys: Vec<String> = self
                .orders
                .iter()
                .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
                .collect();
            sql.push_str(" order by ");
            sql.push_str(&keys.join(", "));
        }

        (sql, bindings)
    }
}

/// `None` when nothing renders (no clauses, or only empty groups).
fn render_clauses(clauses: &[Clause], bindings: &mut Vec<Value>) -> Option<String> {
    let mut out = String::new();

    for clause in clauses {
        let Some(rendered) = render_predicate(&clause.predicate, bindings) else {
            continue;
        };
        if !out.is_empty() {
            out.push_str(match clause.boolean {
                Boolean::And => " and ",
                Boolean::Or => " or ",
            });
        }
        out.push_str(&rendered);
    }

    (!out.is_empty()).then_some(out)
}

fn render_predicate(predicate: &Predicate, bindings: &mut Vec<Value>) -> Option<String> {
    match predicate {
        Predicate::Group(inner) => render_clauses(inner, bindings).map(|s| format!("({})", s)),
        Predicate::Compare {
            column,
            operator,
            value,
        } => Some(match (operator, value) {
            (Operator::Eq, Value::Null) => format!("{} is null", column),
            (Operator::Ne, Value::Null) => format!("{} is not null", column),
            _ => {
                bindings.push(value.clone());
                format!("{} {} ?", column, operator.as_sql())
            }
        }),
    }
}
