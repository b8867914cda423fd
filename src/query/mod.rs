//! Query - an immutable description of a read against one table.
//!
//! Every builder method consumes the query and returns the extended value, so
//! a query can be replayed, compared and inspected without touching a store.
//! Terminal verbs (`get`, `first`, `paginate`, ...) live on [`ModelStore`].
//!
//! ## Example
//!
//! ```ignore
//! use repository_criteria::{Direction, Operator, Query};
//!
//! let query = Query::new("posts")
//!     .and_where("status", Operator::Eq, "published")
//!     .where_group(|q| {
//!         q.or_where("title", Operator::Like, "%rust%")
//!             .or_where("body", Operator::Like, "%rust%")
//!     })
//!     .order_by("created_at", Direction::Desc)
//!     .with("comments.author");
//!
//! let (sql, bindings) = query.to_sql();
//! ```
//!
//! [`ModelStore`]: crate::ModelStore

mod eval;
mod sql;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::value::Value;

pub(crate) use eval::{attribute, matches};

/// How a clause joins the clauses before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

/// Comparison operator of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "like",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        operator: Operator,
        value: Value,
    },
    /// A parenthesized set of clauses. An empty group matches every row.
    Group(Vec<Clause>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub boolean: Boolean,
    pub predicate: Predicate,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDirectionError(pub String);

impl fmt::Display for ParseDirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid sort direction: {}", self.0)
    }
}

impl std::error::Error for ParseDirectionError {}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Column name checked for NULL when scoping out soft-deleted rows.
pub const DELETED_AT: &str = "deleted_at";

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    soft_deletes: bool,
    clauses: Vec<Clause>,
    orders: Vec<Order>,
    eager: Vec<String>,
    distinct: bool,
    with_trashed: bool,
}

impl Query {
    /// An unscoped query against `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            soft_deletes: false,
            clauses: Vec::new(),
            orders: Vec::new(),
            eager: Vec::new(),
            distinct: false,
            with_trashed: false,
        }
    }

    /// A fresh query scoped to the model's table, excluding trashed rows when
    /// the model soft-deletes.
    pub fn for_model<M: Model>() -> Self {
        Self {
            soft_deletes: M::SOFT_DELETES,
            ..Self::new(M::COLLECTION)
        }
    }

    pub fn and_where(self, column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.push_compare(Boolean::And, column.into(), operator, value.into())
    }

    pub fn or_where(self, column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.push_compare(Boolean::Or, column.into(), operator, value.into())
    }

    /// Add a parenthesized group ANDed with the existing clauses. The closure
    /// receives an empty query on the same table and its clauses become the group.
    pub fn where_group<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.push_group(Boolean::And, build)
    }

    pub fn or_where_group<F>(self, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        self.push_group(Boolean::Or, build)
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(Order {
            column: column.into(),
            direction,
        });
        self
    }

    /// Eager-load a relation path, e.g. `"comments"` or `"comments.author"`.
    pub fn with(mut self, relation: impl Into<String>) -> Self {
        self.eager.push(relation.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Include soft-deleted rows. No effect for tables without soft deletes.
    pub fn with_trashed(mut self) -> Self {
        self.with_trashed = true;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn eager_loads(&self) -> &[String] {
        &self.eager
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn soft_deletes(&self) -> bool {
        self.soft_deletes
    }

    pub fn includes_trashed(&self) -> bool {
        self.with_trashed
    }

    /// Whether rows flagged as trashed must be filtered out.
    pub fn excludes_trashed(&self) -> bool {
        self.soft_deletes && !self.with_trashed
    }

    fn push_compare(mut self, boolean: Boolean, column: String, operator: Operator, value: Value) -> Self {
        self.clauses.push(Clause {
            boolean,
            predicate: Predicate::Compare {
                column,
                operator,
                value,
            },
        });
        self
    }

    fn push_group<F>(mut self, boolean: Boolean, build: F) -> Self
    where
        F: FnOnce(Query) -> Query,
    {
        let nested = build(Query::new(self.table.clone()));
        self.clauses.push(Clause {
            boolean,
            predicate: Predicate::Group(nested.clauses),
        });
        self
    }
}
