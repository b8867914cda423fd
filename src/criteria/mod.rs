//! Criteria - reusable filters and sort rules folded over a [`Query`].
//!
//! A criterion is built once and never changes; `apply` consumes a query and
//! returns the extended one. A repository replays its whole [`CriteriaList`]
//! against a fresh query on every read, so criteria hold no query state.
//!
//! ## Example
//!
//! ```ignore
//! use repository_criteria::{Criterion, Direction};
//!
//! repository
//!     .push_criteria(Criterion::equals("status", "active"))
//!     .push_criteria(Criterion::like("name", "ann"))
//!     .push_criteria(Criterion::order_by("created_at", Direction::Desc));
//!
//! let users = repository.all(false)?;
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::query::{Direction, Operator, Query};
use crate::repository::RepositoryScope;
use crate::value::Value;

/// Extension point for filters the built-in variants do not cover.
pub trait CustomCriterion: fmt::Debug + Send + Sync {
    fn apply(&self, query: Query, repository: &dyn RepositoryScope) -> Query;
}

#[derive(Debug, Clone)]
pub enum Criterion {
    /// `column = value`
    Equals { column: String, value: Value },
    /// `(c1 = v1 or c2 = v2 ...)`; an empty list matches every row.
    OrEquals { values: Vec<(String, Value)> },
    /// `column < value`
    LessThan { column: String, value: Value },
    /// `(column like %v% or column like v% or column like %v)`
    Like { column: String, value: String },
    /// Appends a sort key after any existing ones.
    OrderBy { column: String, direction: Direction },
    Custom(Arc<dyn CustomCriterion>),
}

impl Criterion {
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Criterion::Equals {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn or_equals<I, C, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Value>,
    {
        Criterion::OrEquals {
            values: values
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }

    pub fn less_than(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Criterion::LessThan {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn like(column: impl Into<String>, value: impl Into<String>) -> Self {
        Criterion::Like {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn order_by(column: impl Into<String>, direction: Direction) -> Self {
        Criterion::OrderBy {
            column: column.into(),
            direction,
        }
    }

    pub fn custom<C: CustomCriterion + 'static>(criterion: C) -> Self {
        Criterion::Custom(Arc::new(criterion))
    }

    pub fn apply(&self, query: Query, repository: &dyn RepositoryScope) -> Query {
        match self {
            Criterion::Equals { column, value } => {
                query.and_where(column.as_str(), Operator::Eq, value.clone())
            }
            Criterion::OrEquals { values } => query.where_group(|group| {
                values.iter().fold(group, |group, (column, value)| {
                    group.or_where(column.as_str(), Operator::Eq, value.clone())
                })
            }),
            Criterion::LessThan { column, value } => {
                query.and_where(column.as_str(), Operator::Lt, value.clone())
            }
            Criterion::Like { column, value } => query.where_group(|group| {
                group
                    .or_where(column.as_str(), Operator::Like, format!("%{}%", value))
                    .or_where(column.as_str(), Operator::Like, format!("{}%", value))
                    .or_where(column.as_str(), Operator::Like, format!("%{}", value))
            }),
            Criterion::OrderBy { column, direction } => query.order_by(column.as_str(), *direction),
            Criterion::Custom(custom) => custom.apply(query, repository),
        }
    }
}

/// Ordered, append-only list of criteria. Duplicates are kept.
#[derive(Debug, Clone, Default)]
pub struct CriteriaList {
    criteria: Vec<Criterion>,
}

impl CriteriaList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn as_slice(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Criterion> {
        self.criteria.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.criteria.clear();
    }

    /// Left fold in push order: each criterion receives the query produced by
    /// the one before it.
    pub fn apply(&self, query: Query, repository: &dyn RepositoryScope) -> Query {
        self.criteria
            .iter()
            .enumerate()
            .fold(query, |query, (position, criterion)| {
                trace!(position, ?criterion, "applying criterion");
                criterion.apply(query, repository)
            })
    }
}

impl<'a> IntoIterator for &'a CriteriaList {
    type Item = &'a Criterion;
    type IntoIter = std::slice::Iter<'a, Criterion>;

    fn into_iter(self) -> Self::IntoIter {
        self.criteria.iter()
    }
}

impl FromIterator<Criterion> for CriteriaList {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        Self {
            criteria: iter.into_iter().collect(),
        }
    }
}
