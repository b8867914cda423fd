use serde::{Deserialize, Serialize};

use crate::model::Columns;

/// Rows per page when nothing else is configured.
pub const DEFAULT_ROWS: usize = 10;

/// Read settings a repository starts from. Every field is optional when
/// deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Rows per page for `paginate`.
    pub rows: usize,
    /// 1-based page `paginate` returns.
    pub page: usize,
    pub columns: Columns,
    /// Relation paths eager-loaded on every read.
    pub nested_data: Vec<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            page: 1,
            columns: Columns::All,
            nested_data: Vec::new(),
        }
    }
}
