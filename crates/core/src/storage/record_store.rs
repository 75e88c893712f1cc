use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;

/// Generic record store boundary: select/insert/update by equality filters.
///
/// The relational store is an external collaborator — this trait is the whole
/// surface the core consumes. Rows travel as JSON objects; there is no
/// transactional wrapping across calls, so every call is its own round trip
/// (the existence-check-then-write race between concurrent syncs for the
/// same user is accepted, see DESIGN.md).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Return all rows in `table` matching every `(column, value)` filter.
    async fn select(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<Value>, CoreError>;

    /// Insert one row. Returns the inserted rows as echoed by the store —
    /// drivers are allowed to return an empty list, in which case callers
    /// must re-select by natural key to recover generated ids.
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, CoreError>;

    /// Update rows matching the filters with the given column values.
    async fn update(
        &self,
        table: &str,
        row: Value,
        filters: &[(&str, String)],
    ) -> Result<Vec<Value>, CoreError>;
}
