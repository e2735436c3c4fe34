//! The query-execution capability supplied by the caller.

use async_trait::async_trait;

/// One result row keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Whatever the executor fails with; passed through to the caller unchanged.
pub type ExecutorError = Box<dyn std::error::Error + Send + Sync>;

/// Runs SQL text against some database.
///
/// The builder only ever submits fully-built statements with an empty
/// parameter list. Retry, timeout and cancellation are the implementor's
/// concern.
///
/// ```ignore
/// struct Duck(duckdb::Connection);
///
/// #[async_trait]
/// impl QueryExecutor for Duck {
///     async fn query(&self, sql: &str, params: &[serde_json::Value]) -> Result<Vec<Row>, ExecutorError> {
///         ...
///     }
/// }
/// ```
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn query(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> Result<Vec<Row>, ExecutorError>;
}
