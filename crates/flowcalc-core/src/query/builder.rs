//! Assemble compiled DataFlow expressions into SELECT statements.
//!
//! GROUP BY is emitted only when the caller supplies grouping columns; an
//! aggregate formula alone never adds one. Callers that want mixed
//! aggregate/plain field lists caught early can turn on
//! [`QueryBuilder::strict_aggregates`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::executor::{QueryExecutor, Row};
use crate::dataflow::{ParsedExpression, parse};
use crate::error::QueryError;

/// Input for a single-formula query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub table: String,
    pub formula: String,
    #[serde(default)]
    pub group_by: Option<Vec<String>>,
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl QueryOptions {
    pub fn new(table: impl Into<String>, formula: impl Into<String>) -> Self {
        QueryOptions {
            table: table.into(),
            formula: formula.into(),
            ..Default::default()
        }
    }

    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.where_clause = Some(condition.into());
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A calculated field: `formula` is selected `AS name`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedFormula {
    pub name: String,
    pub formula: String,
}

impl NamedFormula {
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        NamedFormula {
            name: name.into(),
            formula: formula.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    /// Reject multi-field queries that mix aggregate and plain fields
    /// without GROUP BY.
    pub strict_aggregates: bool,
    /// LIMIT applied when a query does not set its own.
    pub default_limit: Option<u64>,
}

struct Clauses<'a> {
    group_by: &'a [String],
    where_clause: Option<&'a str>,
    order_by: Option<&'a str>,
    limit: Option<u64>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict_aggregates(mut self, strict: bool) -> Self {
        self.strict_aggregates = strict;
        self
    }

    pub fn with_default_limit(mut self, limit: Option<u64>) -> Self {
        self.default_limit = limit;
        self
    }

    /// SQL for one formula selected `AS result`.
    pub fn build_query(&self, options: &QueryOptions) -> Result<String, QueryError> {
        let parsed = parse(&options.formula)?;
        let group_by = columns_or_empty(options.group_by.as_deref());

        let mut select: Vec<String> = group_by.to_vec();
        select.push(format!("{} AS result", parsed.sql));

        let sql = self.assemble(
            &select,
            &options.table,
            Clauses {
                group_by,
                where_clause: options.where_clause.as_deref(),
                order_by: options.order_by.as_deref(),
                limit: options.limit,
            },
        );
        debug!(%sql, is_aggregate = parsed.is_aggregate, "built query");
        Ok(sql)
    }

    /// SQL computing several named formulas over the same table.
    pub fn build_multi_query(
        &self,
        table: &str,
        formulas: &[NamedFormula],
        group_by: Option<&[String]>,
    ) -> Result<String, QueryError> {
        let group_by = columns_or_empty(group_by);
        let parsed = formulas
            .iter()
            .map(|f| parse(&f.formula).map(|p| (f.name.as_str(), p)))
            .collect::<Result<Vec<(&str, ParsedExpression)>, _>>()?;

        if self.strict_aggregates && group_by.is_empty() {
            check_mixed_aggregates(&parsed)?;
        }

        let mut select: Vec<String> = group_by.to_vec();
        select.extend(
            parsed
                .iter()
                .map(|(name, p)| format!("{} AS {}", p.sql, name)),
        );

        let sql = self.assemble(
            &select,
            table,
            Clauses {
                group_by,
                where_clause: None,
                order_by: None,
                limit: None,
            },
        );
        debug!(%sql, fields = formulas.len(), "built multi-field query");
        Ok(sql)
    }

    /// Build the query for one formula and run it.
    pub async fn execute_formula<E>(
        &self,
        executor: &E,
        options: &QueryOptions,
    ) -> Result<Vec<Row>, QueryError>
    where
        E: QueryExecutor + ?Sized,
    {
        let sql = self.build_query(options)?;
        run(executor, &sql).await
    }

    /// Build the query for several named formulas and run it.
    pub async fn execute_formulas<E>(
        &self,
        executor: &E,
        table: &str,
        formulas: &[NamedFormula],
        group_by: Option<&[String]>,
    ) -> Result<Vec<Row>, QueryError>
    where
        E: QueryExecutor + ?Sized,
    {
        let sql = self.build_multi_query(table, formulas, group_by)?;
        run(executor, &sql).await
    }

    fn assemble(&self, select: &[String], table: &str, clauses: Clauses<'_>) -> String {
        let mut sql = format!("SELECT {} FROM {}", select.join(", "), table);

        if let Some(condition) = present(clauses.where_clause) {
            sql.push_str(&format!(" WHERE {}", condition));
        }
        if !clauses.group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", clauses.group_by.join(", ")));
        }
        if let Some(order) = present(clauses.order_by) {
            sql.push_str(&format!(" ORDER BY {}", order));
        }
        if let Some(limit) = clauses.limit.or(self.default_limit) {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }
}

async fn run<E>(executor: &E, sql: &str) -> Result<Vec<Row>, QueryError>
where
    E: QueryExecutor + ?Sized,
{
    debug!(sql, "submitting query");
    let rows = executor.query(sql, &[]).await.map_err(QueryError::Execution)?;
    debug!(rows = rows.len(), "query returned");
    Ok(rows)
}

fn columns_or_empty(columns: Option<&[String]>) -> &[String] {
    columns.unwrap_or(&[])
}

fn present(clause: Option<&str>) -> Option<&str> {
    clause.map(str::trim).filter(|c| !c.is_empty())
}

fn check_mixed_aggregates(parsed: &[(&str, ParsedExpression)]) -> Result<(), QueryError> {
    let (aggregate, plain): (Vec<_>, Vec<_>) = parsed.iter().partition(|(_, p)| p.is_aggregate);
    if aggregate.is_empty() || plain.is_empty() {
        return Ok(());
    }
    Err(QueryError::MixedAggregates {
        aggregate: aggregate.iter().map(|(name, _)| name.to_string()).collect(),
        plain: plain.iter().map(|(name, _)| name.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataFlowError;
    use crate::query::ExecutorError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingExecutor {
        seen: Mutex<Vec<(String, usize)>>,
        rows: Vec<Row>,
    }

    #[async_trait]
    impl QueryExecutor for RecordingExecutor {
        async fn query(
            &self,
            sql: &str,
            params: &[serde_json::Value],
        ) -> Result<Vec<Row>, ExecutorError> {
            self.seen.lock().unwrap().push((sql.to_string(), params.len()));
            Ok(self.rows.clone())
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl QueryExecutor for FailingExecutor {
        async fn query(&self, _: &str, _: &[serde_json::Value]) -> Result<Vec<Row>, ExecutorError> {
            Err("connection refused".into())
        }
    }

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn test_plain_select() {
        let sql = QueryBuilder::new()
            .build_query(&QueryOptions::new("sales", "TOTAL(amount)"))
            .unwrap();
        assert_eq!(sql, "SELECT SUM(amount) AS result FROM sales");
    }

    #[test]
    fn test_all_clauses_in_sql_order() {
        let options = QueryOptions::new("sales", "MEAN(amount)")
            .group_by(["region", "year"])
            .filter("status = 'paid'")
            .order_by("result DESC")
            .limit(10);
        let sql = QueryBuilder::new().build_query(&options).unwrap();
        assert_eq!(
            sql,
            "SELECT region, year, AVG(amount) AS result FROM sales \
             WHERE status = 'paid' GROUP BY region, year ORDER BY result DESC LIMIT 10"
        );
    }

    #[test]
    fn test_group_by_is_never_inferred() {
        let sql = QueryBuilder::new()
            .build_query(&QueryOptions::new("t", "TOTAL(x)"))
            .unwrap();
        assert!(!sql.contains("GROUP BY"));

        let sql = QueryBuilder::new()
            .build_query(&QueryOptions::new("t", "TOTAL(x)").group_by(Vec::<String>::new()))
            .unwrap();
        assert_eq!(sql, "SELECT SUM(x) AS result FROM t");
    }

    #[test]
    fn test_blank_clauses_are_omitted() {
        let options = QueryOptions::new("t", "x").filter("  ").order_by("");
        let sql = QueryBuilder::new().build_query(&options).unwrap();
        assert_eq!(sql, "SELECT x AS result FROM t");
    }

    #[test]
    fn test_default_limit_applies_only_without_own_limit() {
        let builder = QueryBuilder::new().with_default_limit(Some(100));
        let sql = builder.build_query(&QueryOptions::new("t", "x")).unwrap();
        assert!(sql.ends_with(" LIMIT 100"));

        let sql = builder
            .build_query(&QueryOptions::new("t", "x").limit(5))
            .unwrap();
        assert!(sql.ends_with(" LIMIT 5"));
    }

    #[test]
    fn test_unknown_function_fails_before_sql() {
        let err = QueryBuilder::new()
            .build_query(&QueryOptions::new("t", "NOPE(x)"))
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::Formula(DataFlowError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn test_multi_query_names_each_field() {
        let formulas = [
            NamedFormula::new("revenue", "TOTAL(amount)"),
            NamedFormula::new("orders", "COUNT(id)"),
        ];
        let group = vec!["region".to_string()];
        let sql = QueryBuilder::new()
            .build_multi_query("sales", &formulas, Some(&group))
            .unwrap();
        assert_eq!(
            sql,
            "SELECT region, SUM(amount) AS revenue, COUNT(id) AS orders FROM sales GROUP BY region"
        );
    }

    #[test]
    fn test_mixed_aggregates_allowed_by_default() {
        let formulas = [
            NamedFormula::new("total", "TOTAL(amount)"),
            NamedFormula::new("label", "UPPER(region)"),
        ];
        assert!(QueryBuilder::new().build_multi_query("t", &formulas, None).is_ok());
    }

    #[test]
    fn test_strict_mode_rejects_mixed_aggregates() {
        let formulas = [
            NamedFormula::new("total", "TOTAL(amount)"),
            NamedFormula::new("label", "UPPER(region)"),
        ];
        let strict = QueryBuilder::new().with_strict_aggregates(true);

        let err = strict.build_multi_query("t", &formulas, None).unwrap_err();
        match err {
            QueryError::MixedAggregates { aggregate, plain } => {
                assert_eq!(aggregate, vec!["total"]);
                assert_eq!(plain, vec!["label"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let group = vec!["region".to_string()];
        assert!(strict.build_multi_query("t", &formulas, Some(&group)).is_ok());
    }

    #[tokio::test]
    async fn test_execute_formula_submits_sql_without_params() {
        let executor = RecordingExecutor {
            rows: vec![row(json!({"result": 42}))],
            ..Default::default()
        };
        let rows = QueryBuilder::new()
            .execute_formula(&executor, &QueryOptions::new("sales", "TOTAL(amount)"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["result"], json!(42));
        let seen = executor.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![("SELECT SUM(amount) AS result FROM sales".to_string(), 0)]
        );
    }

    #[tokio::test]
    async fn test_execute_formulas_through_trait_object() {
        let executor = RecordingExecutor::default();
        let dyn_executor: &dyn QueryExecutor = &executor;
        let formulas = [NamedFormula::new("avg_price", "MEAN(price)")];
        QueryBuilder::new()
            .execute_formulas(dyn_executor, "products", &formulas, None)
            .await
            .unwrap();

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen[0].0, "SELECT AVG(price) AS avg_price FROM products");
    }

    #[tokio::test]
    async fn test_executor_failure_propagates_unchanged() {
        let err = QueryBuilder::new()
            .execute_formula(&FailingExecutor, &QueryOptions::new("t", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Execution(_)));
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_unknown_function_never_reaches_executor() {
        let executor = RecordingExecutor::default();
        let result = QueryBuilder::new()
            .execute_formula(&executor, &QueryOptions::new("t", "NOPE(x)"))
            .await;
        assert!(result.is_err());
        assert!(executor.seen.lock().unwrap().is_empty());
    }
}
