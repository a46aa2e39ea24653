//! Postgres store.
//!
//! All collections share one `documents` table keyed by `(collection, id)` with the body in a
//! `jsonb` column. Unique keys become partial expression indexes on that table, filters compile
//! to SQL over `data #> path`, and a [`UnitOfWork`] runs inside one transaction.

use super::filter::path_segments;
use super::{CollectionSpec, Filter, Query, Store, StoreError, StoreResult, UnitOfWork, Write};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Row};
use std::time::Duration;
use uuid::Uuid;

const CREATE_DOCUMENTS: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id UUID NOT NULL,
    seq BIGSERIAL,
    data JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (collection, id)
)";

const CREATE_DOCUMENTS_SEQ_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS documents_collection_seq_idx ON documents (collection, seq)";

const CREATE_COUNTERS: &str = "CREATE TABLE IF NOT EXISTS counters (
    key TEXT PRIMARY KEY,
    value BIGINT NOT NULL
)";

const NEXT_SEQUENCE: &str = "INSERT INTO counters (key, value) VALUES ($1, 1)
    ON CONFLICT (key) DO UPDATE SET value = counters.value + 1
    RETURNING value";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a connection pool to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the first connection cannot be established.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate(db.constraint().unwrap_or("unique").to_owned());
        }
    }
    StoreError::Database(err)
}

/// Identifiers end up inside DDL, so only letters, digits and underscores are accepted.
fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn unique_index_sql(collection: &str, fields: &[&str]) -> StoreResult<String> {
    if !is_identifier(collection) || fields.is_empty() || !fields.iter().all(|f| is_identifier(f))
    {
        return Err(StoreError::InvalidIndex(format!(
            "{collection}({})",
            fields.join(", ")
        )));
    }

    let name = format!("documents_{collection}_{}_key", fields.join("_")).to_ascii_lowercase();
    let columns = fields
        .iter()
        .map(|f| format!("(data->>'{f}')"))
        .collect::<Vec<_>>()
        .join(", ");
    let present = fields
        .iter()
        .map(|f| format!("data->>'{f}' IS NOT NULL"))
        .collect::<Vec<_>>()
        .join(" AND ");

    Ok(format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {name} ON documents ({columns}) \
         WHERE collection = '{collection}' AND {present}"
    ))
}

fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn push_path(qb: &mut QueryBuilder<'_, Postgres>, path: &str) {
    qb.push("data #> ");
    qb.push_bind(path_segments(path));
}

fn push_eq(qb: &mut QueryBuilder<'_, Postgres>, path: &str, value: &Value) {
    if value.is_null() {
        qb.push("(");
        push_path(qb, path);
        qb.push(" IS NULL OR ");
        push_path(qb, path);
        qb.push(" = 'null'::jsonb)");
    } else {
        qb.push("COALESCE(");
        push_path(qb, path);
        qb.push(" = ");
        qb.push_bind(value.clone());
        qb.push("::jsonb, FALSE)");
    }
}

fn push_range(qb: &mut QueryBuilder<'_, Postgres>, path: &str, op: &str, bound: &Value) {
    qb.push("COALESCE(jsonb_typeof(");
    push_path(qb, path);
    qb.push(") = jsonb_typeof(");
    qb.push_bind(bound.clone());
    qb.push("::jsonb) AND ");
    push_path(qb, path);
    qb.push(format!(" {op} "));
    qb.push_bind(bound.clone());
    qb.push("::jsonb, FALSE)");
}

fn push_joined(qb: &mut QueryBuilder<'_, Postgres>, terms: &[Filter], sep: &str, empty: &str) {
    if terms.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            qb.push(sep);
        }
        push_filter(qb, term);
    }
    qb.push(")");
}

/// Appends `filter` as a boolean SQL expression that is never NULL.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Eq(path, value) => push_eq(qb, path, value),
        Filter::Ne(path, value) => {
            qb.push("NOT ");
            push_eq(qb, path, value);
        }
        Filter::In(path, values) => {
            let terms: Vec<Filter> = values
                .iter()
                .map(|v| Filter::Eq(path.clone(), v.clone()))
                .collect();
            push_joined(qb, &terms, " OR ", "FALSE");
        }
        Filter::Contains(path, needle) => {
            qb.push("COALESCE(data #>> ");
            qb.push_bind(path_segments(path));
            qb.push(" ILIKE ");
            qb.push_bind(escape_like(needle));
            qb.push(" ESCAPE '\\', FALSE)");
        }
        Filter::Gte(path, bound) => push_range(qb, path, ">=", bound),
        Filter::Lte(path, bound) => push_range(qb, path, "<=", bound),
        Filter::And(terms) => push_joined(qb, terms, " AND ", "TRUE"),
        Filter::Or(terms) => push_joined(qb, terms, " OR ", "FALSE"),
        Filter::Not(inner) => {
            qb.push("NOT (");
            push_filter(qb, inner);
            qb.push(")");
        }
    }
}

fn select_builder<'a>(head: &str, collection: &str, filter: &Filter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(head);
    qb.push(" FROM documents WHERE collection = ");
    qb.push_bind(collection.to_owned());
    qb.push(" AND ");
    push_filter(&mut qb, filter);
    qb
}

fn find_builder<'a>(collection: &str, query: &Query) -> QueryBuilder<'a, Postgres> {
    let mut qb = select_builder("SELECT data", collection, &query.filter);
    qb.push(" ORDER BY ");
    for sort in &query.sort {
        push_path(&mut qb, &sort.field);
        qb.push(if sort.descending { " DESC, " } else { " ASC, " });
    }
    qb.push("seq ASC");
    if let Some(limit) = query.limit {
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if query.skip > 0 {
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(query.skip).unwrap_or(i64::MAX));
    }
    qb
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn migrate(&self, specs: &[CollectionSpec]) -> StoreResult<()> {
        for ddl in [CREATE_DOCUMENTS, CREATE_DOCUMENTS_SEQ_INDEX, CREATE_COUNTERS] {
            sqlx::query(ddl).execute(&self.pool).await.map_err(map_err)?;
        }
        for spec in specs {
            for fields in spec.unique {
                let ddl = unique_index_sql(spec.name, fields)?;
                sqlx::query(&ddl).execute(&self.pool).await.map_err(map_err)?;
            }
        }
        tracing::info!(collections = specs.len(), "postgres schema is up to date");
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> StoreResult<Option<Value>> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)?;
        row.map(|r| r.try_get::<Value, _>("data"))
            .transpose()
            .map_err(map_err)
    }

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<Value>> {
        let rows = find_builder(collection, query)
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_err)?;
        rows.into_iter()
            .map(|r| r.try_get::<Value, _>("data").map_err(map_err))
            .collect()
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let row = select_builder("SELECT COUNT(*) AS n", collection, filter)
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        let n: i64 = row.try_get("n").map_err(map_err)?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn next_sequence(&self, key: &str) -> StoreResult<u64> {
        let row = sqlx::query(NEXT_SEQUENCE)
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        let value: i64 = row.try_get("value").map_err(map_err)?;
        Ok(u64::try_from(value).unwrap_or(0))
    }

    async fn commit(&self, unit: UnitOfWork) -> StoreResult<()> {
        if unit.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(map_err)?;
        for write in unit.into_writes() {
            let collection = write.collection();
            let id = write.id();
            let affected = match write {
                Write::Insert { doc, .. } => sqlx::query(
                    "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)",
                )
                .bind(collection)
                .bind(id)
                .bind(doc)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?
                .rows_affected(),
                Write::Replace { doc, .. } => sqlx::query(
                    "UPDATE documents SET data = $3, updated_at = now() \
                     WHERE collection = $1 AND id = $2",
                )
                .bind(collection)
                .bind(id)
                .bind(doc)
                .execute(&mut *tx)
                .await
                .map_err(map_err)?
                .rows_affected(),
                Write::Delete { .. } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(collection)
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .map_err(map_err)?
                        .rows_affected()
                }
            };

            if affected == 0 {
                return Err(StoreError::Missing {
                    collection: collection.to_owned(),
                    id,
                });
            }
        }
        tx.commit().await.map_err(map_err)?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Sort;

    fn where_sql(filter: &Filter) -> String {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("");
        push_filter(&mut qb, filter);
        qb.sql().to_owned()
    }

    #[test]
    fn test_eq_compiles_to_jsonb_comparison() {
        assert_eq!(
            where_sql(&Filter::eq("status", "pending")),
            "COALESCE(data #> $1 = $2::jsonb, FALSE)"
        );
    }

    #[test]
    fn test_null_eq_covers_missing_field() {
        assert_eq!(
            where_sql(&Filter::eq("patientId", Value::Null)),
            "(data #> $1 IS NULL OR data #> $2 = 'null'::jsonb)"
        );
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        assert_eq!(where_sql(&Filter::In("id".into(), vec![])), "FALSE");
    }

    #[test]
    fn test_combinators_nest() {
        let sql = where_sql(&Filter::all_of(vec![
            Filter::contains("name", "ram"),
            Filter::gte("age.years", 18),
        ]));
        assert!(sql.starts_with("(COALESCE(data #>> $1 ILIKE $2"));
        assert!(sql.contains(" AND COALESCE(jsonb_typeof(data #> $3)"));
    }

    #[test]
    fn test_find_orders_by_sort_then_seq() {
        let query = Query::new(Filter::All)
            .sort(Sort::desc("createdAt"))
            .skip(20)
            .limit(10);
        let qb = find_builder("patients", &query);
        assert_eq!(
            qb.sql(),
            "SELECT data FROM documents WHERE collection = $1 AND TRUE \
             ORDER BY data #> $2 DESC, seq ASC LIMIT $3 OFFSET $4"
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_a\\"), "%50\\%\\_a\\\\%");
    }

    #[test]
    fn test_unique_index_sql() {
        let sql = unique_index_sql("lab_results", &["labOrderTestId", "parameterId"])
            .expect("valid index");
        assert!(sql.starts_with(
            "CREATE UNIQUE INDEX IF NOT EXISTS documents_lab_results_labordertestid_parameterid_key"
        ));
        assert!(sql.contains("((data->>'labOrderTestId'), (data->>'parameterId'))"));
        assert!(sql.ends_with("data->>'parameterId' IS NOT NULL"));
    }

    #[test]
    fn test_unique_index_rejects_unsafe_names() {
        assert!(matches!(
            unique_index_sql("users; DROP TABLE x", &["email"]),
            Err(StoreError::InvalidIndex(_))
        ));
        assert!(unique_index_sql("users", &["em'ail"]).is_err());
    }
}
