//! pgvector-backed corpus store and embedding index.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use super::connection::{validate_identifier, verify_connection};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CorpusRecord, PendingRecord};
use crate::domain::ports::{CorpusStore, EmbeddingIndex};

/// Recipe corpus stored in two tables: records and `(id, embedding)` rows.
#[derive(Clone)]
pub struct PgCorpusStore {
    pool: PgPool,
    records_table: String,
    embeddings_table: String,
}

impl PgCorpusStore {
    pub fn new(
        pool: PgPool,
        records_table: impl Into<String>,
        embeddings_table: impl Into<String>,
    ) -> DomainResult<Self> {
        let records_table = records_table.into();
        let embeddings_table = embeddings_table.into();
        for table in [&records_table, &embeddings_table] {
            validate_identifier(table).map_err(|e| DomainError::ValidationFailed(e.to_string()))?;
        }
        Ok(Self {
            pool,
            records_table,
            embeddings_table,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn search_sql(&self) -> String {
        format!(
            "SELECT r.id::bigint AS id, r.name::text AS name, \
             COALESCE(r.description::text, '') AS description, \
             to_jsonb(r) - 'id' - 'name' - 'description' AS attributes, \
             e.embedding <=> $1::real[]::vector AS distance \
             FROM {emb} e JOIN {rec} r ON r.id = e.id \
             ORDER BY distance LIMIT $2",
            emb = self.embeddings_table,
            rec = self.records_table,
        )
    }

    fn schema_sql(&self, dimension: usize) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {emb} (\
             id BIGINT PRIMARY KEY REFERENCES {rec}(id), \
             embedding VECTOR({dimension}) NOT NULL)",
            emb = self.embeddings_table,
            rec = self.records_table,
        )
    }

    fn pending_sql(&self) -> String {
        format!(
            "SELECT r.id::bigint AS id, r.description::text AS description \
             FROM {rec} r LEFT JOIN {emb} e ON e.id = r.id \
             WHERE e.id IS NULL AND r.description IS NOT NULL AND btrim(r.description::text) <> '' \
             ORDER BY r.id",
            emb = self.embeddings_table,
            rec = self.records_table,
        )
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {emb} (id, embedding) VALUES ($1, $2::real[]::vector) \
             ON CONFLICT (id) DO NOTHING",
            emb = self.embeddings_table,
        )
    }
}

fn store_error(err: sqlx::Error) -> DomainError {
    DomainError::CorpusStoreFailed(err.to_string())
}

#[async_trait]
impl CorpusStore for PgCorpusStore {
    #[instrument(skip(self, embedding), fields(dimension = embedding.len()))]
    async fn search(&self, embedding: &[f32], top_k: usize) -> DomainResult<Vec<CorpusRecord>> {
        let limit = i64::try_from(top_k).unwrap_or(i64::MAX);
        let rows = sqlx::query(&self.search_sql())
            .bind(embedding.to_vec())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let records = rows
            .into_iter()
            .map(|row| -> Result<CorpusRecord, sqlx::Error> {
                let attributes = match row.try_get::<Option<Value>, _>("attributes")? {
                    Some(Value::Object(map)) => map,
                    _ => Map::new(),
                };
                Ok(CorpusRecord {
                    id: row.try_get("id")?,
                    name: row.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
                    description: row.try_get("description")?,
                    attributes,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(store_error)?;

        debug!(hits = records.len(), "corpus search complete");
        Ok(records)
    }
}

#[async_trait]
impl EmbeddingIndex for PgCorpusStore {
    async fn ensure_schema(&self, dimension: usize) -> DomainResult<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;
        sqlx::query(&self.schema_sql(dimension))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn pending_records(&self) -> DomainResult<Vec<PendingRecord>> {
        let rows = sqlx::query(&self.pending_sql())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| -> DomainResult<PendingRecord> {
                Ok(PendingRecord {
                    id: row.try_get("id")?,
                    text: row.try_get("description")?,
                })
            })
            .collect()
    }

    async fn insert_embeddings(&self, rows: &[(i64, Vec<f32>)]) -> DomainResult<u64> {
        let sql = self.insert_sql();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for (id, vector) in rows {
            inserted += sqlx::query(&sql)
                .bind(id)
                .bind(vector)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn verify_connection(&self) -> DomainResult<String> {
        verify_connection(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))
    }
}
