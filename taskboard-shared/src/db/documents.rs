/// Postgres-backed document store
///
/// Documents live in a single `documents` table keyed by
/// `(collection, id)` with the body in a JSONB column. Writes are plain
/// upserts, so the last writer wins.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE documents (
///     collection TEXT NOT NULL,
///     id UUID NOT NULL,
///     data JSONB NOT NULL DEFAULT '{}'::jsonb,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (collection, id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use serde_json::json;
/// use taskboard_shared::db::documents::PgDocumentStore;
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::models::document::Collection;
/// use taskboard_shared::store::DocumentStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgDocumentStore::new(pool);
///
/// let owner = uuid::Uuid::new_v4();
/// let tasks = store
///     .query_records(Collection::Tasks, "uid", &json!(owner))
///     .await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::models::document::{Collection, Document, StoredDocument};
use crate::store::{DocumentStore, StoreResult};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    data: Json<Document>,
}

impl From<DocumentRow> for StoredDocument {
    fn from(row: DocumentRow) -> Self {
        StoredDocument::new(row.id, row.data.0)
    }
}

/// Document store backed by the `documents` table
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create_record(&self, collection: Collection, data: Document) -> StoreResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, gen_random_uuid(), $2)
            RETURNING id
            "#,
        )
        .bind(collection.as_str())
        .bind(Json(&data))
        .fetch_one(&self.pool)
        .await?;

        debug!(%collection, %id, "Created document");
        Ok(id)
    }

    async fn read_record(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> StoreResult<Option<StoredDocument>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredDocument::from))
    }

    async fn write_record(&self, collection: Collection, id: Uuid, data: Document) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&data))
        .execute(&self.pool)
        .await?;

        debug!(%collection, %id, "Wrote document");
        Ok(())
    }

    async fn merge_record(&self, collection: Collection, id: Uuid, fields: Document) -> StoreResult<()> {
        // jsonb `||` replaces top-level keys only
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = NOW()
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(&fields))
        .execute(&self.pool)
        .await?;

        debug!(%collection, %id, fields = fields.len(), "Merged document");
        Ok(())
    }

    async fn delete_record(&self, collection: Collection, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(%collection, %id, deleted = result.rows_affected(), "Deleted document");
        Ok(())
    }

    async fn query_records(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<StoredDocument>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data FROM documents
            WHERE collection = $1 AND data -> $2 = $3
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(Json(value))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredDocument::from).collect())
    }
}
