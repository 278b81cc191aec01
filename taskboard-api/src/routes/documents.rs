/// Document endpoints
///
/// All routes sit behind the bearer-token middleware and go through the
/// ownership rules in `taskboard_shared::auth::authorization` before the
/// store is touched. Writes are last-writer-wins.
///
/// # Endpoints
///
/// ```text
/// POST   /v1/collections/:collection/documents                create  -> 201 {id, data}
/// GET    /v1/collections/:collection/documents?field=&value=  query   -> 200 [{id, data}]
/// GET    /v1/collections/:collection/documents/:id            read    -> 200 {id, data}
/// PUT    /v1/collections/:collection/documents/:id            write   -> 204
/// PATCH  /v1/collections/:collection/documents/:id            merge   -> 204
/// DELETE /v1/collections/:collection/documents/:id            delete  -> 204
/// ```
///
/// The query `value` is parsed as JSON when possible (`true`, `42`,
/// `"text"`) and otherwise taken as a plain string.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use taskboard_shared::{
    auth::{authorization, middleware::AuthContext},
    models::document::{Collection, Document, StoredDocument},
};
use tracing::debug;
use uuid::Uuid;

/// Equality filter for the query endpoint
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// Top-level field name
    pub field: String,

    /// Value to match
    pub value: String,
}

impl QueryParams {
    /// Interprets `value` as JSON, falling back to a string
    pub fn json_value(&self) -> Value {
        serde_json::from_str(&self.value).unwrap_or_else(|_| Value::String(self.value.clone()))
    }
}

fn collection(name: &str) -> ApiResult<Collection> {
    Ok(name.parse::<Collection>()?)
}

async fn existing(state: &AppState, collection: Collection, id: Uuid) -> ApiResult<Option<Document>> {
    Ok(state
        .documents
        .read_record(collection, id)
        .await?
        .map(|stored| stored.data))
}

/// Create a document with a generated id
pub async fn create_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(name): Path<String>,
    Json(data): Json<Document>,
) -> ApiResult<(StatusCode, Json<StoredDocument>)> {
    let collection = collection(&name)?;
    authorization::require_create(&auth, collection, &data)?;

    let id = state.documents.create_record(collection, data.clone()).await?;
    debug!(user_id = %auth.user_id, %collection, %id, "Created document");

    Ok((StatusCode::CREATED, Json(StoredDocument::new(id, data))))
}

/// List documents matching an equality filter
pub async fn query_documents(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(name): Path<String>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Vec<StoredDocument>>> {
    let collection = collection(&name)?;
    let value = params.json_value();
    authorization::require_query(&auth, collection, &params.field, &value)?;

    let documents = state
        .documents
        .query_records(collection, &params.field, &value)
        .await?;

    Ok(Json(documents))
}

/// Read a single document
pub async fn read_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((name, id)): Path<(String, Uuid)>,
) -> ApiResult<Json<StoredDocument>> {
    let collection = collection(&name)?;

    let data = existing(&state, collection, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    authorization::require_read(&auth, collection, id, &data)?;

    Ok(Json(StoredDocument::new(id, data)))
}

/// Overwrite (or create) the document at `id`
pub async fn write_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((name, id)): Path<(String, Uuid)>,
    Json(data): Json<Document>,
) -> ApiResult<StatusCode> {
    let collection = collection(&name)?;
    let current = existing(&state, collection, id).await?;
    authorization::require_write(&auth, collection, id, current.as_ref(), &data)?;

    state.documents.write_record(collection, id, data).await?;
    debug!(user_id = %auth.user_id, %collection, %id, "Wrote document");

    Ok(StatusCode::NO_CONTENT)
}

/// Merge fields into the document at `id`
pub async fn merge_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((name, id)): Path<(String, Uuid)>,
    Json(fields): Json<Document>,
) -> ApiResult<StatusCode> {
    let collection = collection(&name)?;
    let current = existing(&state, collection, id).await?;
    authorization::require_merge(&auth, collection, id, current.as_ref(), &fields)?;

    state.documents.merge_record(collection, id, fields).await?;
    debug!(user_id = %auth.user_id, %collection, %id, "Merged document");

    Ok(StatusCode::NO_CONTENT)
}

/// Delete the document at `id`
///
/// Deleting an absent document succeeds.
pub async fn delete_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((name, id)): Path<(String, Uuid)>,
) -> ApiResult<StatusCode> {
    let collection = collection(&name)?;
    let current = existing(&state, collection, id).await?;
    authorization::require_delete(&auth, collection, id, current.as_ref())?;

    state.documents.delete_record(collection, id).await?;
    debug!(user_id = %auth.user_id, %collection, %id, "Deleted document");

    Ok(StatusCode::NO_CONTENT)
}
