/// In-process document store
///
/// Keeps documents in memory with the same semantics as the hosted store:
/// generated identities, last-writer-wins overwrites, shallow merge-writes,
/// idempotent deletes and creation-ordered equality queries.
///
/// It is useful for:
/// - Testing sync logic without a server
/// - Offline demos
///
/// Write failures can be injected with [`MemoryStore::fail_writes`] to
/// exercise error paths, and [`MemoryStore::write_calls`] counts every
/// mutating call that reached the store.
///
/// # Example
///
/// ```
/// use taskboard_shared::models::document::Collection;
/// use taskboard_shared::models::task::TaskRecord;
/// use taskboard_shared::store::{DocumentStore, MemoryStore};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let owner = Uuid::new_v4();
///
/// let id = store
///     .create_record(Collection::Tasks, TaskRecord::new("buy milk", owner).to_document())
///     .await?;
///
/// let stored = store.read_record(Collection::Tasks, id).await?;
/// assert!(stored.is_some());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError, StoreResult};
use crate::models::document::{merge_fields, Collection, Document, StoredDocument};

#[derive(Debug, Clone)]
struct Entry {
    /// Creation sequence, used for query ordering
    seq: u64,
    data: Document,
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(Collection, Uuid), Entry>>,
    next_seq: AtomicU64,
    fail_writes: AtomicBool,
    write_calls: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent mutating call fail with `StoreError::Network`
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of mutating calls received (including failed ones)
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Number of documents currently stored in `collection`
    pub async fn len(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    fn begin_write(&self) -> StoreResult<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Network("Injected write failure".to_string()));
        }

        Ok(())
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_record(&self, collection: Collection, data: Document) -> StoreResult<Uuid> {
        self.begin_write()?;

        let id = Uuid::new_v4();
        let entry = Entry {
            seq: self.next_seq(),
            data,
        };
        self.documents.write().await.insert((collection, id), entry);

        tracing::debug!(%collection, %id, "Created document");
        Ok(id)
    }

    async fn read_record(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> StoreResult<Option<StoredDocument>> {
        let documents = self.documents.read().await;

        Ok(documents
            .get(&(collection, id))
            .map(|entry| StoredDocument::new(id, entry.data.clone())))
    }

    async fn write_record(&self, collection: Collection, id: Uuid, data: Document) -> StoreResult<()> {
        self.begin_write()?;

        let mut documents = self.documents.write().await;
        match documents.get_mut(&(collection, id)) {
            Some(entry) => entry.data = data,
            None => {
                let seq = self.next_seq();
                documents.insert((collection, id), Entry { seq, data });
            }
        }

        Ok(())
    }

    async fn merge_record(&self, collection: Collection, id: Uuid, fields: Document) -> StoreResult<()> {
        self.begin_write()?;

        let mut documents = self.documents.write().await;
        match documents.get_mut(&(collection, id)) {
            Some(entry) => merge_fields(&mut entry.data, &fields),
            None => {
                let seq = self.next_seq();
                documents.insert((collection, id), Entry { seq, data: fields });
            }
        }

        Ok(())
    }

    async fn delete_record(&self, collection: Collection, id: Uuid) -> StoreResult<()> {
        self.begin_write()?;

        self.documents.write().await.remove(&(collection, id));
        Ok(())
    }

    async fn query_records(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<StoredDocument>> {
        let documents = self.documents.read().await;

        let mut matches: Vec<(u64, StoredDocument)> = documents
            .iter()
            .filter(|((c, _), entry)| *c == collection && entry.data.get(field) == Some(value))
            .map(|((_, id), entry)| (entry.seq, StoredDocument::new(*id, entry.data.clone())))
            .collect();

        matches.sort_by_key(|(seq, _)| *seq);

        Ok(matches.into_iter().map(|(_, doc)| doc).collect())
    }
}
