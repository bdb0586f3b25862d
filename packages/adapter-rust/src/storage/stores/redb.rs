//! Durable [`KeyValueStore`] backed by a single `redb` database file.
//!
//! Every collection maps to one redb table of `&str -> &[u8]`, named
//! `c:<collection>` since redb rejects empty table names. Tables are
//! created on first write; reading a table that does not exist yet yields
//! nothing. redb transactions block, so every call runs on tokio's blocking
//! pool.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use stowage_core::Blob;

use crate::storage::key_value_store::KeyValueStore;

fn table_name(collection: &str) -> String {
    format!("c:{collection}")
}

fn table(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

/// File-backed store. Cheap to clone; clones share the database handle.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Opens the database at `path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or is not a redb
    /// database.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path)
            .with_context(|| format!("opening redb database at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "redb store opened");
        Ok(Self { db: Arc::new(db) })
    }

    async fn blocking<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .context("redb task panicked")?
    }
}

#[async_trait]
impl KeyValueStore for RedbStore {
    fn name(&self) -> &'static str {
        "redb"
    }

    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Blob>> {
        let name = table_name(collection);
        let id = id.to_string();
        self.blocking(move |db| {
            let txn = db.begin_read()?;
            let tbl = match txn.open_table(table(&name)) {
                Ok(tbl) => tbl,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            Ok(tbl.get(id.as_str())?.map(|v| Blob::from(v.value())))
        })
        .await
    }

    async fn put(&self, collection: &str, id: &str, blob: &Blob) -> anyhow::Result<()> {
        let name = table_name(collection);
        let id = id.to_string();
        let blob = blob.clone();
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            {
                let mut tbl = txn.open_table(table(&name))?;
                tbl.insert(id.as_str(), blob.as_bytes())?;
            }
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        let name = table_name(collection);
        let id = id.to_string();
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            {
                let mut tbl = txn.open_table(table(&name))?;
                tbl.remove(id.as_str())?;
            }
            txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn all(&self, collection: &str) -> anyhow::Result<Vec<(String, Blob)>> {
        let name = table_name(collection);
        self.blocking(move |db| {
            let txn = db.begin_read()?;
            let tbl = match txn.open_table(table(&name)) {
                Ok(tbl) => tbl,
                Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };
            let mut out = Vec::new();
            for entry in tbl.iter()? {
                let (k, v) = entry?;
                out.push((k.value().to_string(), Blob::from(v.value())));
            }
            Ok(out)
        })
        .await
    }

    async fn clear_all(&self, collection: &str) -> anyhow::Result<()> {
        let name = table_name(collection);
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            txn.delete_table(table(&name))?;
            txn.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(s: &str) -> Blob {
        Blob::from(s.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn put_get_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("records.redb")).unwrap();

        store.put("posts", "1", &blob("a")).await.unwrap();
        assert_eq!(store.get("posts", "1").await.unwrap(), Some(blob("a")));

        store.remove("posts", "1").await.unwrap();
        assert!(store.get("posts", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_of_unknown_collection_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("records.redb")).unwrap();

        assert!(store.get("nothing", "1").await.unwrap().is_none());
        assert!(store.all("nothing").await.unwrap().is_empty());
        assert!(store.clear_all("nothing").await.is_ok());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.put("posts", "1", &blob("a")).await.unwrap();
            store.put("posts", "2", &blob("b")).await.unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        let all = store.all("posts").await.unwrap();
        assert_eq!(
            all,
            vec![("1".to_string(), blob("a")), ("2".to_string(), blob("b"))]
        );
    }

    #[tokio::test]
    async fn reads_and_writes_with_empty_collection_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("records.redb")).unwrap();

        assert!(store.all("").await.unwrap().is_empty());
        store.put("", "1", &blob("a")).await.unwrap();
        assert_eq!(store.get("", "1").await.unwrap(), Some(blob("a")));
        assert_eq!(store.all("").await.unwrap(), vec![("1".to_string(), blob("a"))]);

        store.remove("", "1").await.unwrap();
        assert!(store.get("", "1").await.unwrap().is_none());
        store.clear_all("").await.unwrap();
    }

    #[tokio::test]
    async fn clear_all_drops_only_that_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("records.redb")).unwrap();
        store.put("posts", "1", &blob("a")).await.unwrap();
        store.put("comments", "1", &blob("c")).await.unwrap();

        store.clear_all("posts").await.unwrap();

        assert!(store.all("posts").await.unwrap().is_empty());
        assert_eq!(store.all("comments").await.unwrap().len(), 1);
    }
}
