use crate::collection::Collection;
use crate::document::Document;
use crate::errors::DbError;
use crate::types::{CollectionName, DocumentId};
use crate::wal::{OpKind, Wal, WalRecord};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// The main embedded engine: a collection registry over one shared WAL.
pub struct Engine {
    wal: Arc<RwLock<Wal>>,
    collections: RwLock<HashMap<CollectionName, Arc<Collection>>>,
}

impl Engine {
    /// Opens (or creates) the WAL at `wal_path` and replays it to rebuild
    /// in-memory state.
    pub fn new<P: AsRef<Path>>(wal_path: P) -> Result<Self, DbError> {
        Self::with_sync(wal_path, false)
    }

    pub fn with_sync<P: AsRef<Path>>(wal_path: P, sync_on_append: bool) -> Result<Self, DbError> {
        let path = wal_path.as_ref();
        let state = if path.exists() {
            Self::load_state(path)?
        } else {
            HashMap::new()
        };
        let wal = Arc::new(RwLock::new(Wal::with_sync(path, sync_on_append)?));
        let collections = state
            .into_iter()
            .map(|(name, docs)| {
                let col = Arc::new(Collection::load(name.clone(), wal.clone(), docs));
                (name, col)
            })
            .collect();
        Ok(Self {
            wal,
            collections: RwLock::new(collections),
        })
    }

    /// Creates a collection, or hands back the existing one.
    pub fn create_collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        if let Some(col) = self.get_collection(name) {
            return Ok(col);
        }
        let rec = WalRecord {
            op: OpKind::CreateCol,
            collection: name.to_string(),
            id: None,
            doc_json: None,
            ts: SystemTime::now(),
        };
        self.wal.write().append(&rec)?;
        let col = Arc::new(Collection::new(name.to_string(), self.wal.clone()));
        let mut cols = self.collections.write();
        Ok(cols.entry(name.to_string()).or_insert(col).clone())
    }

    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    pub fn delete_collection(&self, name: &str) -> Result<bool, DbError> {
        let existed = self.collections.write().remove(name).is_some();
        if existed {
            let rec = WalRecord {
                op: OpKind::DropCol,
                collection: name.to_string(),
                id: None,
                doc_json: None,
                ts: SystemTime::now(),
            };
            self.wal.write().append(&rec)?;
        }
        Ok(existed)
    }

    #[must_use]
    pub fn list_collection_names(&self) -> Vec<CollectionName> {
        let mut names: Vec<_> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Flushes the WAL to disk (fsync).
    pub fn flush(&self) -> Result<(), DbError> {
        self.wal.write().flush()
    }

    /// Replays the WAL into a per-collection document map (pure function).
    fn load_state(
        path: &Path,
    ) -> Result<HashMap<CollectionName, HashMap<DocumentId, Document>>, DbError> {
        let mut map: HashMap<CollectionName, HashMap<DocumentId, Document>> = HashMap::new();
        for rec in Wal::read_all(path)? {
            match rec.op {
                OpKind::CreateCol => {
                    map.entry(rec.collection).or_default();
                }
                OpKind::DropCol => {
                    map.remove(&rec.collection);
                }
                OpKind::Insert | OpKind::Update => {
                    if let Some(bytes) = rec.doc_json {
                        match serde_json::from_slice::<Document>(&bytes) {
                            Ok(doc) => {
                                map.entry(rec.collection)
                                    .or_default()
                                    .insert(doc.id.clone(), doc);
                            }
                            Err(e) => log::warn!("skipping unreadable WAL document: {e}"),
                        }
                    }
                }
                OpKind::Delete => {
                    if let (Some(id), Some(col)) = (rec.id, map.get_mut(&rec.collection)) {
                        col.remove(&id);
                    }
                }
            }
        }
        Ok(map)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
