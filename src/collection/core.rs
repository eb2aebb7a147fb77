use crate::document::Document;
use crate::types::{CollectionName, DocumentId};
use crate::wal::Wal;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// One named set of documents, write-through to the shared WAL.
///
/// The `docs` write lock is the atomicity unit for find-and-modify and
/// find-and-remove: nothing partial is ever observable. Iteration order of
/// the map is unspecified and must not be relied on by callers; only an
/// explicit sort produces a defined order.
pub struct Collection {
    pub name: CollectionName,
    pub(crate) wal: Arc<RwLock<Wal>>,
    pub(crate) docs: RwLock<HashMap<DocumentId, Document>>,
}

impl Collection {
    #[must_use]
    pub fn new(name: CollectionName, wal: Arc<RwLock<Wal>>) -> Self {
        Self {
            name,
            wal,
            docs: RwLock::new(HashMap::new()),
        }
    }

    /// Rebuilds a collection from replayed state.
    pub(crate) fn load(
        name: CollectionName,
        wal: Arc<RwLock<Wal>>,
        docs: HashMap<DocumentId, Document>,
    ) -> Self {
        Self {
            name,
            wal,
            docs: RwLock::new(docs),
        }
    }
}
