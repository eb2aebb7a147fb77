use super::core::Collection;
use crate::document::Document;
use crate::errors::DbError;
use crate::query::{UpdateDoc, apply_update};
use crate::types::DocumentId;
use crate::wal::{OpKind, WalRecord};
use std::time::SystemTime;

impl Collection {
    fn record(
        &self,
        op: OpKind,
        id: Option<DocumentId>,
        doc: Option<&Document>,
    ) -> Result<WalRecord, DbError> {
        let doc_json = match doc {
            Some(d) => Some(serde_json::to_vec(d).map_err(|e| DbError::WriteError(e.to_string()))?),
            None => None,
        };
        Ok(WalRecord {
            op,
            collection: self.name.clone(),
            id,
            doc_json,
            ts: SystemTime::now(),
        })
    }

    /// Inserts a document: persisted first, then visible. Re-inserting an id
    /// overwrites (the store keys strictly by id).
    pub fn insert_document(&self, document: Document) -> Result<DocumentId, DbError> {
        let mut docs = self.docs.write();
        let rec = self.record(OpKind::Insert, Some(document.id.clone()), Some(&document))?;
        self.wal.write().append(&rec)?;
        let id = document.id.clone();
        docs.insert(id.clone(), document);
        Ok(id)
    }

    #[must_use]
    pub fn find_document(&self, id: &DocumentId) -> Option<Document> {
        self.docs.read().get(id).cloned()
    }

    /// Replaces a document wholesale, keeping its id. Returns false when no
    /// document has this id.
    pub fn update_document(
        &self,
        id: &DocumentId,
        new_document: Document,
    ) -> Result<bool, DbError> {
        let mut docs = self.docs.write();
        if !docs.contains_key(id) {
            return Ok(false);
        }
        let mut doc = new_document;
        doc.id = id.clone();
        let rec = self.record(OpKind::Update, Some(id.clone()), Some(&doc))?;
        self.wal.write().append(&rec)?;
        docs.insert(id.clone(), doc);
        Ok(true)
    }

    /// Atomic find-and-modify: applies `update` as a merge-patch and returns
    /// the post-mutation document. `Ok(None)` when no document has this id;
    /// that is a checkable outcome, not an error, and nothing is created.
    ///
    /// Concurrent patches against the same id serialize on the write lock;
    /// the later writer wins per named field.
    pub fn apply_patch(
        &self,
        id: &DocumentId,
        update: &UpdateDoc,
    ) -> Result<Option<Document>, DbError> {
        let mut docs = self.docs.write();
        let Some(current) = docs.get(id) else {
            return Ok(None);
        };
        let mut patched = current.clone();
        apply_update(&mut patched, update);
        let rec = self.record(OpKind::Update, Some(id.clone()), Some(&patched))?;
        self.wal.write().append(&rec)?;
        docs.insert(id.clone(), patched.clone());
        Ok(Some(patched))
    }

    /// Atomic find-and-remove: deletes the document and returns the
    /// pre-deletion snapshot. `Ok(None)` when absent; a repeated delete for
    /// the same id never yields a second snapshot.
    pub fn take_document(&self, id: &DocumentId) -> Result<Option<Document>, DbError> {
        let mut docs = self.docs.write();
        if !docs.contains_key(id) {
            return Ok(None);
        }
        let rec = self.record(OpKind::Delete, Some(id.clone()), None)?;
        self.wal.write().append(&rec)?;
        Ok(docs.remove(id))
    }

    pub fn delete_document(&self, id: &DocumentId) -> Result<bool, DbError> {
        Ok(self.take_document(id)?.is_some())
    }

    #[must_use]
    pub fn get_all_documents(&self) -> Vec<Document> {
        self.docs.read().values().cloned().collect()
    }

    /// IDs only, without cloning each document.
    #[must_use]
    pub fn list_ids(&self) -> Vec<DocumentId> {
        self.docs.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}
