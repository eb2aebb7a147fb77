pub mod collection;
pub mod config;
pub mod courses;
pub mod document;
pub mod engine;
pub mod errors;
pub mod logger;
pub mod query;
pub mod types;
pub mod wal;

use crate::collection::Collection;
use crate::config::DatabaseOptions;
use crate::courses::CourseStore;
use crate::document::Document;
use crate::engine::Engine;
use crate::errors::DbError;
use crate::types::DocumentId;
use std::path::Path;
use std::sync::Arc;

/// The main database struct: a collection registry plus the typed course
/// gateway, over one write-ahead log.
pub struct Database {
    engine: Arc<Engine>,
}

impl Database {
    /// Opens or creates the default database file in the working directory.
    pub fn new() -> Result<Self, DbError> {
        Self::open_with(DatabaseOptions::default())
    }

    /// Opens or creates a database file, replaying any existing state.
    pub fn open<P: AsRef<Path>>(filepath: P) -> Result<Self, DbError> {
        Self::open_with(DatabaseOptions::with_path(filepath))
    }

    pub fn open_with(options: DatabaseOptions) -> Result<Self, DbError> {
        if options.log_to_file
            && let Some(stem) = options.path.file_stem().and_then(|s| s.to_str())
        {
            let _ = crate::logger::init_for_db(stem);
        }
        let engine = Engine::with_sync(&options.path, options.flush_each_write)?;
        Ok(Database {
            engine: Arc::new(engine),
        })
    }

    /// Creates a collection with the given name, or returns the existing one.
    pub fn create_collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        self.engine.create_collection(name)
    }

    /// Retrieves a collection by its name.
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.engine.get_collection(name)
    }

    /// Deletes a collection by its name.
    pub fn delete_collection(&self, name: &str) -> Result<bool, DbError> {
        self.engine.delete_collection(name)
    }

    /// Lists the names of all collections.
    pub fn list_collection_names(&self) -> Vec<String> {
        self.engine.list_collection_names()
    }

    /// Flushes the WAL to disk.
    pub fn flush(&self) -> Result<(), DbError> {
        self.engine.flush()
    }

    /// The typed course gateway, creating its collection on first use.
    pub fn courses(&self) -> Result<CourseStore, DbError> {
        Ok(CourseStore::new(
            self.engine.create_collection(courses::COLLECTION)?,
        ))
    }

    /// Inserts a document into the specified collection.
    pub fn insert_document(
        &self,
        collection_name: &str,
        document: Document,
    ) -> Result<DocumentId, DbError> {
        let collection = self
            .engine
            .get_collection(collection_name)
            .ok_or_else(|| DbError::NoSuchCollection(collection_name.to_string()))?;
        collection.insert_document(document)
    }

    /// Deletes a document from the specified collection by its ID.
    pub fn delete_document(
        &self,
        collection_name: &str,
        document_id: &DocumentId,
    ) -> Result<bool, DbError> {
        let collection = self
            .engine
            .get_collection(collection_name)
            .ok_or_else(|| DbError::NoSuchCollection(collection_name.to_string()))?;
        collection.delete_document(document_id)
    }

    // --- Query API (façade over the query module) ---

    pub fn find(
        &self,
        collection_name: &str,
        filter: &query::Filter,
        opts: &query::FindOptions,
    ) -> Result<query::Cursor, DbError> {
        let col = self
            .engine
            .get_collection(collection_name)
            .ok_or_else(|| DbError::NoSuchCollection(collection_name.to_string()))?;
        Ok(query::find_docs(&col, filter, opts))
    }

    pub fn count(&self, collection_name: &str, filter: &query::Filter) -> Result<usize, DbError> {
        let col = self
            .engine
            .get_collection(collection_name)
            .ok_or_else(|| DbError::NoSuchCollection(collection_name.to_string()))?;
        Ok(query::count_docs(&col, filter))
    }

    pub fn update_many(
        &self,
        collection_name: &str,
        filter: &query::Filter,
        update: &query::UpdateDoc,
    ) -> Result<query::UpdateReport, DbError> {
        let col = self
            .engine
            .get_collection(collection_name)
            .ok_or_else(|| DbError::NoSuchCollection(collection_name.to_string()))?;
        query::update_many(&col, filter, update)
    }

    pub fn update_one(
        &self,
        collection_name: &str,
        filter: &query::Filter,
        update: &query::UpdateDoc,
    ) -> Result<query::UpdateReport, DbError> {
        let col = self
            .engine
            .get_collection(collection_name)
            .ok_or_else(|| DbError::NoSuchCollection(collection_name.to_string()))?;
        query::update_one(&col, filter, update)
    }

    pub fn delete_many(
        &self,
        collection_name: &str,
        filter: &query::Filter,
    ) -> Result<query::DeleteReport, DbError> {
        let col = self
            .engine
            .get_collection(collection_name)
            .ok_or_else(|| DbError::NoSuchCollection(collection_name.to_string()))?;
        query::delete_many(&col, filter)
    }

    pub fn delete_one(
        &self,
        collection_name: &str,
        filter: &query::Filter,
    ) -> Result<query::DeleteReport, DbError> {
        let col = self
            .engine
            .get_collection(collection_name)
            .ok_or_else(|| DbError::NoSuchCollection(collection_name.to_string()))?;
        query::delete_one(&col, filter)
    }
}

/// Initializes the database system.
///
/// This function should be called before any other database operations.
/// It sets up the logger and other necessary components.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    logger::init()?;
    Ok(())
}
