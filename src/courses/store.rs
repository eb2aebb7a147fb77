use super::model::{Course, CoursePatch, FIELDS, ID, NewCourse};
use crate::collection::Collection;
use crate::document::{Document, Metadata};
use crate::errors::DbError;
use crate::query::{self, CmpOp, Filter, FindOptions, Page, SortSpec};
use crate::types::DocumentId;
use bson::Bson;
use chrono::Utc;
use std::sync::Arc;

/// Name of the backing collection.
pub const COLLECTION: &str = "courses";

/// One list request: filter, explicit page window, order, and an optional
/// projection naming the fields to return.
#[derive(Debug, Clone)]
pub struct CourseQuery {
    pub filter: Filter,
    pub page: Page,
    pub sort: SortSpec,
    pub projection: Option<Vec<String>>,
}

impl CourseQuery {
    #[must_use]
    pub fn new(filter: Filter, page: Page, sort: SortSpec) -> Self {
        Self {
            filter,
            page,
            sort,
            projection: None,
        }
    }

    #[must_use]
    pub fn with_projection(mut self, fields: &[&str]) -> Self {
        self.projection = Some(fields.iter().map(ToString::to_string).collect());
        self
    }
}

/// Typed gateway over the course collection.
///
/// Stateless and reentrant: every call is one request against the store, with
/// no retries and no locking beyond the store's own. Concurrent updates
/// against the same id are serialized by the store; when they name overlapping
/// fields the later writer wins per field (store-defined last-write-wins).
#[derive(Clone)]
pub struct CourseStore {
    collection: Arc<Collection>,
}

impl CourseStore {
    #[must_use]
    pub fn new(collection: Arc<Collection>) -> Self {
        Self { collection }
    }

    /// Creates a course. The store assigns the identity; `createdAt` defaults
    /// to the call time when the caller did not set one.
    ///
    /// # Errors
    /// `StoreUnavailable` when the backing store cannot be reached,
    /// `WriteError` when it rejects the write.
    pub fn create(&self, new: NewCourse) -> Result<Course, DbError> {
        if new.name.is_empty() || new.author.is_empty() {
            log::warn!("creating course with empty name or author");
        }
        let created_at = new.created_at.unwrap_or_else(Utc::now);
        let id = DocumentId::new();
        let mut metadata = Metadata::new();
        metadata.created_at = created_at;
        metadata.updated_at = created_at;
        let doc = Document {
            id: id.clone(),
            data: new.into_data(&id, created_at),
            metadata,
        };
        let id = self.collection.insert_document(doc)?;
        let stored = self
            .collection
            .find_document(&id)
            .ok_or_else(|| DbError::WriteError("inserted course not readable".into()))?;
        Course::from_document(&stored)
    }

    /// Lists one page of matching courses: filter → sort → page window →
    /// projection, fully materialized before return. Projected rows contain
    /// exactly the named fields; identity is always included.
    ///
    /// # Errors
    /// `QueryError` when the page number is zero, the page size is zero, a
    /// filter or sort field is not part of the course schema, or a regex
    /// pattern does not compile.
    pub fn list(&self, q: &CourseQuery) -> Result<Vec<Document>, DbError> {
        self.validate(q)?;
        let mut opts = FindOptions::paged(q.page, vec![q.sort.clone()]);
        if let Some(fields) = &q.projection {
            let mut fields = fields.clone();
            if !fields.iter().any(|f| f == ID) {
                fields.insert(0, ID.to_string());
            }
            opts.projection = Some(fields);
        }
        Ok(query::find_docs(&self.collection, &q.filter, &opts).to_vec())
    }

    /// Atomic merge-patch by id, returning the post-mutation course.
    /// `Ok(None)` when no course has this id; nothing is created.
    pub fn update(&self, id: &DocumentId, patch: &CoursePatch) -> Result<Option<Course>, DbError> {
        match self.collection.apply_patch(id, &patch.to_update())? {
            Some(doc) => Ok(Some(Course::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    /// Atomic remove by id, returning the pre-deletion snapshot. `Ok(None)`
    /// when absent, including on a repeated delete.
    pub fn delete(&self, id: &DocumentId) -> Result<Option<Course>, DbError> {
        match self.collection.take_document(id)? {
            Some(doc) => Ok(Some(Course::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    pub fn get(&self, id: &DocumentId) -> Result<Option<Course>, DbError> {
        match self.collection.find_document(id) {
            Some(doc) => Ok(Some(Course::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    /// Counts matching courses without paging.
    pub fn count(&self, filter: &Filter) -> Result<usize, DbError> {
        Self::validate_filter(filter)?;
        Ok(query::count_docs(&self.collection, filter))
    }

    /// A filter matching exactly one identity.
    #[must_use]
    pub fn id_filter(id: &DocumentId) -> Filter {
        Filter::Cmp {
            path: ID.into(),
            op: CmpOp::Eq,
            value: Bson::String(id.to_string()),
        }
    }

    fn validate(&self, q: &CourseQuery) -> Result<(), DbError> {
        if q.page.number < 1 {
            return Err(DbError::QueryError("page number must be >= 1".into()));
        }
        if q.page.size == 0 {
            return Err(DbError::QueryError("page size must be >= 1".into()));
        }
        Self::validate_filter(&q.filter)?;
        if !FIELDS.contains(&q.sort.field.as_str()) {
            return Err(DbError::QueryError(format!(
                "unknown sort field: {}",
                q.sort.field
            )));
        }
        Ok(())
    }

    fn validate_filter(filter: &Filter) -> Result<(), DbError> {
        let mut paths = Vec::new();
        filter.paths(&mut paths);
        for path in paths {
            let head = path.split('.').next().unwrap_or(path);
            if !FIELDS.contains(&head) {
                return Err(DbError::QueryError(format!("unknown filter field: {path}")));
            }
        }
        #[cfg(feature = "regex")]
        Self::validate_regexes(filter)?;
        Ok(())
    }

    #[cfg(feature = "regex")]
    fn validate_regexes(filter: &Filter) -> Result<(), DbError> {
        match filter {
            Filter::And(v) | Filter::Or(v) => v.iter().try_for_each(Self::validate_regexes),
            Filter::Not(b) => Self::validate_regexes(b),
            Filter::Regex { pattern, .. } => regex::Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| DbError::QueryError(format!("invalid regex: {e}"))),
            _ => Ok(()),
        }
    }
}
