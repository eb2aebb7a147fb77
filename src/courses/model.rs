use crate::document::Document;
use crate::errors::DbError;
use crate::query::UpdateDoc;
use crate::types::DocumentId;
use bson::{Bson, doc};
use chrono::{DateTime, Utc};

/// The persisted field names of the course schema. The schema is fixed at
/// compile time; filters and sorts are checked against it before execution.
pub const FIELDS: &[&str] = &["_id", "name", "author", "tags", "createdAt", "published"];

pub const ID: &str = "_id";
pub const NAME: &str = "name";
pub const AUTHOR: &str = "author";
pub const TAGS: &str = "tags";
pub const CREATED_AT: &str = "createdAt";
pub const PUBLISHED: &str = "published";

/// A named, authored, tagged, timestamped, publishable unit: the sole
/// entity this store manages.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    /// Assigned by the store at creation; immutable thereafter.
    pub id: DocumentId,
    pub name: String,
    pub author: String,
    pub tags: Vec<String>,
    /// Set exactly once, at creation.
    pub created_at: DateTime<Utc>,
    /// Has no store-side default; callers who rely on it must set it.
    pub published: bool,
}

/// A course as submitted for creation: identity is always assigned by the
/// store, and `created_at` defaults to the call time when omitted.
#[derive(Debug, Clone, Default)]
pub struct NewCourse {
    pub name: String,
    pub author: String,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub published: bool,
}

/// A merge-patch over course fields: only `Some` fields are overwritten, all
/// others stay untouched. Identity and creation time cannot be patched.
#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub published: Option<bool>,
}

impl NewCourse {
    /// The wire shape of one course document. The store-assigned identity is
    /// mirrored into `_id` so it is filterable and sortable like any field.
    pub(crate) fn into_data(self, id: &DocumentId, created_at: DateTime<Utc>) -> bson::Document {
        doc! {
            "_id": id.to_string(),
            "name": self.name,
            "author": self.author,
            "tags": self.tags,
            "createdAt": created_at.to_rfc3339(),
            "published": self.published,
        }
    }
}

impl Course {
    /// Decodes a stored document back into a course.
    pub(crate) fn from_document(doc: &Document) -> Result<Self, DbError> {
        let data = &doc.data;
        let name = data
            .get_str(NAME)
            .map_err(|e| DbError::Decode(format!("course name: {e}")))?
            .to_string();
        let author = data
            .get_str(AUTHOR)
            .map_err(|e| DbError::Decode(format!("course author: {e}")))?
            .to_string();
        let tags = match data.get_array(TAGS) {
            Ok(arr) => arr
                .iter()
                .map(|b| match b {
                    Bson::String(s) => Ok(s.clone()),
                    other => Err(DbError::Decode(format!(
                        "course tag: expected string, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => Vec::new(),
        };
        let created_at = data
            .get_str(CREATED_AT)
            .ok()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or(doc.metadata.created_at, |dt| dt.with_timezone(&Utc));
        let published = data.get_bool(PUBLISHED).unwrap_or(false);
        Ok(Self {
            id: doc.id.clone(),
            name,
            author,
            tags,
            created_at,
            published,
        })
    }
}

impl CoursePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.author.is_none()
            && self.tags.is_none()
            && self.published.is_none()
    }

    pub(crate) fn to_update(&self) -> UpdateDoc {
        let mut upd = UpdateDoc::default();
        if let Some(name) = &self.name {
            upd.set.push((NAME.into(), Bson::String(name.clone())));
        }
        if let Some(author) = &self.author {
            upd.set.push((AUTHOR.into(), Bson::String(author.clone())));
        }
        if let Some(tags) = &self.tags {
            upd.set.push((TAGS.into(), tags.clone().into()));
        }
        if let Some(published) = self.published {
            upd.set.push((PUBLISHED.into(), Bson::Boolean(published)));
        }
        upd
    }
}
