use bson::Bson;
use serde::{Deserialize, Serialize};

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;
pub(crate) const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: Order::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: Order::Desc,
        }
    }
}

/// A 1-based page window: `skip = (number - 1) * size`, `limit = size`.
///
/// There are no ambient defaults; every list call names its page explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    #[must_use]
    pub const fn new(number: usize, size: usize) -> Self {
        Self { number, size }
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.number.saturating_sub(1) * self.size
    }
}

/// Options for `find_docs`.
///
/// Semantics:
/// - When `projection` is `Some(fields)`, the returned documents contain only those fields.
/// - Sorting is applied before the skip/limit window is cut.
/// - Results are sliced by `skip`/`limit` with an internal maximum of `MAX_LIMIT`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindOptions {
    pub projection: Option<Vec<String>>,
    pub sort: Option<Vec<SortSpec>>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl FindOptions {
    /// Options for one page of results in a given order.
    #[must_use]
    pub fn paged(page: Page, sort: Vec<SortSpec>) -> Self {
        Self {
            projection: None,
            sort: Some(sort),
            limit: Some(page.size),
            skip: Some(page.offset()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Exists { path: String, exists: bool },
    In { path: String, values: Vec<Bson> },
    Nin { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
    #[cfg(feature = "regex")]
    Regex { path: String, pattern: String, case_insensitive: bool },
}

impl Filter {
    /// Collects every field path this filter touches, for schema checks.
    pub fn paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::True => {}
            Self::And(v) | Self::Or(v) => {
                for f in v {
                    f.paths(out);
                }
            }
            Self::Not(b) => b.paths(out),
            Self::Exists { path, .. }
            | Self::In { path, .. }
            | Self::Nin { path, .. }
            | Self::Cmp { path, .. } => out.push(path),
            #[cfg(feature = "regex")]
            Self::Regex { path, .. } => out.push(path),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct UpdateDoc {
    pub set: Vec<(String, Bson)>,
    pub unset: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: u64,
}
