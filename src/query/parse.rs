use super::types::{CmpOp, Filter, MAX_IN_SET, UpdateDoc};
use crate::errors::DbError;
use bson::Bson;
use serde::{Deserialize, Serialize};

// Serde-facing structures for safe JSON parsing of filters/updates.
// Variant order matters for the untagged representation: the operator-keyed
// forms must come before the comparison form, which accepts any map carrying
// a `field` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterSerde {
    // Logical
    And {
        #[serde(rename = "$and")]
        and: Vec<FilterSerde>,
    },
    Or {
        #[serde(rename = "$or")]
        or: Vec<FilterSerde>,
    },
    Not {
        #[serde(rename = "$not")]
        not: Box<FilterSerde>,
    },
    // Exists
    Exists {
        field: String,
        #[serde(rename = "$exists")]
        exists: bool,
    },
    // Membership
    In {
        field: String,
        #[serde(rename = "$in")]
        in_vals: Vec<Bson>,
    },
    Nin {
        field: String,
        #[serde(rename = "$nin")]
        nin_vals: Vec<Bson>,
    },
    #[cfg(feature = "regex")]
    Regex {
        field: String,
        #[serde(rename = "$regex")]
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    // Comparisons
    Cmp {
        field: String,
        #[serde(default, rename = "$eq")]
        eq: Option<Bson>,
        #[serde(default, rename = "$ne")]
        ne: Option<Bson>,
        #[serde(default, rename = "$gt")]
        gt: Option<Bson>,
        #[serde(default, rename = "$gte")]
        gte: Option<Bson>,
        #[serde(default, rename = "$lt")]
        lt: Option<Bson>,
        #[serde(default, rename = "$lte")]
        lte: Option<Bson>,
    },
    // Allow the literal true to map to Filter::True
    True(bool),
}

impl TryFrom<FilterSerde> for Filter {
    type Error = DbError;
    fn try_from(fs: FilterSerde) -> Result<Self, Self::Error> {
        use FilterSerde as FS;
        Ok(match fs {
            FS::And { and } => {
                Self::And(and.into_iter().map(Self::try_from).collect::<Result<_, _>>()?)
            }
            FS::Or { or } => {
                Self::Or(or.into_iter().map(Self::try_from).collect::<Result<_, _>>()?)
            }
            FS::Not { not } => Self::Not(Box::new(Self::try_from(*not)?)),
            FS::Exists { field, exists } => Self::Exists { path: field, exists },
            FS::In { field, in_vals } => Self::In {
                path: field,
                values: in_vals.into_iter().take(MAX_IN_SET).collect(),
            },
            FS::Nin { field, nin_vals } => Self::Nin {
                path: field,
                values: nin_vals.into_iter().take(MAX_IN_SET).collect(),
            },
            #[cfg(feature = "regex")]
            FS::Regex { field, pattern, case_insensitive } => Self::Regex {
                path: field,
                pattern,
                case_insensitive,
            },
            FS::Cmp { field, eq, ne, gt, gte, lt, lte } => {
                if let Some(v) = eq {
                    Self::Cmp { path: field, op: CmpOp::Eq, value: v }
                } else if let Some(v) = ne {
                    Self::Cmp { path: field, op: CmpOp::Ne, value: v }
                } else if let Some(v) = gt {
                    Self::Cmp { path: field, op: CmpOp::Gt, value: v }
                } else if let Some(v) = gte {
                    Self::Cmp { path: field, op: CmpOp::Gte, value: v }
                } else if let Some(v) = lt {
                    Self::Cmp { path: field, op: CmpOp::Lt, value: v }
                } else if let Some(v) = lte {
                    Self::Cmp { path: field, op: CmpOp::Lte, value: v }
                } else {
                    return Err(DbError::QueryError("no comparison operator provided".into()));
                }
            }
            FS::True(b) => {
                if b {
                    Self::True
                } else {
                    Self::Not(Box::new(Self::True))
                }
            }
        })
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateDocSerde {
    #[serde(default, rename = "$set")]
    pub set: Option<bson::Document>,
    #[serde(default, rename = "$unset")]
    pub unset: Option<Vec<String>>,
}

impl From<UpdateDocSerde> for UpdateDoc {
    fn from(us: UpdateDocSerde) -> Self {
        let mut out = Self::default();
        if let Some(setd) = us.set {
            for (k, v) in setd.into_iter().take(128) {
                out.set.push((k, v));
            }
        }
        if let Some(unset) = us.unset {
            out.unset = unset.into_iter().take(128).collect();
        }
        out
    }
}

/// # Errors
/// Returns `DbError::QueryError` when the JSON string cannot be parsed into a
/// filter structure.
pub fn parse_filter_json(json: &str) -> Result<Filter, DbError> {
    let fs: FilterSerde =
        serde_json::from_str(json).map_err(|e| DbError::QueryError(e.to_string()))?;
    Filter::try_from(fs)
}

/// # Errors
/// Returns `DbError::QueryError` when the JSON string cannot be parsed into an
/// update structure.
pub fn parse_update_json(json: &str) -> Result<UpdateDoc, DbError> {
    let us: UpdateDocSerde =
        serde_json::from_str(json).map_err(|e| DbError::QueryError(e.to_string()))?;
    Ok(UpdateDoc::from(us))
}
