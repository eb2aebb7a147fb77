use super::cursor::Cursor;
use super::eval::{bson_cmp, bson_equal, eval_filter, get_path};
use super::types::{
    Filter, FindOptions, MAX_LIMIT, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS, DeleteReport, Order,
    SortSpec, UpdateDoc, UpdateReport,
};
use crate::collection::Collection;
use crate::document::Document;
use crate::errors::DbError;
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;
use std::sync::Arc;

/// Composes filter → sort → skip/limit → projection against one collection.
///
/// The result window is materialized before the cursor is returned; ordering
/// is strict by the sort spec, with ties falling back to store iteration
/// order (unspecified, not to be relied on).
pub fn find_docs(col: &Arc<Collection>, filter: &Filter, opts: &FindOptions) -> Cursor {
    let needs_projection = opts.projection.is_some();

    // If no projection or sort is needed, prefer a lazy path accumulating
    // only IDs to avoid cloning many docs.
    if !needs_projection && opts.sort.is_none() {
        let mut ids: Vec<DocumentId> = col.list_ids();
        ids.retain(|id| {
            col.find_document(id)
                .is_some_and(|d| eval_filter(&d.data, filter))
        });
        let skip = opts.skip.unwrap_or(0);
        let limit = opts.limit.unwrap_or(usize::MAX).min(MAX_LIMIT);
        let end = skip.saturating_add(limit).min(ids.len());
        let sliced: Vec<_> = if skip >= ids.len() {
            Vec::new()
        } else {
            ids[skip..end].to_vec()
        };
        return Cursor {
            collection: col.clone(),
            ids: sliced,
            pos: 0,
            docs: None,
        };
    }

    // Otherwise, materialize docs for sorting/projection.
    let mut docs: Vec<Document> = col.get_all_documents();
    docs.retain(|d| eval_filter(&d.data, filter));
    if let Some(specs) = &opts.sort {
        let limited_specs: Vec<SortSpec> = specs.iter().take(MAX_SORT_FIELDS).cloned().collect();
        sort_docs(&mut docs, &limited_specs);
    }
    let skip = opts.skip.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX).min(MAX_LIMIT);
    let end = skip.saturating_add(limit).min(docs.len());
    let slice = if skip >= docs.len() {
        &docs[0..0]
    } else {
        &docs[skip..end]
    };
    let mut projected: Vec<Document> = slice.to_vec();
    if let Some(fields) = &opts.projection {
        let limited_fields: Vec<String> =
            fields.iter().take(MAX_PROJECTION_FIELDS).cloned().collect();
        for d in &mut projected {
            d.data = project(&d.data, &limited_fields);
        }
    }
    let ids = projected.iter().map(|d| d.id.clone()).collect();
    Cursor {
        collection: col.clone(),
        ids,
        pos: 0,
        docs: Some(projected),
    }
}

#[must_use]
pub fn count_docs(col: &Arc<Collection>, filter: &Filter) -> usize {
    col.list_ids()
        .into_iter()
        .filter_map(|id| col.find_document(&id))
        .filter(|d| eval_filter(&d.data, filter))
        .count()
}

/// Merge-patches every matching document.
pub fn update_many(
    col: &Arc<Collection>,
    filter: &Filter,
    update: &UpdateDoc,
) -> Result<UpdateReport, DbError> {
    // Snapshot candidate IDs to avoid cloning the entire collection
    let ids: Vec<DocumentId> = col
        .list_ids()
        .into_iter()
        .filter(|id| {
            col.find_document(id)
                .is_some_and(|d| eval_filter(&d.data, filter))
        })
        .collect();
    let mut matched = 0u64;
    let mut modified = 0u64;
    for id in ids {
        if let Some(mut doc) = col.find_document(&id) {
            matched += 1;
            if apply_update(&mut doc, update) {
                modified += 1;
                col.update_document(&id, doc)?;
            }
        }
    }
    Ok(UpdateReport { matched, modified })
}

/// Merge-patches the first matching document.
pub fn update_one(
    col: &Arc<Collection>,
    filter: &Filter,
    update: &UpdateDoc,
) -> Result<UpdateReport, DbError> {
    if let Some(id) = col.list_ids().into_iter().find(|id| {
        col.find_document(id)
            .is_some_and(|d| eval_filter(&d.data, filter))
    }) && let Some(mut doc) = col.find_document(&id)
    {
        let changed = apply_update(&mut doc, update);
        if changed {
            col.update_document(&id, doc)?;
        }
        return Ok(UpdateReport {
            matched: 1,
            modified: u64::from(changed),
        });
    }
    Ok(UpdateReport {
        matched: 0,
        modified: 0,
    })
}

pub fn delete_many(col: &Arc<Collection>, filter: &Filter) -> Result<DeleteReport, DbError> {
    let ids: Vec<DocumentId> = col
        .list_ids()
        .into_iter()
        .filter(|id| {
            col.find_document(id)
                .is_some_and(|d| eval_filter(&d.data, filter))
        })
        .collect();
    let mut deleted = 0u64;
    for id in ids {
        if col.delete_document(&id)? {
            deleted += 1;
        }
    }
    Ok(DeleteReport { deleted })
}

pub fn delete_one(col: &Arc<Collection>, filter: &Filter) -> Result<DeleteReport, DbError> {
    if let Some(id) = col.list_ids().into_iter().find(|id| {
        col.find_document(id)
            .is_some_and(|d| eval_filter(&d.data, filter))
    }) {
        let deleted = u64::from(col.delete_document(&id)?);
        return Ok(DeleteReport { deleted });
    }
    Ok(DeleteReport { deleted: 0 })
}

/// Applies a `$set`/`$unset` merge-patch in place: only named fields change.
/// Returns whether anything was modified; `updated_at` is bumped when so.
pub fn apply_update(doc: &mut Document, upd: &UpdateDoc) -> bool {
    let mut modified = false;
    // Cap the number of fields touched per operation to bound work
    for (path, val) in upd.set.iter().take(128) {
        modified |= set_path(&mut doc.data, path, val.clone());
    }
    for path in upd.unset.iter().take(128) {
        modified |= unset_path(&mut doc.data, path);
    }
    if modified {
        doc.metadata.updated_at = chrono::Utc::now();
    }
    modified
}

fn set_path(doc: &mut BsonDocument, path: &str, val: Bson) -> bool {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.is_empty() {
        return false;
    }
    let mut cur = doc;
    for key in parts.iter().take(parts.len() - 1) {
        let key_str: &str = key;
        let need_new = !matches!(cur.get(key_str), Some(Bson::Document(_)));
        if need_new {
            cur.insert(key_str.to_string(), Bson::Document(BsonDocument::new()));
        }
        if let Some(Bson::Document(d)) = cur.get_mut(key_str) {
            cur = d;
        } else {
            return false;
        }
    }
    let Some(last) = parts.last() else {
        return false;
    };
    let prev = cur.get(*last).cloned();
    let changed = prev.as_ref().is_none_or(|p| !bson_equal(p, &val));
    cur.insert((*last).to_string(), val);
    changed
}

fn unset_path(doc: &mut BsonDocument, path: &str) -> bool {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.is_empty() {
        return false;
    }
    let mut cur = doc;
    for key in parts.iter().take(parts.len() - 1) {
        let key = *key;
        match cur.get_mut(key) {
            Some(Bson::Document(d)) => {
                cur = d;
            }
            _ => return false,
        }
    }
    let Some(last) = parts.last() else {
        return false;
    };
    cur.remove(*last).is_some()
}

#[must_use]
fn project(doc: &BsonDocument, fields: &[String]) -> BsonDocument {
    let mut out = BsonDocument::new();
    for f in fields {
        if let Some(v) = get_path(doc, f) {
            out.insert(f.clone(), v.clone());
        }
    }
    out
}

fn sort_docs(docs: &mut [Document], specs: &[SortSpec]) {
    docs.sort_by(|a, b| compare_docs(&a.data, &b.data, specs));
}

fn compare_docs(a: &BsonDocument, b: &BsonDocument, specs: &[SortSpec]) -> Ordering {
    for s in specs {
        let av = get_path(a, &s.field);
        let bv = get_path(b, &s.field);
        let ord = match (av, bv) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(ax), Some(bx)) => bson_cmp(ax, bx).unwrap_or(Ordering::Equal),
        };
        if ord != Ordering::Equal {
            return if s.order == Order::Asc {
                ord
            } else {
                ord.reverse()
            };
        }
    }
    Ordering::Equal
}
