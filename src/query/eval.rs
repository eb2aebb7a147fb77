use super::types::{CmpOp, Filter, MAX_IN_SET, MAX_PATH_DEPTH};
use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

#[must_use]
pub fn eval_filter(doc: &BsonDocument, f: &Filter) -> bool {
    match f {
        Filter::True => true,
        Filter::And(v) => v.iter().all(|x| eval_filter(doc, x)),
        Filter::Or(v) => v.iter().any(|x| eval_filter(doc, x)),
        Filter::Not(b) => !eval_filter(doc, b),
        Filter::Exists { path, exists } => get_path(doc, path).is_some() == *exists,
        Filter::In { path, values } => get_path(doc, path)
            .is_some_and(|v| values.iter().take(MAX_IN_SET).any(|x| bson_equal(v, x))),
        Filter::Nin { path, values } => get_path(doc, path)
            .is_none_or(|v| values.iter().take(MAX_IN_SET).all(|x| !bson_equal(v, x))),
        Filter::Cmp { path, op, value } => {
            match (get_path(doc, path), op) {
                (Some(v), CmpOp::Eq) => bson_equal(v, value),
                (Some(v), CmpOp::Ne) => !bson_equal(v, value),
                // A document without the field counts as not-equal.
                (None, CmpOp::Ne) => true,
                (Some(v), CmpOp::Gt) => {
                    bson_cmp(v, value).is_some_and(|o| o == Ordering::Greater)
                }
                (Some(v), CmpOp::Gte) => bson_cmp(v, value).is_some_and(|o| o != Ordering::Less),
                (Some(v), CmpOp::Lt) => bson_cmp(v, value).is_some_and(|o| o == Ordering::Less),
                (Some(v), CmpOp::Lte) => {
                    bson_cmp(v, value).is_some_and(|o| o != Ordering::Greater)
                }
                _ => false,
            }
        }
        #[cfg(feature = "regex")]
        Filter::Regex { path, pattern, case_insensitive } => match get_path(doc, path) {
            Some(Bson::String(s)) => {
                if pattern.len() > 512 {
                    return false;
                }
                let pat = if *case_insensitive {
                    format!("(?i){pattern}")
                } else {
                    pattern.clone()
                };
                let Ok(re) = regex::Regex::new(&pat) else {
                    return false;
                };
                re.is_match(s)
            }
            _ => false,
        },
    }
}

pub(crate) fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut iter = path.split('.');
    let first = iter.next()?;
    // Enforce path depth limit
    let mut depth = 1usize;
    let mut cur: Option<&Bson> = doc.get(first);
    for part in iter {
        depth += 1;
        if depth > MAX_PATH_DEPTH {
            return None;
        }
        match cur {
            Some(Bson::Document(d)) => {
                cur = d.get(part);
            }
            _ => return None,
        }
    }
    cur
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(b: &Bson) -> Option<f64> {
    match b {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

#[allow(clippy::float_cmp, clippy::cast_precision_loss)]
pub(crate) fn bson_equal(a: &Bson, b: &Bson) -> bool {
    match (a, b) {
        (Bson::Int32(x), Bson::Int64(y)) => i64::from(*x) == *y,
        (Bson::Int64(x), Bson::Int32(y)) => *x == i64::from(*y),
        (Bson::Int32(x), Bson::Double(y)) => f64::from(*x) == *y,
        (Bson::Double(x), Bson::Int32(y)) => *x == f64::from(*y),
        (Bson::Int64(x), Bson::Double(y)) => (*x as f64) == *y,
        (Bson::Double(x), Bson::Int64(y)) => *x == (*y as f64),
        _ => a == b,
    }
}

pub(crate) fn bson_cmp(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(af), Some(bf)) = (to_f64(a), to_f64(b)) {
        return af.partial_cmp(&bf);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
