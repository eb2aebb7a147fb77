use chrono::{Duration, Utc};
use coursedb::Database;
use coursedb::courses::{self, CoursePatch, CourseQuery, CourseStore, NewCourse};
use coursedb::errors::DbError;
use coursedb::query::{CmpOp, Filter, Page, SortSpec};
use coursedb::types::DocumentId;
use tempfile::tempdir;

fn open_store(dir: &tempfile::TempDir) -> (Database, CourseStore) {
    let db = Database::open(dir.path().join("courses.db")).unwrap();
    let store = db.courses().unwrap();
    (db, store)
}

fn angular() -> NewCourse {
    NewCourse {
        name: "Angular".into(),
        author: "Rocío".into(),
        tags: vec!["web".into(), "frontend".into()],
        created_at: None,
        published: true,
    }
}

fn published(value: bool) -> Filter {
    Filter::Cmp {
        path: courses::PUBLISHED.into(),
        op: CmpOp::Eq,
        value: value.into(),
    }
}

#[test]
fn create_assigns_identity_and_timestamp() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);

    let before = Utc::now();
    let course = store.create(angular()).unwrap();
    let after = Utc::now();

    assert!(course.created_at >= before && course.created_at <= after);
    assert_eq!(course.name, "Angular");
    assert_eq!(course.author, "Rocío");
    assert!(course.published);

    let other = store
        .create(NewCourse { name: "Vue".into(), author: "Ana".into(), ..Default::default() })
        .unwrap();
    assert_ne!(course.id, other.id);
}

#[test]
fn create_keeps_explicit_creation_time() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);

    let when = Utc::now() - Duration::days(3);
    let course = store
        .create(NewCourse {
            name: "Archive".into(),
            author: "Ana".into(),
            created_at: Some(when),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(course.created_at, when);
}

#[test]
fn list_pages_in_declared_order() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);
    for i in 0..10 {
        store
            .create(NewCourse {
                name: format!("course-{i:02}"),
                author: "a".into(),
                published: true,
                ..Default::default()
            })
            .unwrap();
    }

    let q = CourseQuery::new(Filter::True, Page::new(2, 3), SortSpec::asc(courses::NAME));
    let names: Vec<String> = store
        .list(&q)
        .unwrap()
        .iter()
        .map(|d| d.data.get_str(courses::NAME).unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["course-03", "course-04", "course-05"]);

    // Last window is partial, anything past it is empty.
    let q = CourseQuery::new(Filter::True, Page::new(4, 3), SortSpec::asc(courses::NAME));
    assert_eq!(store.list(&q).unwrap().len(), 1);
    let q = CourseQuery::new(Filter::True, Page::new(5, 3), SortSpec::asc(courses::NAME));
    assert!(store.list(&q).unwrap().is_empty());
}

#[test]
fn projection_returns_exactly_named_fields_plus_identity() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);
    store.create(angular()).unwrap();
    store
        .create(NewCourse { name: "Vue".into(), author: "Ana".into(), published: true, ..Default::default() })
        .unwrap();

    let q = CourseQuery::new(published(true), Page::new(1, 10), SortSpec::desc(courses::AUTHOR))
        .with_projection(&[courses::NAME, courses::TAGS]);
    let rows = store.list(&q).unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        let mut keys: Vec<&str> = row.data.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["_id", "name", "tags"]);
    }
}

#[test]
fn update_is_a_merge_patch() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);
    let course = store.create(angular()).unwrap();

    let patch = CoursePatch { author: Some("Pamela".into()), ..Default::default() };
    let updated = store.update(&course.id, &patch).unwrap().unwrap();

    assert_eq!(updated.author, "Pamela");
    assert_eq!(updated.name, course.name);
    assert_eq!(updated.tags, course.tags);
    assert_eq!(updated.created_at, course.created_at);
    assert_eq!(updated.published, course.published);
    assert_eq!(updated.id, course.id);

    // The post-mutation state is what the store now holds.
    assert_eq!(store.get(&course.id).unwrap().unwrap(), updated);
}

#[test]
fn update_and_delete_of_missing_id_are_not_found() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);
    store.create(angular()).unwrap();

    let missing = DocumentId::new();
    let patch = CoursePatch { name: Some("Ghost".into()), ..Default::default() };
    assert!(store.update(&missing, &patch).unwrap().is_none());
    assert!(store.delete(&missing).unwrap().is_none());
    // Neither call created anything.
    assert_eq!(store.count(&Filter::True).unwrap(), 1);
}

#[test]
fn delete_returns_snapshot_and_removes() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);
    let course = store.create(angular()).unwrap();

    let snapshot = store.delete(&course.id).unwrap().unwrap();
    assert_eq!(snapshot, course);

    let q = CourseQuery::new(
        CourseStore::id_filter(&course.id),
        Page::new(1, 10),
        SortSpec::asc(courses::NAME),
    );
    assert!(store.list(&q).unwrap().is_empty());
    // A repeated delete never yields a second snapshot.
    assert!(store.delete(&course.id).unwrap().is_none());
}

#[test]
fn malformed_queries_are_rejected() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);
    store.create(angular()).unwrap();

    let q = CourseQuery::new(Filter::True, Page::new(0, 10), SortSpec::asc(courses::NAME));
    assert!(matches!(store.list(&q), Err(DbError::QueryError(_))));

    let q = CourseQuery::new(Filter::True, Page::new(1, 0), SortSpec::asc(courses::NAME));
    assert!(matches!(store.list(&q), Err(DbError::QueryError(_))));

    let q = CourseQuery::new(Filter::True, Page::new(1, 10), SortSpec::asc("price"));
    assert!(matches!(store.list(&q), Err(DbError::QueryError(_))));

    let unknown = Filter::Cmp { path: "price".into(), op: CmpOp::Eq, value: 10_i64.into() };
    let q = CourseQuery::new(unknown, Page::new(1, 10), SortSpec::asc(courses::NAME));
    assert!(matches!(store.list(&q), Err(DbError::QueryError(_))));
}

#[cfg(feature = "regex")]
#[test]
fn invalid_regex_is_rejected_before_execution() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);

    let broken = Filter::Regex {
        path: courses::NAME.into(),
        pattern: "(".into(),
        case_insensitive: false,
    };
    let q = CourseQuery::new(broken, Page::new(1, 10), SortSpec::asc(courses::NAME));
    assert!(matches!(store.list(&q), Err(DbError::QueryError(_))));
}

#[cfg(feature = "regex")]
#[test]
fn regex_filters_match_text_fields() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);
    store.create(angular()).unwrap();
    store
        .create(NewCourse { name: "React".into(), author: "Rocío".into(), published: true, ..Default::default() })
        .unwrap();

    let starts_with_r = Filter::Regex {
        path: courses::NAME.into(),
        pattern: "^re".into(),
        case_insensitive: true,
    };
    let q = CourseQuery::new(starts_with_r, Page::new(1, 10), SortSpec::asc(courses::NAME));
    let rows = store.list(&q).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].data.get_str(courses::NAME).unwrap(), "React");
}

#[test]
fn courses_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("courses.db");
    let id;
    {
        let db = Database::open(&path).unwrap();
        let store = db.courses().unwrap();
        id = store.create(angular()).unwrap().id;
        db.flush().unwrap();
    }

    let db = Database::open(&path).unwrap();
    let store = db.courses().unwrap();
    let course = store.get(&id).unwrap().expect("course replayed from WAL");
    assert_eq!(course.name, "Angular");
    assert_eq!(course.tags, vec!["web".to_string(), "frontend".to_string()]);
}

// The walkthrough from the gateway's reference usage: create, list with
// filter/sort/projection, merge-patch, delete.
#[test]
fn reference_scenario() {
    let dir = tempdir().unwrap();
    let (_db, store) = open_store(&dir);

    let course = store.create(angular()).unwrap();

    let q = CourseQuery::new(published(true), Page::new(1, 10), SortSpec::desc(courses::AUTHOR))
        .with_projection(&[courses::NAME, courses::TAGS]);
    let rows = store.list(&q).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.data.get_str(courses::NAME).unwrap(), "Angular");
    assert!(row.data.get(courses::AUTHOR).is_none());
    assert!(row.data.get(courses::PUBLISHED).is_none());
    let tags: Vec<&str> = row
        .data
        .get_array(courses::TAGS)
        .unwrap()
        .iter()
        .filter_map(bson::Bson::as_str)
        .collect();
    assert_eq!(tags, vec!["web", "frontend"]);

    let patch = CoursePatch {
        author: Some("Pamela".into()),
        published: Some(true),
        ..Default::default()
    };
    let updated = store.update(&course.id, &patch).unwrap().unwrap();
    assert_eq!(updated.author, "Pamela");
    assert_eq!(updated.name, "Angular");

    let snapshot = store.delete(&course.id).unwrap().unwrap();
    assert_eq!(snapshot, updated);
    let q = CourseQuery::new(
        CourseStore::id_filter(&course.id),
        Page::new(1, 10),
        SortSpec::asc(courses::NAME),
    );
    assert!(store.list(&q).unwrap().is_empty());
}
