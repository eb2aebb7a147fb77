use bson::doc;
use coursedb::document::Document;

#[test]
fn new_documents_get_distinct_ids() {
    let d1 = Document::new(doc! { "key": "value" });
    let d2 = Document::new(doc! { "key": "value" });
    assert_ne!(d1.id, d2.id);
}

#[test]
fn new_document_timestamps_match() {
    let d = Document::new(doc! { "key": "value" });
    assert_eq!(d.metadata.created_at, d.metadata.updated_at);
}

#[test]
fn update_replaces_data_and_bumps_timestamp() {
    let mut d = Document::new(doc! { "key": "value" });
    let created = d.metadata.created_at;
    d.update(doc! { "key": "other" });
    assert_eq!(d.data.get_str("key").unwrap(), "other");
    assert_eq!(d.metadata.created_at, created);
    assert!(d.metadata.updated_at >= created);
}
