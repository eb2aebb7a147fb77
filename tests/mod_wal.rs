use bson::doc;
use coursedb::document::Document;
use coursedb::errors::DbError;
use coursedb::types::DocumentId;
use coursedb::wal::{OpKind, Wal, WalRecord, read_record, write_record};
use std::time::SystemTime;
use tempfile::tempdir;

fn insert_record(collection: &str) -> WalRecord {
    let doc = Document::new(doc! { "key": "value" });
    WalRecord {
        op: OpKind::Insert,
        collection: collection.to_string(),
        id: Some(doc.id.clone()),
        doc_json: Some(serde_json::to_vec(&doc).unwrap()),
        ts: SystemTime::now(),
    }
}

#[test]
fn record_roundtrip() {
    let mut buf = Vec::new();
    write_record(&mut buf, &insert_record("a")).unwrap();
    write_record(&mut buf, &insert_record("b")).unwrap();

    let mut cursor = std::io::Cursor::new(buf);
    let r1 = read_record(&mut cursor).unwrap().unwrap();
    let r2 = read_record(&mut cursor).unwrap().unwrap();
    assert_eq!(r1.collection, "a");
    assert_eq!(r2.collection, "b");
    assert!(read_record(&mut cursor).unwrap().is_none());
}

#[test]
fn checksum_mismatch_is_a_decode_error() {
    let mut buf = Vec::new();
    write_record(&mut buf, &insert_record("a")).unwrap();
    // First payload byte sits right after the 8-byte frame header.
    buf[8] ^= 0xFF;
    let err = read_record(&mut std::io::Cursor::new(buf)).unwrap_err();
    assert!(matches!(err, DbError::Decode(_)));
}

#[test]
fn read_all_stops_at_torn_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.bin");
    {
        let mut wal = Wal::new(&path).unwrap();
        wal.append(&insert_record("a")).unwrap();
        wal.append(&insert_record("b")).unwrap();
        wal.append(&insert_record("c")).unwrap();
        wal.flush().unwrap();
    }
    // Tear the last record.
    let len = std::fs::metadata(&path).unwrap().len();
    let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(len - 3).unwrap();

    let records = Wal::read_all(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].collection, "a");
    assert_eq!(records[1].collection, "b");
}

#[test]
fn delete_records_carry_no_payload() {
    let rec = WalRecord {
        op: OpKind::Delete,
        collection: "a".to_string(),
        id: Some(DocumentId::new()),
        doc_json: None,
        ts: SystemTime::now(),
    };
    let mut buf = Vec::new();
    write_record(&mut buf, &rec).unwrap();
    let back = read_record(&mut std::io::Cursor::new(buf)).unwrap().unwrap();
    assert_eq!(back.op, OpKind::Delete);
    assert!(back.doc_json.is_none());
    assert_eq!(back.id, rec.id);
}
