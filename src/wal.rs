use crate::errors::DbError;
use crate::types::{CollectionName, DocumentId};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// WAL operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    CreateCol,
    DropCol,
    Insert,
    Update,
    Delete,
}

/// One WAL record. The envelope is bincode-encoded; `doc_json` is raw JSON
/// bytes (serde_json), to remain format-agnostic in the future.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalRecord {
    pub op: OpKind,
    pub collection: CollectionName,
    pub id: Option<DocumentId>,
    pub doc_json: Option<Vec<u8>>,
    pub ts: SystemTime,
}

/// Frame layout: payload length (u32 LE), crc32 of the payload (u32 LE),
/// payload bytes.
pub fn write_record<W: Write>(writer: &mut W, rec: &WalRecord) -> Result<(), DbError> {
    let bytes = bincode::serde::encode_to_vec(rec, bincode::config::standard())?;
    let len = u32::try_from(bytes.len())
        .map_err(|_| DbError::WriteError("WAL record too large".into()))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&crc32fast::hash(&bytes).to_le_bytes())?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Reads the next record, `Ok(None)` at a clean end of stream.
///
/// # Errors
/// `DbError::Decode` on a checksum mismatch or an undecodable envelope;
/// `DbError::StoreUnavailable` on a short or failed read.
pub fn read_record<R: Read>(reader: &mut R) -> Result<Option<WalRecord>, DbError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let mut crc_buf = [0u8; 4];
    reader.read_exact(&mut crc_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    if crc32fast::hash(&buf) != u32::from_le_bytes(crc_buf) {
        return Err(DbError::Decode("WAL record checksum mismatch".into()));
    }
    let (rec, _) = bincode::serde::decode_from_slice(&buf, bincode::config::standard())?;
    Ok(Some(rec))
}

/// Append-only write-ahead log shared by all collections of one database.
pub struct Wal {
    writer: BufWriter<File>,
    path: PathBuf,
    sync_on_append: bool,
}

impl Wal {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        Self::with_sync(path, false)
    }

    pub fn with_sync<P: AsRef<Path>>(path: P, sync_on_append: bool) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            sync_on_append,
        })
    }

    pub fn append(&mut self, rec: &WalRecord) -> Result<(), DbError> {
        write_record(&mut self.writer, rec)?;
        if self.sync_on_append {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), DbError> {
        self.writer.flush()?;
        self.writer.get_mut().sync_all()?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replays all records from `path`. A torn or corrupt tail ends the
    /// replay (best-effort) rather than failing the open.
    pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<WalRecord>, DbError> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        loop {
            match read_record(&mut reader) {
                Ok(Some(rec)) => records.push(rec),
                Ok(None) => break,
                Err(e) => {
                    log::warn!("WAL replay stopped at corrupt tail: {e}");
                    break;
                }
            }
        }
        Ok(records)
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
