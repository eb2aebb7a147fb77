use crate::document::types::Metadata;
use crate::types::DocumentId;
use bson::Document as BsonDocument;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: BsonDocument,
    pub metadata: Metadata,
}

impl Document {
    #[must_use]
    pub fn new(data: BsonDocument) -> Self {
        Self {
            id: DocumentId::new(),
            data,
            metadata: Metadata::new(),
        }
    }

    /// Replaces the payload wholesale, bumping `updated_at`.
    pub fn update(&mut self, new_data: BsonDocument) {
        self.data = new_data;
        self.metadata.updated_at = Utc::now();
    }
}
