//! Document tracker.
//!
//! Documents attached to a compliance instance are linked back into the
//! instance's document refs at upload time.

use ctrk_core::{ComplianceId, DocumentId, EntityId, Timestamp, TrackerError, TrackerResult, UserId};
use ctrk_state::{Document, DocumentStatus, NewDocument};

use crate::compliance::ComplianceInstanceStore;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct DocumentTracker {
    records: Store<Document>,
    compliances: ComplianceInstanceStore,
}

impl DocumentTracker {
    pub fn new(compliances: ComplianceInstanceStore) -> Self {
        Self {
            records: Store::new(),
            compliances,
        }
    }

    /// Record an uploaded document in `PENDING`.
    ///
    /// A referenced compliance instance must exist and belong to the same
    /// entity; it gains a back reference to the document.
    pub fn add(&self, cmd: NewDocument) -> TrackerResult<Document> {
        let document = Document::open(cmd, Timestamp::now())?;
        if let Some(ref compliance_id) = document.compliance_id {
            self.compliances
                .link_document(compliance_id, &document.entity_id, document.id.clone())?;
        }
        self.records.insert(document.clone());
        tracing::info!(
            document_id = %document.id,
            entity_id = %document.entity_id,
            document_type = %document.document_type,
            "document added"
        );
        Ok(document)
    }

    pub fn get(&self, id: &DocumentId) -> TrackerResult<Document> {
        self.records
            .get(id)
            .ok_or_else(|| TrackerError::not_found(DocumentId::KIND, id))
    }

    pub fn update_status(
        &self,
        id: &DocumentId,
        status: DocumentStatus,
        user: Option<UserId>,
        comment: Option<String>,
    ) -> TrackerResult<Document> {
        let now = Timestamp::now();
        let updated = self
            .records
            .update(id, |d| d.set_status(status, user, comment, now))
            .ok_or_else(|| TrackerError::not_found(DocumentId::KIND, id))?;
        tracing::info!(document_id = %id, status = ?status, "document status updated");
        Ok(updated)
    }

    pub fn list_by_compliance(&self, compliance_id: &ComplianceId) -> Vec<Document> {
        self.records
            .filter(|d| d.compliance_id.as_ref() == Some(compliance_id))
    }

    pub fn list_by_entity(&self, entity_id: &EntityId) -> Vec<Document> {
        self.records.filter(|d| &d.entity_id == entity_id)
    }

    pub fn hydrate(&self, records: Vec<Document>) {
        self.records.replace_all(records);
    }

    pub fn snapshot(&self) -> Vec<Document> {
        self.records.list()
    }
}
