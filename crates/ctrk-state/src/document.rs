//! Supporting documents attached to an entity and optionally to one
//! compliance instance.
//!
//! Verification is a review flag, not a lifecycle: any status may follow
//! any other, and re-verifying refreshes the verifier and time.

use ctrk_core::{
    ComplianceId, DocumentId, EntityId, Timestamp, TrackerError, TrackerResult, UserId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileMetadata {
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewDocument {
    pub entity_id: EntityId,
    #[serde(default)]
    pub compliance_id: Option<ComplianceId>,
    /// Catalog document type, e.g. `BOARD_RESOLUTION`.
    pub document_type: String,
    pub file: FileMetadata,
    #[serde(default)]
    pub uploaded_by: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub entity_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_id: Option<ComplianceId>,
    pub document_type: String,
    pub file: FileMetadata,
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<UserId>,
    pub uploaded_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Document {
    pub fn open(cmd: NewDocument, now: Timestamp) -> TrackerResult<Self> {
        if cmd.document_type.trim().is_empty() {
            return Err(TrackerError::validation("document_type must not be empty"));
        }
        if cmd.file.file_name.trim().is_empty() {
            return Err(TrackerError::validation("file_name must not be empty"));
        }
        Ok(Self {
            id: DocumentId::generate(),
            entity_id: cmd.entity_id,
            compliance_id: cmd.compliance_id,
            document_type: cmd.document_type,
            file: cmd.file,
            status: DocumentStatus::Pending,
            uploaded_by: cmd.uploaded_by,
            uploaded_at: now,
            verified_by: None,
            verified_at: None,
            comments: None,
        })
    }

    /// Set the review status and comment. Verifier and time are stamped
    /// only on `VERIFIED`; earlier stamps survive other statuses.
    pub fn set_status(
        &mut self,
        status: DocumentStatus,
        user: Option<UserId>,
        comment: Option<String>,
        now: Timestamp,
    ) {
        self.status = status;
        self.comments = comment;
        if status == DocumentStatus::Verified {
            self.verified_by = user;
            self.verified_at = Some(now);
        }
    }
}
