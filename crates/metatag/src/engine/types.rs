//! Staged change records and the reports produced by Apply.

use metatag_db::{FileRecord, HistoryOperation, NewHistoryEntry};
use metatag_ids::PendingChangeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A proposed mutation of one tag on one file, before it is staged.
///
/// The file path and filename are captured so a change can be displayed
/// without going back to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDraft {
    pub file_id: i64,
    pub file_path: String,
    pub filename: String,
    pub key: String,
    /// Value at the time the draft was computed.
    pub old_value: Option<String>,
    /// `None` deletes the key.
    pub new_value: Option<String>,
}

impl ChangeDraft {
    pub fn for_file(
        file: &FileRecord,
        key: impl Into<String>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            file_id: file.id,
            file_path: file.path.clone(),
            filename: file.filename.clone(),
            key: key.into(),
            old_value,
            new_value,
        }
    }

    /// The history row written once this change has been applied.
    ///
    /// The operation only looks at the old value; a removal of an existing
    /// key is an `update` whose new value is empty.
    pub fn history_entry(&self) -> NewHistoryEntry {
        let operation = match self.old_value {
            Some(_) => HistoryOperation::Update,
            None => HistoryOperation::Create,
        };
        NewHistoryEntry {
            file_id: self.file_id,
            key: self.key.clone(),
            old_value: self.old_value.clone(),
            new_value: self.new_value.clone(),
            operation,
        }
    }
}

/// Lifecycle of a staged change. `Applied` and `Rejected` are terminal; the
/// queue drops records once they reach either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Pending,
    Applied,
    Rejected,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A staged change. Only the queue can move its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingChange {
    id: PendingChangeId,
    #[serde(flatten)]
    draft: ChangeDraft,
    status: ChangeStatus,
}

impl PendingChange {
    pub(crate) fn stage(draft: ChangeDraft) -> Self {
        Self {
            id: PendingChangeId::new(),
            draft,
            status: ChangeStatus::Pending,
        }
    }

    pub fn id(&self) -> &PendingChangeId {
        &self.id
    }

    pub fn draft(&self) -> &ChangeDraft {
        &self.draft
    }

    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.status == ChangeStatus::Pending
    }

    pub(crate) fn mark_applied(&mut self) {
        self.status = ChangeStatus::Applied;
    }

    pub(crate) fn mark_rejected(&mut self) {
        self.status = ChangeStatus::Rejected;
    }
}

/// Why one id in an Apply batch did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyFailure {
    pub id: PendingChangeId,
    pub error: String,
}

impl ApplyFailure {
    pub const NOT_FOUND: &'static str = "Change not found";

    pub(crate) fn not_found(id: &PendingChangeId) -> Self {
        Self {
            id: id.clone(),
            error: Self::NOT_FOUND.to_string(),
        }
    }
}

/// Outcome of one Apply call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub succeeded: Vec<PendingChangeId>,
    pub failed: Vec<ApplyFailure>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sent after each id of an Apply call has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyProgress {
    pub processed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Sent after each file of an evaluation has been looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateProgress {
    pub evaluated: usize,
    pub total: usize,
    pub proposed: usize,
}
