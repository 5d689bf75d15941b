//! The pending change queue.
//!
//! Staged changes live only for the lifetime of one [`PendingQueue`]. Every
//! operation takes the queue lock for its whole duration, so an Apply batch
//! removes its applied records before any other caller sees the queue.

use super::error::Result;
use super::ports::{HistoryLog, TagWriter};
use super::types::{ApplyFailure, ApplyProgress, ApplyReport, ChangeDraft, PendingChange};
use metatag_ids::PendingChangeId;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct PendingQueue {
    changes: Mutex<Vec<PendingChange>>,
    writer: Arc<dyn TagWriter>,
    history: Arc<dyn HistoryLog>,
}

impl PendingQueue {
    pub fn new(writer: Arc<dyn TagWriter>, history: Arc<dyn HistoryLog>) -> Self {
        Self {
            changes: Mutex::new(Vec::new()),
            writer,
            history,
        }
    }

    /// Stage one change.
    pub async fn enqueue(&self, draft: ChangeDraft) -> PendingChange {
        let change = PendingChange::stage(draft);
        self.changes.lock().await.push(change.clone());
        debug!(id = %change.id(), file_id = change.draft().file_id, key = %change.draft().key, "Staged change");
        change
    }

    /// Stage several changes, keeping their order.
    pub async fn enqueue_many(&self, drafts: impl IntoIterator<Item = ChangeDraft>) -> Vec<PendingChange> {
        let staged: Vec<PendingChange> = drafts.into_iter().map(PendingChange::stage).collect();
        self.changes.lock().await.extend(staged.iter().cloned());
        debug!(count = staged.len(), "Staged changes");
        staged
    }

    /// Pending records in insertion order.
    pub async fn pending(&self) -> Vec<PendingChange> {
        self.changes
            .lock()
            .await
            .iter()
            .filter(|c| c.is_pending())
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.changes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.changes.lock().await.is_empty()
    }

    /// Apply the named changes in the order given.
    pub async fn apply(&self, ids: &[PendingChangeId]) -> Result<ApplyReport> {
        self.apply_with_progress(ids, None).await
    }

    /// [`Self::apply`], reporting after each id and yielding to the runtime.
    ///
    /// Unknown ids and writer failures are per-id failures; the failed
    /// record stays pending. A history append failure aborts the batch, but
    /// everything applied up to that point is still removed from the queue.
    pub async fn apply_with_progress(
        &self,
        ids: &[PendingChangeId],
        progress: Option<&UnboundedSender<ApplyProgress>>,
    ) -> Result<ApplyReport> {
        let mut changes = self.changes.lock().await;
        let mut report = ApplyReport::default();

        let outcome = self
            .apply_locked(&mut changes, ids, progress, &mut report)
            .await;
        changes.retain(|c| c.is_pending());
        outcome?;

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            remaining = changes.len(),
            "Applied pending changes"
        );
        Ok(report)
    }

    async fn apply_locked(
        &self,
        changes: &mut [PendingChange],
        ids: &[PendingChangeId],
        progress: Option<&UnboundedSender<ApplyProgress>>,
        report: &mut ApplyReport,
    ) -> Result<()> {
        for (index, id) in ids.iter().enumerate() {
            match changes.iter_mut().find(|c| c.id() == id && c.is_pending()) {
                None => report.failed.push(ApplyFailure::not_found(id)),
                Some(change) => {
                    let draft = change.draft();
                    let written = match &draft.new_value {
                        Some(value) => self.writer.write_tag(draft.file_id, &draft.key, value).await,
                        None => self.writer.delete_tag(draft.file_id, &draft.key).await,
                    };

                    match written {
                        Ok(()) => {
                            let entry = draft.history_entry();
                            change.mark_applied();
                            self.history.append(&entry).await?;
                            report.succeeded.push(id.clone());
                        }
                        Err(err) => {
                            warn!(id = %id, file_id = draft.file_id, key = %draft.key, error = %err, "Change failed to apply");
                            report.failed.push(ApplyFailure {
                                id: id.clone(),
                                error: err.to_string(),
                            });
                        }
                    }
                }
            }

            if let Some(tx) = progress {
                let _ = tx.send(ApplyProgress {
                    processed: index + 1,
                    total: ids.len(),
                    succeeded: report.succeeded.len(),
                    failed: report.failed.len(),
                });
            }
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    /// Drop the named records whatever their status.
    ///
    /// Returns the removed records, marked rejected. Unknown ids are ignored.
    pub async fn reject(&self, ids: &[PendingChangeId]) -> Vec<PendingChange> {
        let doomed: HashSet<&PendingChangeId> = ids.iter().collect();
        let mut changes = self.changes.lock().await;
        let (mut removed, kept): (Vec<_>, Vec<_>) =
            changes.drain(..).partition(|c| doomed.contains(c.id()));
        *changes = kept;
        for change in &mut removed {
            change.mark_rejected();
        }
        debug!(removed = removed.len(), "Rejected changes");
        removed
    }

    /// Drop everything. Returns how many records went.
    pub async fn clear(&self) -> usize {
        let mut changes = self.changes.lock().await;
        let removed = changes.len();
        changes.clear();
        debug!(removed, "Cleared pending changes");
        removed
    }
}
