//! Tag-rule engine and pending-change pipeline.
//!
//! Flow: a [`TagRule`](metatag_db::TagRule) is previewed over a set of files
//! by [`evaluate`], the proposals are staged in a [`PendingQueue`], and
//! Apply hands each one to a [`TagWriter`] and records it in the
//! [`HistoryLog`] so [`undo_last`] can reverse it.

pub mod error;
pub mod evaluator;
pub mod history;
pub mod ports;
pub mod queue;
pub mod rules;
pub mod source;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod spy;

pub use error::{EngineError, Result};
pub use evaluator::{current_value, evaluate, evaluate_with_progress, Preview};
pub use history::{record, undo_last, Reversal};
pub use ports::{HistoryLog, LibraryReader, RuleRepository, TagWriter};
pub use queue::PendingQueue;
pub use rules::{validate_regex, RuleBook};
pub use types::{
    ApplyFailure, ApplyProgress, ApplyReport, ChangeDraft, ChangeStatus, EvaluateProgress,
    PendingChange,
};
