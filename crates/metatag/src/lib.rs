//! metatag: regex-driven tagging for audio and document libraries.
//!
//! - [`engine`]: rule evaluation, the pending change queue, history and undo
//! - [`writer`]: the sidecar-backed [`engine::TagWriter`]
//! - [`scan`]: discovering files in a library folder
//! - [`config`]: `config.toml` under the metatag home

pub mod config;
pub mod engine;
pub mod scan;
pub mod writer;

pub use config::MetatagConfig;
pub use engine::{EngineError, PendingQueue, Preview, Result};
pub use scan::{scan_library, ScanProgress, ScanStats};
pub use writer::SidecarTagWriter;
