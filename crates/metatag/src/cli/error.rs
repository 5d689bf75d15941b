//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    pub fn database_open(path: &Path, reason: impl fmt::Display) -> Self {
        Self::new(format!("Failed to open database: {}", reason))
            .with_context(format!("Database path: {}", path.display()))
            .with_suggestions([
                "TRY: Ensure the directory exists and is writable".to_string(),
                "TRY: Point at another database with --db <path>".to_string(),
            ])
    }

    pub fn not_a_directory(path: &Path) -> Self {
        Self::new(format!("Not a directory: {}", path.display()))
            .with_context("A library must be a folder of media files")
            .with_suggestion(format!("TRY: Check the path: ls -la {}", path.display()))
    }

    pub fn library_not_found(id: i64) -> Self {
        Self::new(format!("Library not found: {}", id))
            .with_suggestion("TRY: List libraries with: metatag library list")
    }

    pub fn file_not_found(id: i64) -> Self {
        Self::new(format!("File not found: {}", id))
            .with_context("The file may have been removed by a rescan")
            .with_suggestions([
                "TRY: List files with: metatag library files <library-id>".to_string(),
                "TRY: Search by name with: metatag library search <text>".to_string(),
            ])
    }

    pub fn rule_not_found(id: i64) -> Self {
        Self::new(format!("Tag rule not found: {}", id))
            .with_suggestion("TRY: List rules with: metatag rule list")
    }

    pub fn preset_rule(name: &str) -> Self {
        Self::new(format!("Preset rule '{}' cannot be removed", name))
            .with_context("Presets are seeded on every start and are read-only")
            .with_suggestion("TRY: Add your own rule with: metatag rule add")
    }

    pub fn invalid_regex(pattern: &str, reason: impl fmt::Display) -> Self {
        Self::new(format!("Invalid regex: {}", pattern))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Quote the pattern so the shell leaves it alone: --regex '^(\\d+)'".to_string(),
                "TRY: Escape literal brackets and dots with a backslash".to_string(),
            ])
    }

    pub fn nothing_to_undo(file_id: i64) -> Self {
        Self::new(format!("Nothing to undo for file {}", file_id))
            .with_context("No tag change has been recorded for this file")
            .with_suggestion(format!("TRY: Check its history: metatag history show {}", file_id))
    }

    pub fn no_files_selected() -> Self {
        Self::new("No files selected")
            .with_suggestions([
                "TRY: Pick a whole library with --library <id>".to_string(),
                "TRY: Pick single files with --file <id> (repeatable)".to_string(),
            ])
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context_and_suggestions() {
        let err = HelpfulError::rule_not_found(12);
        let text = err.to_string();
        assert!(text.starts_with("ERROR: Tag rule not found: 12"));
        assert!(text.contains("TRY: List rules with: metatag rule list"));
    }

    #[test]
    fn display_without_context() {
        let text = HelpfulError::new("boom").to_string();
        assert_eq!(text, "ERROR: boom\n");
    }
}
