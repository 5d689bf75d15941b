//! Rule management on top of a [`RuleRepository`].
//!
//! The repository deletes whatever it is asked to; presets are protected
//! here.

use super::error::{EngineError, Result};
use super::ports::RuleRepository;
use metatag_db::{NewTagRule, TagRule};
use regex::Regex;
use std::sync::Arc;
use tracing::info;

/// Check that a pattern compiles before it is stored.
pub fn validate_regex(pattern: &str) -> std::result::Result<(), regex::Error> {
    Regex::new(pattern).map(|_| ())
}

#[derive(Clone)]
pub struct RuleBook {
    repo: Arc<dyn RuleRepository>,
}

impl RuleBook {
    pub fn new(repo: Arc<dyn RuleRepository>) -> Self {
        Self { repo }
    }

    /// Presets first, then by name.
    pub async fn list(&self) -> Result<Vec<TagRule>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: i64) -> Result<TagRule> {
        self.repo.get(id).await?.ok_or(EngineError::RuleNotFound(id))
    }

    pub async fn create(&self, rule: NewTagRule) -> Result<TagRule> {
        let created = self.repo.create(&rule).await?;
        info!(rule_id = created.id, name = %created.name, "Created tag rule");
        Ok(created)
    }

    /// Replace every editable field of an existing rule. The preset flag is
    /// kept as stored.
    pub async fn update(&self, mut rule: TagRule) -> Result<TagRule> {
        let existing = self.get(rule.id).await?;
        rule.is_preset = existing.is_preset;
        rule.created_at = existing.created_at;
        self.repo.update(&rule).await?;
        info!(rule_id = rule.id, "Updated tag rule");
        Ok(rule)
    }

    /// Delete a user rule. Presets are refused.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let rule = self.get(id).await?;
        if rule.is_preset {
            return Err(EngineError::PresetRule(rule.name));
        }
        self.repo.delete(id).await?;
        info!(rule_id = id, name = %rule.name, "Deleted tag rule");
        Ok(())
    }
}
