//! Tag rule operations

use crate::error::{DbError, Result};
use crate::types::*;
use crate::LibraryDb;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const RULE_COLUMNS: &str =
    "id, name, source_field, regex, target_field, template, is_preset, created_at";

impl LibraryDb {
    /// All rules: presets first, then alphabetically by name.
    pub async fn list_rules(&self) -> Result<Vec<TagRule>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tag_rules ORDER BY is_preset DESC, name, id",
            RULE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_rule).collect())
    }

    pub async fn get_rule(&self, id: i64) -> Result<Option<TagRule>> {
        let row = sqlx::query(&format!("SELECT {} FROM tag_rules WHERE id = ?", RULE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_rule))
    }

    /// Insert a rule and return it with its assigned id.
    pub async fn create_rule(&self, rule: &NewTagRule) -> Result<TagRule> {
        let now = Self::now_millis();
        let result = sqlx::query(
            r#"
            INSERT INTO tag_rules (name, source_field, regex, target_field, template, is_preset, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&rule.name)
        .bind(rule.source_field.as_db_string())
        .bind(&rule.regex)
        .bind(&rule.target_field)
        .bind(&rule.template)
        .bind(rule.is_preset)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(TagRule {
            id: result.last_insert_rowid(),
            name: rule.name.clone(),
            source_field: rule.source_field.clone(),
            regex: rule.regex.clone(),
            target_field: rule.target_field.clone(),
            template: rule.template.clone(),
            is_preset: rule.is_preset,
            created_at: Self::millis_to_datetime(now),
        })
    }

    /// Replace every editable field of an existing rule.
    pub async fn update_rule(&self, rule: &TagRule) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE tag_rules SET
                name = ?,
                source_field = ?,
                regex = ?,
                target_field = ?,
                template = ?,
                is_preset = ?
            WHERE id = ?
            "#,
        )
        .bind(&rule.name)
        .bind(rule.source_field.as_db_string())
        .bind(&rule.regex)
        .bind(&rule.target_field)
        .bind(&rule.template)
        .bind(rule.is_preset)
        .bind(rule.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("Tag rule {}", rule.id)));
        }
        Ok(())
    }

    /// Delete a rule by id, preset or not. Callers guard presets.
    pub async fn delete_rule(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tag_rules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_rule(row: &SqliteRow) -> TagRule {
    let source_field: String = row.get("source_field");
    TagRule {
        id: row.get("id"),
        name: row.get("name"),
        source_field: SourceField::parse(&source_field),
        regex: row.get("regex"),
        target_field: row.get("target_field"),
        template: row.get("template"),
        is_preset: row.get("is_preset"),
        created_at: LibraryDb::millis_to_datetime(row.get("created_at")),
    }
}
