use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{require_text, require_text_if_set};
use crate::store::Entity;

pub const MIN_PROFICIENCY: i32 = 1;
pub const MAX_PROFICIENCY: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub category: String,
    pub proficiency_level: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSkill {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub proficiency_level: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_category() -> String {
    "technical".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency_level: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Proficiency is a 1–5 scale. Out-of-range values are rejected, never clamped.
pub fn check_proficiency(level: i32) -> Result<(), String> {
    if !(MIN_PROFICIENCY..=MAX_PROFICIENCY).contains(&level) {
        return Err(format!(
            "proficiency_level must be between {MIN_PROFICIENCY} and {MAX_PROFICIENCY}, got {level}"
        ));
    }
    Ok(())
}

impl Entity for Skill {
    type Draft = NewSkill;
    type Patch = SkillPatch;

    const TABLE: &'static str = "skills";
    const OWNER_COLUMN: &'static str = "user_id";
    const RESOURCE: &'static str = "skills";
    const LABEL: &'static str = "Skill";
    const PLURAL: &'static str = "skills";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_draft(id: Uuid, owner: Uuid, draft: NewSkill, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: owner,
            name: draft.name,
            category: draft.category,
            proficiency_level: draft.proficiency_level,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: SkillPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.category {
            self.category = v;
        }
        if let Some(v) = patch.proficiency_level {
            self.proficiency_level = v;
        }
        if let Some(v) = patch.notes {
            self.notes = Some(v);
        }
        self.updated_at = now;
    }

    fn validate_draft(draft: &NewSkill) -> Result<(), String> {
        require_text("name", &draft.name)?;
        check_proficiency(draft.proficiency_level)
    }

    fn validate_patch(patch: &SkillPatch) -> Result<(), String> {
        require_text_if_set("name", patch.name.as_deref())?;
        match patch.proficiency_level {
            Some(level) => check_proficiency(level),
            None => Ok(()),
        }
    }
}
