use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{require_text, require_text_if_set};
use crate::store::Entity;

/// Status stamped on letters saved by the generation relay.
pub const STATUS_GENERATED: &str = "generated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CoverLetter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub company_name: String,
    pub position_title: String,
    pub content: String,
    pub job_description: Option<String>,
    pub tone: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoverLetter {
    pub title: String,
    pub company_name: String,
    pub position_title: String,
    pub content: String,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_status")]
    pub status: String,
}

pub fn default_tone() -> String {
    "professional".to_string()
}

fn default_status() -> String {
    "draft".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverLetterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Entity for CoverLetter {
    type Draft = NewCoverLetter;
    type Patch = CoverLetterPatch;

    const TABLE: &'static str = "cover_letters";
    const OWNER_COLUMN: &'static str = "user_id";
    const RESOURCE: &'static str = "cover-letters";
    const LABEL: &'static str = "Cover letter";
    const PLURAL: &'static str = "cover letters";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_draft(id: Uuid, owner: Uuid, draft: NewCoverLetter, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: owner,
            title: draft.title,
            company_name: draft.company_name,
            position_title: draft.position_title,
            content: draft.content,
            job_description: draft.job_description,
            tone: draft.tone,
            status: draft.status,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: CoverLetterPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.content {
            self.content = v;
        }
        if let Some(v) = patch.tone {
            self.tone = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        self.updated_at = now;
    }

    fn validate_draft(draft: &NewCoverLetter) -> Result<(), String> {
        require_text("title", &draft.title)?;
        require_text("content", &draft.content)
    }

    fn validate_patch(patch: &CoverLetterPatch) -> Result<(), String> {
        require_text_if_set("title", patch.title.as_deref())?;
        require_text_if_set("content", patch.content.as_deref())
    }
}
