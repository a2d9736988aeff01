use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{require_text, require_text_if_set};
use crate::store::Entity;

lenient_text_enum! {
    /// Where an application sits in the hiring pipeline.
    ApplicationStatus, default = Applied {
        Applied => "applied",
        Interview => "interview",
        Offer => "offer",
        Rejected => "rejected",
        Withdrawn => "withdrawn",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub position_title: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub application_date: Option<NaiveDate>,
    pub job_url: Option<String>,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJobApplication {
    pub company_name: String,
    pub position_title: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub application_date: Option<NaiveDate>,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobApplicationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entity for JobApplication {
    type Draft = NewJobApplication;
    type Patch = JobApplicationPatch;

    const TABLE: &'static str = "job_applications";
    const OWNER_COLUMN: &'static str = "user_id";
    const RESOURCE: &'static str = "applications";
    const LABEL: &'static str = "Job application";
    const PLURAL: &'static str = "job applications";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_draft(id: Uuid, owner: Uuid, draft: NewJobApplication, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: owner,
            company_name: draft.company_name,
            position_title: draft.position_title,
            status: draft.status,
            application_date: draft.application_date,
            job_url: draft.job_url,
            salary_range: draft.salary_range,
            location: draft.location,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: JobApplicationPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.company_name {
            self.company_name = v;
        }
        if let Some(v) = patch.position_title {
            self.position_title = v;
        }
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.application_date {
            self.application_date = Some(v);
        }
        if let Some(v) = patch.job_url {
            self.job_url = Some(v);
        }
        if let Some(v) = patch.salary_range {
            self.salary_range = Some(v);
        }
        if let Some(v) = patch.location {
            self.location = Some(v);
        }
        if let Some(v) = patch.notes {
            self.notes = Some(v);
        }
        self.updated_at = now;
    }

    fn validate_draft(draft: &NewJobApplication) -> Result<(), String> {
        require_text("company_name", &draft.company_name)?;
        require_text("position_title", &draft.position_title)
    }

    fn validate_patch(patch: &JobApplicationPatch) -> Result<(), String> {
        require_text_if_set("company_name", patch.company_name.as_deref())?;
        require_text_if_set("position_title", patch.position_title.as_deref())
    }
}
