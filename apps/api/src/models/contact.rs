use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{require_text, require_text_if_set};
use crate::store::Entity;

lenient_text_enum! {
    /// How well the user knows a contact. Missing or unknown values read as `weak`.
    ConnectionStrength, default = Weak {
        Weak => "weak",
        Medium => "medium",
        Strong => "strong",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub linkedin_url: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub connection_strength: ConnectionStrength,
    pub last_contact_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub connection_strength: ConnectionStrength,
    #[serde(default)]
    pub last_contact_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_strength: Option<ConnectionStrength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contact_date: Option<NaiveDate>,
}

impl Entity for Contact {
    type Draft = NewContact;
    type Patch = ContactPatch;

    const TABLE: &'static str = "contacts";
    const OWNER_COLUMN: &'static str = "user_id";
    const RESOURCE: &'static str = "contacts";
    const LABEL: &'static str = "Contact";
    const PLURAL: &'static str = "contacts";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.user_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_draft(id: Uuid, owner: Uuid, draft: NewContact, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: owner,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            company: draft.company,
            position: draft.position,
            linkedin_url: draft.linkedin_url,
            notes: draft.notes,
            connection_strength: draft.connection_strength,
            last_contact_date: draft.last_contact_date,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ContactPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.email {
            self.email = Some(v);
        }
        if let Some(v) = patch.phone {
            self.phone = Some(v);
        }
        if let Some(v) = patch.company {
            self.company = Some(v);
        }
        if let Some(v) = patch.position {
            self.position = Some(v);
        }
        if let Some(v) = patch.linkedin_url {
            self.linkedin_url = Some(v);
        }
        if let Some(v) = patch.notes {
            self.notes = Some(v);
        }
        if let Some(v) = patch.connection_strength {
            self.connection_strength = v;
        }
        if let Some(v) = patch.last_contact_date {
            self.last_contact_date = Some(v);
        }
        self.updated_at = now;
    }

    fn validate_draft(draft: &NewContact) -> Result<(), String> {
        require_text("name", &draft.name)
    }

    fn validate_patch(patch: &ContactPatch) -> Result<(), String> {
        require_text_if_set("name", patch.name.as_deref())
    }
}
