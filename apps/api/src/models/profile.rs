use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::store::Entity;

/// A user's profile. Its `id` is the owner's identity, so each user has at most one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Role given to every profile. Callers cannot choose or change it; a `role`
/// key in a create or patch body is ignored.
pub const DEFAULT_ROLE: &str = "user";

impl Entity for Profile {
    type Draft = NewProfile;
    type Patch = ProfilePatch;

    const TABLE: &'static str = "profiles";
    const OWNER_COLUMN: &'static str = "id";
    const RESOURCE: &'static str = "profiles";
    const LABEL: &'static str = "Profile";
    const PLURAL: &'static str = "profile";

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn new_id(owner: Uuid) -> Uuid {
        owner
    }

    fn from_draft(id: Uuid, _owner: Uuid, draft: NewProfile, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email: draft.email,
            full_name: draft.full_name,
            role: DEFAULT_ROLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: ProfilePatch, now: DateTime<Utc>) {
        if let Some(v) = patch.email {
            self.email = Some(v);
        }
        if let Some(v) = patch.full_name {
            self.full_name = Some(v);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_id_is_owner() {
        let owner = Uuid::new_v4();
        let profile = Profile::from_draft(
            Profile::new_id(owner),
            owner,
            NewProfile::default(),
            Utc::now(),
        );
        assert_eq!(profile.id, owner);
        assert_eq!(profile.owner(), owner);
        assert_eq!(profile.role, DEFAULT_ROLE);
    }

    #[test]
    fn test_role_in_body_is_ignored() {
        let owner = Uuid::new_v4();
        let draft: NewProfile =
            serde_json::from_value(serde_json::json!({"full_name": "Mallory", "role": "admin"}))
                .unwrap();
        let mut profile = Profile::from_draft(owner, owner, draft, Utc::now());
        assert_eq!(profile.role, DEFAULT_ROLE);

        let patch: ProfilePatch =
            serde_json::from_value(serde_json::json!({"role": "admin"})).unwrap();
        profile.apply_patch(patch, Utc::now());
        assert_eq!(profile.role, DEFAULT_ROLE);
        assert_eq!(profile.full_name.as_deref(), Some("Mallory"));
    }
}
