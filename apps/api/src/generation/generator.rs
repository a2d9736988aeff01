//! Content generation: request type → prompt pair → one completion call.
//!
//! Cover letters are additionally saved for the caller when the request carries
//! a bearer token that resolves to a user. That save is best-effort: it is only
//! logged and never changes what the caller gets back.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::auth::IdentityProvider;
use crate::generation::prompts::{
    fill, COVER_LETTER_PROMPT, COVER_LETTER_SYSTEM, JOB_MATCH_PROMPT, JOB_MATCH_SYSTEM,
    MOTIVATION_PROMPT, MOTIVATION_SYSTEM, SALARY_INSIGHTS_PROMPT, SALARY_INSIGHTS_SYSTEM,
};
use crate::llm_client::{CompletionBackend, LlmError};
use crate::models::cover_letter::{default_tone, NewCoverLetter, STATUS_GENERATED};
use crate::models::CoverLetter;
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationType {
    CoverLetter,
    Motivation,
    JobMatch,
    SalaryInsights,
}

impl GenerationType {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "cover_letter" => Some(Self::CoverLetter),
            "motivation" => Some(Self::Motivation),
            "job_match" => Some(Self::JobMatch),
            "salary_insights" => Some(Self::SalaryInsights),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoverLetter => "cover_letter",
            Self::Motivation => "motivation",
            Self::JobMatch => "job_match",
            Self::SalaryInsights => "salary_insights",
        }
    }
}

/// Body of `POST /functions/v1/generate-career-content`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub user_profile: Option<Value>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub position_title: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
}

impl GenerationRequest {
    pub fn tone(&self) -> String {
        self.tone.clone().unwrap_or_else(default_tone)
    }

    fn company(&self) -> &str {
        self.company_name.as_deref().unwrap_or_default()
    }

    fn position(&self) -> &str {
        self.position_title.as_deref().unwrap_or_default()
    }

    /// Profile as compact JSON; absent renders as `null`.
    fn profile_json(&self) -> String {
        self.user_profile
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_else(|| "null".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub system: String,
    pub user: String,
}

pub fn build_prompts(kind: GenerationType, request: &GenerationRequest) -> Prompts {
    let tone = request.tone();
    let profile = request.profile_json();
    let values = [
        ("tone", tone.as_str()),
        ("company", request.company()),
        ("position", request.position()),
        ("job_description", request.job_description.as_deref().unwrap_or_default()),
        ("profile", profile.as_str()),
        ("prompt", request.prompt.as_deref().unwrap_or_default()),
    ];

    let (system, user) = match kind {
        GenerationType::CoverLetter => (COVER_LETTER_SYSTEM, COVER_LETTER_PROMPT),
        GenerationType::Motivation => (MOTIVATION_SYSTEM, MOTIVATION_PROMPT),
        GenerationType::JobMatch => (JOB_MATCH_SYSTEM, JOB_MATCH_PROMPT),
        GenerationType::SalaryInsights => (SALARY_INSIGHTS_SYSTEM, SALARY_INSIGHTS_PROMPT),
    };

    Prompts {
        system: fill(system, &values),
        user: fill(user, &values),
    }
}

/// Builds the prompts for `kind` and makes a single completion call.
pub async fn generate(
    backend: &dyn CompletionBackend,
    kind: GenerationType,
    request: &GenerationRequest,
) -> Result<String, LlmError> {
    let prompts = build_prompts(kind, request);
    let content = backend.complete(&prompts.system, &prompts.user).await?;
    info!(kind = kind.as_str(), "Generated content successfully");
    Ok(content)
}

/// Saves a generated cover letter for the token's owner. Returns the stored
/// letter, or `None` when nothing was saved.
pub async fn save_cover_letter(
    identity: &dyn IdentityProvider,
    store: &dyn EntityStore<CoverLetter>,
    token: Option<&str>,
    request: &GenerationRequest,
    content: &str,
) -> Option<CoverLetter> {
    let Some(token) = token else {
        debug!("Cover letter not saved: no bearer token");
        return None;
    };

    let owner = match identity.resolve(token).await {
        Ok(Some(owner)) => owner,
        Ok(None) => {
            warn!("Cover letter not saved: token does not belong to a user");
            return None;
        }
        Err(e) => {
            error!("Cover letter not saved: identity lookup failed: {e}");
            return None;
        }
    };

    let draft = NewCoverLetter {
        title: format!(
            "Cover Letter for {} at {}",
            request.position(),
            request.company()
        ),
        company_name: request.company().to_string(),
        position_title: request.position().to_string(),
        content: content.to_string(),
        job_description: request.job_description.clone(),
        tone: request.tone(),
        status: STATUS_GENERATED.to_string(),
    };

    match store.insert(owner, draft).await {
        Ok(letter) => {
            info!(letter_id = %letter.id, "Cover letter saved to database");
            Some(letter)
        }
        Err(e) => {
            error!(backend = store.backend(), "Database save error: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::auth::StaticIdentityProvider;
    use crate::state::test_support::ScriptedCompletion;
    use crate::store::MemoryStore;

    fn request(value: serde_json::Value) -> GenerationRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_known_and_unknown_types() {
        assert_eq!(
            GenerationType::parse(Some("job_match")),
            Some(GenerationType::JobMatch)
        );
        assert_eq!(GenerationType::parse(Some("unknown")), None);
        assert_eq!(GenerationType::parse(Some("Cover_Letter")), None);
        assert_eq!(GenerationType::parse(None), None);
    }

    #[test]
    fn test_job_match_embeds_position_and_company() {
        let prompts = build_prompts(
            GenerationType::JobMatch,
            &request(json!({
                "type": "job_match",
                "positionTitle": "Backend Engineer",
                "companyName": "Acme",
                "userProfile": {"skills": ["rust"]}
            })),
        );
        assert!(prompts.user.contains("Position: Backend Engineer at Acme"));
        assert!(prompts.user.contains(r#"Candidate Profile: {"skills":["rust"]}"#));
        assert!(prompts.system.starts_with("You are a career advisor"));
    }

    #[test]
    fn test_missing_fields_render_empty_and_profile_null() {
        let prompts = build_prompts(
            GenerationType::SalaryInsights,
            &request(json!({"type": "salary_insights"})),
        );
        assert!(prompts.user.contains("Position: \nCompany: \nUser Profile: null\n"));
        assert!(prompts.user.contains("Additional Context: \n"));
    }

    #[test]
    fn test_cover_letter_tone_defaults_to_professional() {
        let prompts = build_prompts(
            GenerationType::CoverLetter,
            &request(json!({"type": "cover_letter"})),
        );
        assert!(prompts.system.ends_with("Write in a professional tone."));
        assert!(prompts.user.contains("4. Uses a professional tone throughout"));

        let prompts = build_prompts(
            GenerationType::CoverLetter,
            &request(json!({"type": "cover_letter", "tone": "enthusiastic"})),
        );
        assert!(prompts.system.ends_with("Write in a enthusiastic tone."));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let req = request(json!({
            "type": "motivation",
            "prompt": "third rejection this week"
        }));
        assert_eq!(
            build_prompts(GenerationType::Motivation, &req),
            build_prompts(GenerationType::Motivation, &req)
        );
        assert!(build_prompts(GenerationType::Motivation, &req)
            .user
            .contains("Context: third rejection this week."));
    }

    #[tokio::test]
    async fn test_generate_sends_built_prompts() {
        let backend = ScriptedCompletion::replying("A fine letter");
        let req = request(json!({"type": "cover_letter", "companyName": "Acme"}));

        let content = generate(&backend, GenerationType::CoverLetter, &req)
            .await
            .unwrap();

        assert_eq!(content, "A fine letter");
        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], build_prompts(GenerationType::CoverLetter, &req));
    }

    #[tokio::test]
    async fn test_save_cover_letter_for_known_caller() {
        let user = Uuid::new_v4();
        let identity = StaticIdentityProvider::default().with_user("tok", user);
        let store = MemoryStore::<CoverLetter>::default();
        let req = request(json!({
            "type": "cover_letter",
            "companyName": "Acme",
            "positionTitle": "Engineer",
            "jobDescription": "Build things"
        }));

        let saved = save_cover_letter(&identity, &store, Some("tok"), &req, "Dear Acme")
            .await
            .unwrap();

        assert_eq!(saved.user_id, user);
        assert_eq!(saved.title, "Cover Letter for Engineer at Acme");
        assert_eq!(saved.status, STATUS_GENERATED);
        assert_eq!(saved.tone, "professional");
        assert_eq!(saved.job_description.as_deref(), Some("Build things"));
        assert_eq!(store.list(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_is_skipped_without_a_known_caller() {
        let identity = StaticIdentityProvider::default();
        let store = Arc::new(MemoryStore::<CoverLetter>::default());
        let req = request(json!({"type": "cover_letter"}));

        assert!(save_cover_letter(&identity, store.as_ref(), None, &req, "x")
            .await
            .is_none());
        assert!(save_cover_letter(&identity, store.as_ref(), Some("nobody"), &req, "x")
            .await
            .is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_store_rejection_is_swallowed() {
        let user = Uuid::new_v4();
        let identity = StaticIdentityProvider::default().with_user("tok", user);
        let store = MemoryStore::<CoverLetter>::default();
        let req = request(json!({"type": "cover_letter"}));

        // Blank content fails validation in the store.
        assert!(save_cover_letter(&identity, &store, Some("tok"), &req, "  ")
            .await
            .is_none());
    }
}
