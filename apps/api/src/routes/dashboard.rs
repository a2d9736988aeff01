use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::binding::{EntityBinding, Notification, NotificationLog, Notifier};
use crate::errors::AppError;
use crate::models::{ApplicationStatus, Profile};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub applications: usize,
    pub contacts: usize,
    pub skills: usize,
    pub cover_letters: usize,
    pub applications_by_status: BTreeMap<&'static str, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    /// Load failures, one per collection that could not be fetched.
    pub notices: Vec<Notification>,
}

/// GET /api/v1/dashboard
///
/// Loads every collection through a binding bound to the caller. A collection
/// that fails to load counts as empty and shows up in `notices`.
pub async fn handle_dashboard(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
) -> Result<Json<DashboardSummary>, AppError> {
    let log = Arc::new(NotificationLog::default());
    let notifier: Arc<dyn Notifier> = log.clone();

    let applications = EntityBinding::new(state.stores.applications.clone(), notifier.clone());
    let contacts = EntityBinding::new(state.stores.contacts.clone(), notifier.clone());
    let skills = EntityBinding::new(state.stores.skills.clone(), notifier.clone());
    let cover_letters = EntityBinding::new(state.stores.cover_letters.clone(), notifier.clone());
    let profiles = EntityBinding::new(state.stores.profiles.clone(), notifier);

    tokio::join!(
        applications.set_identity(Some(owner)),
        contacts.set_identity(Some(owner)),
        skills.set_identity(Some(owner)),
        cover_letters.set_identity(Some(owner)),
        profiles.set_identity(Some(owner)),
    );

    let applications = applications.items().await;
    let mut applications_by_status: BTreeMap<&'static str, usize> = ApplicationStatus::ALL
        .iter()
        .map(|s| (s.as_str(), 0))
        .collect();
    for application in &applications {
        *applications_by_status
            .entry(application.status.as_str())
            .or_default() += 1;
    }

    Ok(Json(DashboardSummary {
        applications: applications.len(),
        contacts: contacts.items().await.len(),
        skills: skills.items().await.len(),
        cover_letters: cover_letters.items().await.len(),
        applications_by_status,
        profile: profiles.items().await.into_iter().next(),
        notices: log.errors(),
    }))
}
