//! Owner-scoped CRUD handlers, generic over the entity type.
//!
//! The owner always comes from the caller's token, never from the request body
//! or path. Writes go through a request-scoped [`EntityBinding`], which
//! validates input and reports each outcome through the tracing notifier.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::binding::{EntityBinding, TracingNotifier};
use crate::errors::AppError;
use crate::models::profile::ProfilePatch;
use crate::models::{JobApplication, Profile};
use crate::state::AppState;
use crate::store::StoreSlot;

fn binding_for<E: StoreSlot>(state: &AppState, owner: Uuid) -> EntityBinding<E> {
    EntityBinding::for_owner(E::slot(&state.stores).clone(), Arc::new(TracingNotifier), owner)
}

/// GET /api/v1/{resource}
pub async fn handle_list<E: StoreSlot>(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
) -> Result<Json<Vec<E>>, AppError> {
    let rows = E::slot(&state.stores).list(owner).await?;
    Ok(Json(rows))
}

/// POST /api/v1/{resource}
pub async fn handle_create<E: StoreSlot>(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Json(draft): Json<E::Draft>,
) -> Result<(StatusCode, Json<E>), AppError> {
    let record = binding_for::<E>(&state, owner).create(draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /api/v1/{resource}/:id
pub async fn handle_update<E: StoreSlot>(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<E::Patch>,
) -> Result<Json<E>, AppError> {
    let record = binding_for::<E>(&state, owner).update(id, patch).await?;
    Ok(Json(record))
}

/// DELETE /api/v1/{resource}/:id
pub async fn handle_delete<E: StoreSlot>(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    binding_for::<E>(&state, owner).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

/// GET /api/v1/applications?status=<s>
///
/// An unrecognised status matches nothing rather than falling back to `applied`.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<JobApplication>>, AppError> {
    let mut rows = state.stores.applications.list(owner).await?;
    if let Some(wanted) = filter.status.map(|s| s.trim().to_ascii_lowercase()) {
        if !wanted.is_empty() && wanted != "all" {
            rows.retain(|a| a.status.as_str() == wanted);
        }
    }
    Ok(Json(rows))
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
) -> Result<Json<Profile>, AppError> {
    state
        .stores
        .profiles
        .list(owner)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

/// PATCH /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Profile>, AppError> {
    // A profile's id is its owner.
    let profile = binding_for::<Profile>(&state, owner).update(owner, patch).await?;
    Ok(Json(profile))
}
