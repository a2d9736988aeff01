pub mod dashboard;
pub mod entities;
pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::chat::handlers::handle_chat;
use crate::generation::handlers::handle_generate;
use crate::models::{Contact, CoverLetter, JobApplication, Profile, Skill};
use crate::relay;
use crate::state::AppState;
use crate::store::StoreSlot;

use entities::{
    handle_create, handle_delete, handle_get_profile, handle_list, handle_list_applications,
    handle_update, handle_update_profile,
};

/// `/api/v1/{resource}` and `/api/v1/{resource}/:id` for one entity.
fn crud<E: StoreSlot>(router: Router<AppState>) -> Router<AppState> {
    let collection = format!("/api/v1/{}", E::RESOURCE);
    let record = format!("{collection}/:id");
    router
        .route(&collection, get(handle_list::<E>).post(handle_create::<E>))
        .route(&record, patch(handle_update::<E>).delete(handle_delete::<E>))
}

pub fn build_router(state: AppState) -> Router {
    let router = Router::new().route("/health", get(health::health_handler));

    // Entity API
    let router = crud::<Contact>(router);
    let router = crud::<Skill>(router);
    let router = crud::<CoverLetter>(router);
    let router = crud::<Profile>(router);
    let router = router
        .route(
            "/api/v1/applications",
            get(handle_list_applications).post(handle_create::<JobApplication>),
        )
        .route(
            "/api/v1/applications/:id",
            patch(handle_update::<JobApplication>).delete(handle_delete::<JobApplication>),
        )
        .route(
            "/api/v1/profile",
            get(handle_get_profile).patch(handle_update_profile),
        )
        .route("/api/v1/dashboard", get(dashboard::handle_dashboard));

    // Relays
    router
        .route(
            "/functions/v1/generate-career-content",
            post(handle_generate).options(relay::preflight),
        )
        .route(
            "/functions/v1/chat",
            post(handle_chat).options(relay::preflight),
        )
        .with_state(state)
}
