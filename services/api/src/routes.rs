use crate::infra::{AppState, MemoryListingApi};
use agendate::error::AppError;
use agendate::listings::router::viewer;
use agendate::listings::{listing_router, UserId};
use agendate::profiles::{ProfileError, ProfileForm, ProfileMode};
use agendate::search::{Place, LIMA_CALLAO, MAX_RESULTS, MIN_QUERY_CHARS};
use axum::extract::{Path, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_app_routes(listings: Arc<MemoryListingApi>) -> axum::Router {
    listing_router(listings)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/places", axum::routing::get(places_endpoint))
        .route(
            "/api/v1/profiles/:user_id",
            axum::routing::put(profile_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlacesQuery {
    #[serde(default)]
    pub(crate) q: String,
}

/// Search result row as the location step renders it.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct PlaceView {
    pub(crate) title: String,
    pub(crate) subtitle: String,
    pub(crate) label: String,
    pub(crate) lat: f64,
    pub(crate) lng: f64,
}

impl PlaceView {
    fn from_place(place: &Place) -> Option<Self> {
        let coordinates = place.coordinates?;
        Some(Self {
            title: place.title().to_string(),
            subtitle: place.subtitle(),
            label: place.selection_label(),
            lat: coordinates.lat,
            lng: coordinates.lng,
        })
    }
}

/// One-shot place search. Debouncing belongs to the caller typing the query.
pub(crate) async fn places_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<PlacesQuery>,
) -> Result<Json<Vec<PlaceView>>, AppError> {
    let term = query.q.trim();
    if term.chars().count() < MIN_QUERY_CHARS {
        return Ok(Json(Vec::new()));
    }

    let places = state.geocoder.search(term, LIMA_CALLAO, MAX_RESULTS).await?;
    Ok(Json(
        places
            .iter()
            .filter(|place| place.is_usable())
            .filter_map(PlaceView::from_place)
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileRequest {
    pub(crate) mode: ProfileMode,
    pub(crate) form: ProfileForm,
}

pub(crate) async fn profile_endpoint(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ProfileRequest>,
) -> Response {
    let user = UserId(user_id);
    if viewer(&headers).as_ref() != Some(&user) {
        let payload = json!({ "error": "profiles can only be written by their owner" });
        return (StatusCode::FORBIDDEN, Json(payload)).into_response();
    }

    match state.profiles.save(&user, request.mode, &request.form).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(ProfileError::Invalid(issue)) => {
            let payload = json!({ "error": issue.to_string(), "issue": issue });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}
