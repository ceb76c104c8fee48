use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::domain::{ListingId, OperationType, UserId};
use super::feed::{FeedFilter, ListingCard, ListingFeed};
use super::service::{ListingService, ListingServiceError};
use super::wizard::{reduce, Notice, WizardAction, WizardEffect, WizardState};
use crate::backend::{ListingStore, ObjectStorage, StoreError};
use crate::links::{map_link, DetailAction};

/// Header carrying the authenticated user id, set by the gateway in front of the service.
pub const USER_HEADER: &str = "x-user-id";

/// Listing service plus the in-flight wizard sessions driven over HTTP.
pub struct ListingApi<S, O> {
    service: ListingService<S, O>,
    sessions: Mutex<HashMap<String, WizardState>>,
    contact_phone: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("wizard session not found")]
    NotFound,
    #[error("submission outcomes are produced by the server")]
    ReservedAction,
    #[error("submitting requires the x-user-id header")]
    Unauthenticated,
}

impl<S, O> ListingApi<S, O>
where
    S: ListingStore + 'static,
    O: ObjectStorage + 'static,
{
    pub fn new(service: ListingService<S, O>, contact_phone: impl Into<String>) -> Self {
        Self {
            service,
            sessions: Mutex::new(HashMap::new()),
            contact_phone: contact_phone.into(),
        }
    }

    pub fn service(&self) -> &ListingService<S, O> {
        &self.service
    }

    pub fn open_session(&self, operation: OperationType) -> (String, WizardState) {
        let id = Uuid::new_v4().to_string();
        let state = WizardState::new(operation);
        self.sessions().insert(id.clone(), state.clone());
        (id, state)
    }

    pub fn session(&self, id: &str) -> Option<WizardState> {
        self.sessions().get(id).cloned()
    }

    /// Apply a client action. A submit publishes before returning, and the session
    /// stays in `Submitting` meanwhile so concurrent submits are ignored.
    ///
    /// A session that ends (exited or published) is dropped; its final state is returned.
    pub async fn dispatch(
        &self,
        id: &str,
        actor: Option<&UserId>,
        action: WizardAction,
    ) -> Result<WizardState, SessionError> {
        if matches!(
            action,
            WizardAction::SubmissionSucceeded(_) | WizardAction::SubmissionFailed(_)
        ) {
            return Err(SessionError::ReservedAction);
        }
        let owner = match (&action, actor) {
            (WizardAction::Submit, None) => return Err(SessionError::Unauthenticated),
            (_, actor) => actor.cloned(),
        };

        let transition = {
            let mut sessions = self.sessions();
            let current = sessions.get(id).ok_or(SessionError::NotFound)?;
            let transition = reduce(current, action);
            Self::retain(&mut sessions, id, &transition.state);
            transition
        };

        let (Some(WizardEffect::Publish(draft)), Some(owner)) = (transition.effect, owner)
        else {
            return Ok(transition.state);
        };

        let outcome = match self.service.publish(&owner, &draft).await {
            Ok(listing) => WizardAction::SubmissionSucceeded(listing.id),
            Err(err) => {
                debug!(session = id, error = %err, "wizard session submission aborted");
                WizardAction::SubmissionFailed(err.notice())
            }
        };
        let next = reduce(&transition.state, outcome).state;
        Self::retain(&mut self.sessions(), id, &next);
        Ok(next)
    }

    /// Number of sessions still in progress.
    pub fn open_sessions(&self) -> usize {
        self.sessions().len()
    }

    fn retain(sessions: &mut HashMap<String, WizardState>, id: &str, state: &WizardState) {
        if state.is_finished() {
            sessions.remove(id);
            debug!(session = id, phase = ?state.phase, "wizard session closed");
        } else {
            sessions.insert(id.to_string(), state.clone());
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, WizardState>> {
        self.sessions
            .lock()
            .expect("wizard sessions mutex poisoned")
    }
}

/// Router exposing the feed, listing detail and delete, and wizard sessions.
pub fn listing_router<S, O>(api: Arc<ListingApi<S, O>>) -> Router
where
    S: ListingStore + 'static,
    O: ObjectStorage + 'static,
{
    Router::new()
        .route("/api/v1/listings", get(list_handler::<S, O>))
        .route(
            "/api/v1/listings/:listing_id",
            get(detail_handler::<S, O>).delete(delete_handler::<S, O>),
        )
        .route("/api/v1/wizard/sessions", post(open_session_handler::<S, O>))
        .route(
            "/api/v1/wizard/sessions/:session_id",
            get(session_handler::<S, O>),
        )
        .route(
            "/api/v1/wizard/sessions/:session_id/actions",
            post(action_handler::<S, O>),
        )
        .with_state(api)
}

pub fn viewer(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UserId(value.to_string()))
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": message.to_string() }))).into_response()
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum OperationParam {
    Sale,
    Rental,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingQuery {
    pub(crate) operation: Option<OperationParam>,
}

pub(crate) async fn list_handler<S, O>(
    State(api): State<Arc<ListingApi<S, O>>>,
    Query(query): Query<ListingQuery>,
    headers: HeaderMap,
) -> Response
where
    S: ListingStore + 'static,
    O: ObjectStorage + 'static,
{
    let filter = match query.operation {
        Some(OperationParam::Rental) => FeedFilter::Rent,
        Some(OperationParam::Sale) | None => FeedFilter::Buy,
    };
    let mut feed = ListingFeed::new(filter);
    feed.sync(&mut api.service.store().subscribe());

    let viewer = viewer(&headers);
    let cards: Vec<ListingCard> = feed
        .visible()
        .into_iter()
        .map(|listing| ListingCard::from_listing(listing, viewer.as_ref()))
        .collect();
    (StatusCode::OK, Json(cards)).into_response()
}

pub(crate) async fn detail_handler<S, O>(
    State(api): State<Arc<ListingApi<S, O>>>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: ListingStore + 'static,
    O: ObjectStorage + 'static,
{
    let id = ListingId(listing_id);
    match api.service.store().fetch(&id).await {
        Ok(Some(listing)) => {
            let viewer = viewer(&headers);
            let payload = json!({
                "listing": listing,
                "gallery": listing.gallery(),
                "price": listing.price_label(),
                "map": map_link(&listing),
                "action": DetailAction::for_viewer(&listing, viewer.as_ref(), &api.contact_phone),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, ListingServiceError::NotFound),
        Err(err) => error_response(StatusCode::BAD_GATEWAY, err),
    }
}

pub(crate) async fn delete_handler<S, O>(
    State(api): State<Arc<ListingApi<S, O>>>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: ListingStore + 'static,
    O: ObjectStorage + 'static,
{
    let Some(actor) = viewer(&headers) else {
        return error_response(
            StatusCode::UNAUTHORIZED,
            format!("missing {USER_HEADER} header"),
        );
    };
    match api.service.delete(&actor, &ListingId(listing_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(ListingServiceError::Forbidden) => {
            error_response(StatusCode::FORBIDDEN, ListingServiceError::Forbidden)
        }
        Err(ListingServiceError::NotFound | ListingServiceError::Store(StoreError::NotFound)) => {
            error_response(StatusCode::NOT_FOUND, ListingServiceError::NotFound)
        }
        Err(other) => error_response(StatusCode::BAD_GATEWAY, other),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenSession {
    pub(crate) operation: OperationType,
}

pub(crate) async fn open_session_handler<S, O>(
    State(api): State<Arc<ListingApi<S, O>>>,
    Json(request): Json<OpenSession>,
) -> Response
where
    S: ListingStore + 'static,
    O: ObjectStorage + 'static,
{
    let (session_id, state) = api.open_session(request.operation);
    (
        StatusCode::CREATED,
        Json(json!({ "session_id": session_id, "state": state })),
    )
        .into_response()
}

pub(crate) async fn session_handler<S, O>(
    State(api): State<Arc<ListingApi<S, O>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: ListingStore + 'static,
    O: ObjectStorage + 'static,
{
    match api.session(&session_id) {
        Some(state) => (StatusCode::OK, Json(state)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, SessionError::NotFound),
    }
}

pub(crate) async fn action_handler<S, O>(
    State(api): State<Arc<ListingApi<S, O>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(action): Json<WizardAction>,
) -> Response
where
    S: ListingStore + 'static,
    O: ObjectStorage + 'static,
{
    let actor = viewer(&headers);
    match api.dispatch(&session_id, actor.as_ref(), action).await {
        Ok(state) => {
            let status = match &state.notice {
                Some(Notice::Incomplete(_)) => StatusCode::UNPROCESSABLE_ENTITY,
                Some(Notice::Duplicate) => StatusCode::CONFLICT,
                Some(Notice::SubmissionFailed(_)) => StatusCode::BAD_GATEWAY,
                Some(Notice::Published) | None => StatusCode::OK,
            };
            (status, Json(state)).into_response()
        }
        Err(SessionError::NotFound) => {
            error_response(StatusCode::NOT_FOUND, SessionError::NotFound)
        }
        Err(SessionError::Unauthenticated) => {
            error_response(StatusCode::UNAUTHORIZED, SessionError::Unauthenticated)
        }
        Err(SessionError::ReservedAction) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, SessionError::ReservedAction)
        }
    }
}
