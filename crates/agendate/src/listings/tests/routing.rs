use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::backend::memory::{InMemoryListingStore, InMemoryObjectStorage};
use crate::links::DEFAULT_CONTACT_PHONE;
use crate::listings::{
    listing_router, FieldUpdate, ListingApi, ListingService, OperationType, PhotoRef,
    SessionError, SubmissionRules, WizardAction, WizardPhase, USER_HEADER,
};

type MemoryApi = ListingApi<InMemoryListingStore, InMemoryObjectStorage>;

fn api() -> (Arc<MemoryApi>, Arc<InMemoryListingStore>) {
    let (service, store, _) = memory_service();
    (Arc::new(ListingApi::new(service, DEFAULT_CONTACT_PHONE)), store)
}

fn router(api: &Arc<MemoryApi>) -> Router {
    listing_router(api.clone())
}

async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn post_json(uri: &str, user: Option<&str>, payload: &impl serde::Serialize) -> Request<Body> {
    let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        request = request.header(USER_HEADER, user);
    }
    request
        .body(Body::from(serde_json::to_vec(payload).expect("serialize payload")))
        .expect("request builds")
}

fn seed(store: &InMemoryListingStore) {
    store.insert_document(
        "venta-1",
        json!({ "tipo": "Venta", "titulo": "Casa Bonita", "userId": "owner-1",
                "lat": -12.1211, "lng": -77.0297, "precio": "150000", "moneda": "$" }),
    );
    store.insert_document(
        "alquiler-1",
        json!({ "tipo": "Alquiler", "titulo": "Depa Surco", "userId": "someone" }),
    );
}

#[tokio::test]
async fn feed_route_filters_by_operation() {
    let (api, store) = api();
    seed(&store);

    let response = router(&api)
        .oneshot(
            Request::get("/api/v1/listings?operation=rental")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let cards = read_json_body(response).await;
    let cards = cards.as_array().expect("array of cards");
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["title"], "Depa Surco");

    let response = router(&api)
        .oneshot(
            Request::get("/api/v1/listings")
                .header(USER_HEADER, "owner-1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let cards = read_json_body(response).await;
    assert_eq!(cards[0]["title"], "Casa Bonita");
    assert_eq!(cards[0]["owned"], true);
}

#[tokio::test]
async fn detail_route_offers_contact_to_visitors() {
    let (api, store) = api();
    seed(&store);

    let response = router(&api)
        .oneshot(
            Request::get("/api/v1/listings/venta-1")
                .header(USER_HEADER, "visitor")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["price"], "$ 150000");
    assert_eq!(payload["action"]["kind"], "contact");
    assert!(payload["map"]["uri"]
        .as_str()
        .is_some_and(|uri| uri.starts_with("geo:-12.1211,-77.0297")));

    let missing = router(&api)
        .oneshot(
            Request::get("/api/v1/listings/nope")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_route_maps_ownership_to_status() {
    let (api, store) = api();
    seed(&store);

    let delete = |user: Option<&'static str>| {
        let mut request = Request::delete("/api/v1/listings/venta-1");
        if let Some(user) = user {
            request = request.header(USER_HEADER, user);
        }
        request.body(Body::empty()).expect("request builds")
    };

    let anonymous = router(&api).oneshot(delete(None)).await.expect("route executes");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let stranger = router(&api)
        .oneshot(delete(Some("someone")))
        .await
        .expect("route executes");
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);

    let owner = router(&api)
        .oneshot(delete(Some("owner-1")))
        .await
        .expect("route executes");
    assert_eq!(owner.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.len(), 1);

    let again = router(&api)
        .oneshot(delete(Some("owner-1")))
        .await
        .expect("route executes");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wizard_session_publishes_over_http() {
    let (api, store) = api();

    let response = router(&api)
        .oneshot(post_json(
            "/api/v1/wizard/sessions",
            None,
            &json!({ "operation": "Venta" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    let session_id = created["session_id"].as_str().expect("session id").to_string();
    let actions_uri = format!("/api/v1/wizard/sessions/{session_id}/actions");

    let blocked = router(&api)
        .oneshot(post_json(
            &actions_uri,
            None,
            &json!({ "type": "go_next" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(blocked.status(), StatusCode::OK, "category step always advances");

    let incomplete = router(&api)
        .oneshot(post_json(&actions_uri, None, &WizardAction::GoNext))
        .await
        .expect("route executes");
    assert_eq!(incomplete.status(), StatusCode::UNPROCESSABLE_ENTITY);

    for action in [
        set(FieldUpdate::Location(miraflores())),
        WizardAction::GoNext,
        set(FieldUpdate::Title("Casa Bonita".to_string())),
        set(FieldUpdate::Price("150000".to_string())),
        set(FieldUpdate::Area("120".to_string())),
        WizardAction::GoNext,
        set(FieldUpdate::Gallery(vec![PhotoRef::new("content://1")])),
    ] {
        let response = router(&api)
            .oneshot(post_json(&actions_uri, None, &action))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let anonymous_submit = router(&api)
        .oneshot(post_json(&actions_uri, None, &WizardAction::Submit))
        .await
        .expect("route executes");
    assert_eq!(anonymous_submit.status(), StatusCode::UNAUTHORIZED);

    let published = router(&api)
        .oneshot(post_json(&actions_uri, Some("owner-1"), &WizardAction::Submit))
        .await
        .expect("route executes");
    assert_eq!(published.status(), StatusCode::OK);
    let state = read_json_body(published).await;
    assert_eq!(state["phase"]["phase"], "published");
    assert_eq!(store.len(), 1);

    assert!(api.session(&session_id).is_none(), "published sessions are closed");
    let closed = router(&api)
        .oneshot(
            Request::get(format!("/api/v1/wizard/sessions/{session_id}"))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(closed.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn exited_sessions_are_released() {
    let (api, _) = api();
    let ids: Vec<String> = (0..25)
        .map(|_| api.open_session(OperationType::Sale).0)
        .collect();
    assert_eq!(api.open_sessions(), 25);

    for id in &ids {
        api.dispatch(id, None, WizardAction::GoBack)
            .await
            .expect("session exists");
        let last = api
            .dispatch(id, None, WizardAction::ConfirmExit)
            .await
            .expect("session exists");
        assert_eq!(last.phase, WizardPhase::Exited);
    }
    assert_eq!(api.open_sessions(), 0);

    let err = api
        .dispatch(&ids[0], None, WizardAction::CancelExit)
        .await
        .expect_err("closed session");
    assert!(matches!(err, SessionError::NotFound));
}

#[tokio::test]
async fn duplicate_submission_returns_conflict_and_keeps_draft() {
    let (api, store) = api();
    let pin = miraflores();
    store.insert_document("existing", json!({ "lat": pin.lat, "lng": pin.lng }));

    let (session_id, _) = api.open_session(OperationType::Sale);
    let ready = ready_state();
    for action in [
        WizardAction::GoNext,
        set(FieldUpdate::Location(miraflores())),
        WizardAction::GoNext,
        set(FieldUpdate::Title(ready.draft.title.clone())),
        set(FieldUpdate::Price(ready.draft.price.clone())),
        set(FieldUpdate::Area(ready.draft.area.clone())),
        WizardAction::GoNext,
        set(FieldUpdate::Gallery(ready.draft.gallery.clone())),
    ] {
        api.dispatch(&session_id, None, action)
            .await
            .expect("session exists");
    }

    let response = router(&api)
        .oneshot(post_json(
            &format!("/api/v1/wizard/sessions/{session_id}/actions"),
            Some("owner-1"),
            &WizardAction::Submit,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let session = api.session(&session_id).expect("session kept");
    assert_eq!(session.draft, ready.draft);
    assert_eq!(session.phase, WizardPhase::Editing);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn clients_cannot_forge_submission_outcomes() {
    let (api, _) = api();
    let (session_id, _) = api.open_session(OperationType::Rental);

    let err = api
        .dispatch(
            &session_id,
            Some(&owner()),
            WizardAction::SubmissionSucceeded(crate::listings::ListingId("forged".to_string())),
        )
        .await
        .expect_err("reserved action");
    assert!(matches!(err, SessionError::ReservedAction));

    let response = router(&api)
        .oneshot(
            Request::get("/api/v1/wizard/sessions/unknown")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn strict_numeric_policy_surfaces_as_unprocessable() {
    let store = Arc::new(InMemoryListingStore::default());
    let service = ListingService::new(
        store.clone(),
        Arc::new(InMemoryObjectStorage::default()),
        SubmissionRules::default(),
    );
    let api = Arc::new(ListingApi::new(service, DEFAULT_CONTACT_PHONE));
    let (session_id, _) = api.open_session(OperationType::Sale);

    for action in [
        WizardAction::GoNext,
        set(FieldUpdate::Location(miraflores())),
        WizardAction::GoNext,
        set(FieldUpdate::Title("Casa".to_string())),
        set(FieldUpdate::Price("a tratar".to_string())),
        set(FieldUpdate::Area("120".to_string())),
        WizardAction::GoNext,
        set(FieldUpdate::Gallery(vec![PhotoRef::new("content://1")])),
    ] {
        api.dispatch(&session_id, None, action)
            .await
            .expect("session exists");
    }

    let response = router(&api)
        .oneshot(post_json(
            &format!("/api/v1/wizard/sessions/{session_id}/actions"),
            Some("owner-1"),
            &WizardAction::Submit,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let state = read_json_body(response).await;
    assert_eq!(state["notice"]["detail"], "non_numeric_price");
    assert!(store.is_empty());
}
