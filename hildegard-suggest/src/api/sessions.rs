//! Wizard session endpoints
//!
//! - `POST /api/sessions` starts a wizard
//! - `GET /api/sessions/:id` renders it
//! - `POST /api/sessions/:id/actions` applies one action
//! - `DELETE /api/sessions/:id` discards it
//!
//! Refused wizard actions still answer 200 with the feedback in the view;
//! only unknown sessions (404) and undecodable actions (400) are errors.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::flow::{self, ActionOutcome, FlowContext, WizardAction, WizardView};
use crate::session::SessionHandle;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub view: WizardView,
}

async fn lookup(state: &AppState, id: Uuid) -> ApiResult<SessionHandle> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::unknown_session(id))
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let (id, handle) = state.sessions.create().await;
    let session = handle.lock().await;
    let view = WizardView::render(&session.wizard, &state.destination, ActionOutcome::default());

    (
        StatusCode::CREATED,
        Json(SessionView {
            session_id: id,
            view,
        }),
    )
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let handle = lookup(&state, id).await?;
    let mut session = handle.lock().await;
    session.touch();

    Ok(Json(SessionView {
        session_id: id,
        view: WizardView::render(&session.wizard, &state.destination, ActionOutcome::default()),
    }))
}

/// POST /api/sessions/:id/actions
pub async fn apply_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<WizardAction>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(action) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let handle = lookup(&state, id).await?;
    let catalog = state.catalog.get().await;

    let mut session = handle.lock().await;
    let ctx = FlowContext {
        catalog: &catalog,
        matcher: state.matcher.as_ref(),
        destination: &state.destination,
    };
    let outcome = flow::apply(&mut session.wizard, action, &ctx).await;
    session.touch();

    Ok(Json(SessionView {
        session_id: id,
        view: WizardView::render(&session.wizard, &state.destination, outcome),
    }))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::unknown_session(id))
    }
}
