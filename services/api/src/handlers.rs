//! Axum Handlers for the REST API
//!
//! Each handler drives the shared [`ProgressController`](rise_core::ProgressController)
//! and returns a view from [`crate::models`]. `utoipa` attributes generate the
//! OpenAPI documentation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use rise_core::{
    ControllerError,
    accreditation::{AccreditationSummary, Certificate},
    curriculum::{self, RISE_PROTOCOL},
    learner::LearnerProfile,
    library,
    standing::Standing,
};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    models::{
        AccreditationView, CertificateView, CurriculumView, EnrollPayload, ErrorResponse,
        LearnerView, LibraryPromptView, LibraryQuery, ModuleStatusView, NavigatePayload,
        ProtocolStepView, SendMessagePayload, SessionView, SignInPayload, StandingView,
        TurnResponse, VerifyPayload,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::BadGateway(message) => {
                warn!("Generation provider error: {}", message);
                (StatusCode::BAD_GATEWAY, message)
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        let message = err.to_string();
        match err {
            ControllerError::Validation(_) => Self::BadRequest(message),
            ControllerError::NotSignedIn => Self::Unauthorized(message),
            ControllerError::Forbidden => Self::Forbidden(message),
            ControllerError::UnknownModule(_) => Self::NotFound(message),
            ControllerError::Locked(_) | ControllerError::Busy => Self::Conflict(message),
            ControllerError::Generation(_) => Self::BadGateway(message),
            ControllerError::Storage(e) => Self::InternalServerError(e),
        }
    }
}

async fn require_learner(state: &AppState) -> Result<LearnerProfile, ApiError> {
    state
        .controller
        .current_learner()
        .await
        .ok_or_else(|| ControllerError::NotSignedIn.into())
}

async fn session_view(state: &AppState) -> SessionView {
    (&state.controller.snapshot().await).into()
}

// --- Authentication ---

/// Submit sign-in credentials. A verification code is then required.
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    request_body = SignInPayload,
    responses(
        (status = 202, description = "Credentials accepted; awaiting verification code", body = SessionView),
        (status = 400, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignInPayload>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .controller
        .begin_sign_in(&payload.name, &payload.email, payload.profession)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(session_view(&state).await)))
}

/// Verify the code and complete sign-in (or sign-up for a new email).
#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyPayload,
    responses(
        (status = 200, description = "Signed in", body = SessionView),
        (status = 400, description = "Invalid or unexpected verification code", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyPayload>,
) -> Result<Json<SessionView>, ApiError> {
    state.controller.verify(&payload.code).await?;
    Ok(Json(session_view(&state).await))
}

/// Sign out and clear the session.
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    responses(
        (status = 204, description = "Signed out"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn sign_out(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.controller.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Session ---

/// Get the current session state for rendering.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session", body = SessionView))
)]
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(session_view(&state).await)
}

/// Switch to another view. Selecting the dashboard abandons a live module.
#[utoipa::path(
    post,
    path = "/session/navigate",
    request_body = NavigatePayload,
    responses(
        (status = 200, description = "Navigated", body = SessionView),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn navigate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NavigatePayload>,
) -> Result<Json<SessionView>, ApiError> {
    state.controller.navigate(payload.tab).await?;
    Ok(Json(session_view(&state).await))
}

/// Clear the pending error message.
#[utoipa::path(
    post,
    path = "/session/dismiss-error",
    responses((status = 200, description = "Error cleared", body = SessionView))
)]
pub async fn dismiss_error(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    state.controller.dismiss_error().await;
    Json(session_view(&state).await)
}

// --- Curriculum & conversation ---

/// List all modules with their availability for the signed-in learner.
#[utoipa::path(
    get,
    path = "/curriculum",
    responses((status = 200, description = "Curriculum with progress", body = CurriculumView))
)]
pub async fn get_curriculum(State(state): State<Arc<AppState>>) -> Json<CurriculumView> {
    let completed = state
        .controller
        .current_learner()
        .await
        .map(|l| l.completed_set())
        .unwrap_or_default();
    Json(CurriculumView {
        progress_percent: curriculum::progress_percent(&completed),
        next_unlocked: curriculum::next_unlocked(&completed).map(|m| m.id),
        modules: curriculum::module_statuses(&completed)
            .iter()
            .map(ModuleStatusView::from)
            .collect(),
    })
}

/// Start a module and receive the proctor's introduction.
#[utoipa::path(
    post,
    path = "/modules/{id}/launch",
    responses(
        (status = 200, description = "Module launched", body = TurnResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 404, description = "Unknown module", body = ErrorResponse),
        (status = 409, description = "Module locked or another module in progress", body = ErrorResponse),
        (status = 502, description = "Generation provider failed", body = ErrorResponse)
    ),
    params(("id" = u32, Path, description = "Module ID (1-16)"))
)]
pub async fn launch_module(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<TurnResponse>, ApiError> {
    let outcome = state.controller.launch(id).await?;
    let snap = state.controller.snapshot().await;
    Ok(Json(TurnResponse::new(outcome, &snap)))
}

/// Open the archived transcript of a completed module.
#[utoipa::path(
    post,
    path = "/modules/{id}/review",
    responses(
        (status = 200, description = "Review mode entered", body = SessionView),
        (status = 404, description = "No stored result for this module", body = ErrorResponse),
        (status = 409, description = "A module is in progress", body = ErrorResponse)
    ),
    params(("id" = u32, Path, description = "Module ID (1-16)"))
)]
pub async fn review_module(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<SessionView>, ApiError> {
    if !state.controller.review(id).await? {
        return Err(ApiError::NotFound(format!(
            "No stored result for module {}",
            id
        )));
    }
    Ok(Json(session_view(&state).await))
}

/// Send the learner's reply (typed text or a chosen option) to the proctor.
#[utoipa::path(
    post,
    path = "/messages",
    request_body = SendMessagePayload,
    responses(
        (status = 200, description = "Turn processed", body = TurnResponse),
        (status = 502, description = "Generation provider failed", body = ErrorResponse)
    )
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Json<TurnResponse>, ApiError> {
    let outcome = state.controller.send_message(&payload.text).await?;
    let snap = state.controller.snapshot().await;
    Ok(Json(TurnResponse::new(outcome, &snap)))
}

/// The RISE operating procedure.
#[utoipa::path(
    get,
    path = "/protocol",
    responses((status = 200, description = "RISE steps", body = [ProtocolStepView]))
)]
pub async fn get_protocol() -> Json<Vec<ProtocolStepView>> {
    Json(RISE_PROTOCOL.iter().map(Into::into).collect())
}

// --- Derived views ---

/// Search the prompt treasury for the learner's profession.
#[utoipa::path(
    get,
    path = "/library",
    params(LibraryQuery),
    responses(
        (status = 200, description = "Matching prompts", body = [LibraryPromptView]),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn get_library(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LibraryQuery>,
) -> Result<Json<Vec<LibraryPromptView>>, ApiError> {
    let learner = require_learner(&state).await?;
    let prompts = library::search(learner.profession, query.q.as_deref().unwrap_or(""));
    Ok(Json(prompts.into_iter().map(Into::into).collect()))
}

/// CPD points and the accrediting body for the learner's profession.
#[utoipa::path(
    get,
    path = "/accreditation",
    responses(
        (status = 200, description = "Accreditation summary", body = AccreditationView),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn get_accreditation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AccreditationView>, ApiError> {
    let learner = require_learner(&state).await?;
    Ok(Json(AccreditationSummary::for_learner(&learner).into()))
}

/// Draft a certificate of mastery with a fresh verification hash.
#[utoipa::path(
    post,
    path = "/accreditation/certificate",
    responses(
        (status = 201, description = "Certificate drafted", body = CertificateView),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn draft_certificate(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let learner = require_learner(&state).await?;
    let certificate = Certificate::draft(&learner, Utc::now());
    Ok((StatusCode::CREATED, Json(CertificateView::from(certificate))))
}

/// Mastery rank, training time and internalization analytics.
#[utoipa::path(
    get,
    path = "/standing",
    responses(
        (status = 200, description = "Learner standing", body = StandingView),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn get_standing(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StandingView>, ApiError> {
    let learner = require_learner(&state).await?;
    Ok(Json(Standing::from_badges(learner.badge_count()).into()))
}

// --- Administration ---

/// List every learner on the roster.
#[utoipa::path(
    get,
    path = "/admin/learners",
    responses(
        (status = 200, description = "All learners", body = [LearnerView]),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
pub async fn list_learners(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LearnerView>>, ApiError> {
    let learners = state.controller.list_learners().await?;
    Ok(Json(learners.iter().map(Into::into).collect()))
}

/// Enroll a new learner with the standard role.
#[utoipa::path(
    post,
    path = "/admin/learners",
    request_body = EnrollPayload,
    responses(
        (status = 201, description = "Learner enrolled", body = LearnerView),
        (status = 400, description = "Invalid learner details", body = ErrorResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
pub async fn enroll_learner(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EnrollPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let learner = state
        .controller
        .enroll_learner(&payload.name, &payload.email, payload.profession)
        .await?;
    Ok((StatusCode::CREATED, Json(LearnerView::from(&learner))))
}

/// Remove a learner and all of their results.
#[utoipa::path(
    delete,
    path = "/admin/learners/{id}",
    responses(
        (status = 204, description = "Learner deleted"),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Learner not found", body = ErrorResponse)
    ),
    params(("id" = Uuid, Path, description = "Learner ID"))
)]
pub async fn delete_learner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.controller.delete_learner(id).await? {
        return Err(ApiError::NotFound(format!(
            "Learner with id '{}' not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
