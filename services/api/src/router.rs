//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        AccreditationView, AnalyticsView, CertificateView, CurriculumView, EnrollPayload,
        ErrorResponse, LearnerView, LibraryPromptView, MessageView, ModuleResultView,
        ModuleStatusView, ModuleView, NavigatePayload, ProtocolStepView, SendMessagePayload,
        SessionView, SignInPayload, StandingView, TurnResponse, VerifyPayload,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::sign_in,
        handlers::verify,
        handlers::sign_out,
        handlers::get_session,
        handlers::navigate,
        handlers::dismiss_error,
        handlers::get_curriculum,
        handlers::launch_module,
        handlers::review_module,
        handlers::send_message,
        handlers::get_protocol,
        handlers::get_library,
        handlers::get_accreditation,
        handlers::draft_certificate,
        handlers::get_standing,
        handlers::list_learners,
        handlers::enroll_learner,
        handlers::delete_learner,
    ),
    components(
        schemas(
            SignInPayload, VerifyPayload, NavigatePayload, SendMessagePayload, EnrollPayload,
            SessionView, MessageView, LearnerView, ModuleResultView, ModuleView, ModuleStatusView,
            CurriculumView, ProtocolStepView, TurnResponse, LibraryPromptView, AccreditationView,
            CertificateView, StandingView, AnalyticsView, ErrorResponse
        )
    ),
    tags(
        (name = "RISE API", description = "Module progression and certification for the RISE mastery lab")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route("/auth/sign-in", post(handlers::sign_in))
        .route("/auth/verify", post(handlers::verify))
        .route("/auth/sign-out", post(handlers::sign_out))
        .route("/session", get(handlers::get_session))
        .route("/session/navigate", post(handlers::navigate))
        .route("/session/dismiss-error", post(handlers::dismiss_error))
        .route("/curriculum", get(handlers::get_curriculum))
        .route("/modules/{id}/launch", post(handlers::launch_module))
        .route("/modules/{id}/review", post(handlers::review_module))
        .route("/messages", post(handlers::send_message))
        .route("/protocol", get(handlers::get_protocol))
        .route("/library", get(handlers::get_library))
        .route("/accreditation", get(handlers::get_accreditation))
        .route(
            "/accreditation/certificate",
            post(handlers::draft_certificate),
        )
        .route("/standing", get(handlers::get_standing))
        .route(
            "/admin/learners",
            get(handlers::list_learners).post(handlers::enroll_learner),
        )
        .route("/admin/learners/{id}", delete(handlers::delete_learner))
        // Apply the state ONLY to this group of routes.
        .with_state(app_state);

    // Create the final router that merges the stateful routes
    // with the stateless routes (like Swagger UI).
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
