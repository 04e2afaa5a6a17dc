use actix_web::{
    web::{Bytes, Data},
    HttpRequest, HttpResponse, Responder,
};

use crate::auth::is_request_authorized;
use crate::response::{accepted, rejected};
use crate::types::{ActionCommand, ActionRejection, HealthResponse};
use crate::AppState;

pub(crate) async fn action(
    state: Data<AppState>,
    req: HttpRequest,
    body: Result<Bytes, actix_web::Error>,
) -> HttpResponse {
    if !is_request_authorized(req.headers(), state.expected_token.as_deref()) {
        return rejected(ActionRejection::InvalidToken);
    }

    let body = match body {
        Ok(body) => body,
        Err(err) => {
            tracing::error!("failed to read action body: {err}");
            return rejected(ActionRejection::Internal);
        }
    };

    let command = match ActionCommand::decode(&body) {
        Ok(command) => command,
        Err(rejection) => {
            tracing::debug!(code = rejection.code(), "action rejected");
            return rejected(rejection);
        }
    };

    match state.executor.submit(command) {
        Ok(request_id) => {
            tracing::info!(
                request_id = %request_id,
                kind = %command.kind,
                target_id = ?command.target_id,
                "action accepted"
            );
            accepted()
        }
        Err(err) => {
            tracing::error!(kind = %command.kind, "action dispatch failed: {err}");
            rejected(ActionRejection::Internal)
        }
    }
}

pub(crate) async fn method_not_allowed() -> impl Responder {
    rejected(ActionRejection::MethodNotAllowed)
}

pub(crate) async fn health(state: Data<AppState>, req: HttpRequest) -> HttpResponse {
    if !is_request_authorized(req.headers(), state.expected_token.as_deref()) {
        return rejected(ActionRejection::InvalidToken);
    }

    let display = state.display.load();
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        service: "telemetry-bridge",
        pending_commands: state.executor.pending(),
        auth_required: state.expected_token.is_some(),
        nearby_count: display.count,
        nearest_distance: display.nearest_distance(),
        recommendation: display.recommendation().as_str(),
    })
}
