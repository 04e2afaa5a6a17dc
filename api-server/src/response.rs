use actix_web::{http::StatusCode, HttpResponse};

use crate::types::ActionRejection;

pub(crate) fn plain_text(status: StatusCode, body: &'static str) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/plain; charset=utf-8")
        .body(body)
}

pub(crate) fn accepted() -> HttpResponse {
    plain_text(StatusCode::ACCEPTED, "accepted")
}

pub(crate) fn rejected(rejection: ActionRejection) -> HttpResponse {
    plain_text(rejection.status(), rejection.code())
}
