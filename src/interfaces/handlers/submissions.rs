use actix_web::{
    http::header::{HeaderName, HeaderValue, RETRY_AFTER},
    web, HttpRequest, HttpResponse, Responder, ResponseError,
};
use tracing::instrument;

use crate::{
    entities::submission::{
        ContactFormRequest, OnboardingRequest, SubmissionFilter, SubmissionListQuery, UpdateSubmissionStatusRequest,
    },
    errors::AppError,
    limiter::RateLimitDecision,
    use_cases::extractors::AdminClaims,
    utils::{get_client_ip::get_client_ip, valid_uuid::valid_uuid},
    AppState,
};

/// Charges the caller's IP against the submission limiter. `Err` carries the
/// ready-made 429 response.
fn check_rate_limit(req: &HttpRequest, state: &AppState) -> Result<String, HttpResponse> {
    let ip = get_client_ip(req, state.config.trust_x_forwarded_for);
    let decision = state.submission_limiter.check(&ip);

    if decision.allowed {
        return Ok(ip);
    }

    tracing::warn!(ip = %ip, path = %req.path(), "Submission rate limit exceeded");
    Err(too_many_requests(&decision))
}

fn too_many_requests(decision: &RateLimitDecision) -> HttpResponse {
    let mut response = AppError::TooManyRequests("Too many submissions. Please try again later.".into())
        .error_response();

    let headers = response.headers_mut();
    if let Some(retry_after) = decision.retry_after {
        headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
    }
    headers.insert(HeaderName::from_static("x-ratelimit-limit"), HeaderValue::from(decision.limit));
    headers.insert(HeaderName::from_static("x-ratelimit-remaining"), HeaderValue::from(decision.remaining));
    response
}

#[instrument(skip(req, state, data))]
pub async fn submit_contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    data: web::Json<ContactFormRequest>,
) -> Result<HttpResponse, AppError> {
    let ip = match check_rate_limit(&req, &state) {
        Ok(ip) => ip,
        Err(response) => return Ok(response),
    };

    let response = state.submission_handler.submit_contact(data.into_inner(), Some(ip)).await?;
    Ok(HttpResponse::Created().json(response))
}

#[instrument(skip(req, state, data))]
pub async fn submit_onboarding(
    req: HttpRequest,
    state: web::Data<AppState>,
    data: web::Json<OnboardingRequest>,
) -> Result<HttpResponse, AppError> {
    let ip = match check_rate_limit(&req, &state) {
        Ok(ip) => ip,
        Err(response) => return Ok(response),
    };

    let response = state.submission_handler.submit_onboarding(data.into_inner(), Some(ip)).await?;
    Ok(HttpResponse::Created().json(response))
}

#[instrument(skip(_claims, state, query))]
pub async fn list_submissions(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    query: web::Query<SubmissionListQuery>,
) -> Result<impl Responder, AppError> {
    let filter = SubmissionFilter::try_from(query.into_inner())?;
    let response = state.submission_handler.list(&filter).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(_claims, state))]
pub async fn get_submission(
    _claims: AdminClaims,
    submission_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&submission_id)?;
    let submission = state.submission_handler.get(&id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "submission": submission })))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_submission_status(
    _claims: AdminClaims,
    submission_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateSubmissionStatusRequest>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&submission_id)?;
    let submission = state.submission_handler.update_status(&id, data.status).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "submission": submission })))
}

#[instrument(skip(_claims, state))]
pub async fn delete_submission(
    _claims: AdminClaims,
    submission_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = valid_uuid(&submission_id)?;
    state.submission_handler.delete(&id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Submission deleted"
    })))
}
