use actix_web::{post, web, HttpResponse, Responder, ResponseError};

use crate::entities::token::LoginRequest;
use crate::AppState;

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    credentials: web::Json<LoginRequest>
) -> impl Responder {
    match state.auth_handler.login(credentials.into_inner()).await {
        Ok(auth_response) => HttpResponse::Ok().json(auth_response),
        Err(e) => e.error_response(),
    }
}
