use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;
use validator::Validate;

use crate::{
    calculator::{calculate, CalculatorInput},
    errors::AppError,
};

#[instrument(skip(data))]
pub async fn run_calculator(data: web::Json<CalculatorInput>) -> Result<impl Responder, AppError> {
    let input = data.into_inner();
    input.validate()?;

    Ok(HttpResponse::Ok().json(calculate(&input)))
}
