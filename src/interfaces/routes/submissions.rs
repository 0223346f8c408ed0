use actix_web::web;

use crate::handlers::submissions;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/contact")
            .route(web::post().to(submissions::submit_contact))
    );
    cfg.service(
        web::resource("/onboarding")
            .route(web::post().to(submissions::submit_onboarding))
    );
}
