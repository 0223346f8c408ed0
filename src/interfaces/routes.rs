use actix_web::web;

use crate::handlers::{calculator, home::home, json_error::not_found, system::health_check, uploads};

mod admin;
mod auth;
mod blog;
mod json_error;
mod submissions;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(json_error::config_routes);

    cfg.service(home);
    cfg.service(health_check);
    cfg.service(
        web::resource("/uploads/{key:.*}")
            .route(web::get().to(uploads::serve_upload))
    );

    cfg.service(
        web::scope("/api/v1")
            .configure(auth::config_routes)
            .configure(blog::config_routes)
            .configure(submissions::config_routes)
            .service(
                web::resource("/calculator")
                    .route(web::post().to(calculator::run_calculator))
            )
            .configure(admin::config_routes)
    );

    cfg.default_service(web::to(not_found));
}
