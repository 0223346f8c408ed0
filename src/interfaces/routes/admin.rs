use actix_web::web;

use crate::{
    handlers::{blog_posts, submissions, system::admin_dashboard, uploads},
    middlewares::auth::AuthMiddleware,
};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(AuthMiddleware)
            .service(admin_dashboard)
            .service(
                web::resource("/blog/posts")
                    .route(web::get().to(blog_posts::admin_list_blog_posts))
                    .route(web::post().to(blog_posts::create_blog_post))
            )
            .service(
                web::resource("/blog/posts/stats")
                    .route(web::get().to(blog_posts::blog_stats))
            )
            .service(
                web::resource("/blog/posts/{slug}")
                    .route(web::get().to(blog_posts::admin_get_blog_post))
                    .route(web::patch().to(blog_posts::update_blog_post))
                    .route(web::put().to(blog_posts::update_blog_post))
                    .route(web::delete().to(blog_posts::delete_blog_post))
            )
            .service(
                web::resource("/uploads")
                    .route(web::get().to(uploads::list_uploads))
                    .route(web::post().to(uploads::upload_file))
            )
            .service(
                web::resource("/uploads/{upload_id}")
                    .route(web::delete().to(uploads::delete_upload))
            )
            .service(
                web::resource("/submissions")
                    .route(web::get().to(submissions::list_submissions))
            )
            .service(
                web::resource("/submissions/{submission_id}")
                    .route(web::get().to(submissions::get_submission))
                    .route(web::patch().to(submissions::update_submission_status))
                    .route(web::delete().to(submissions::delete_submission))
            )
    );
}
