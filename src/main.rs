use std::{env, time::Duration};

use actix_cors::Cors;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use partners_points_backend::{
    db::postgres::create_pool,
    graceful_shutdown::shutdown_signal,
    notify::create_notifier,
    routes::configure_routes,
    settings::AppConfig,
    storage::create_storage,
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

/// How often idle rate limiter keys are swept.
const LIMITER_EVICTION_INTERVAL: Duration = Duration::from_secs(10 * 60);

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let production = env::var("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    if production {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![
            header::RETRY_AFTER,
            header::HeaderName::from_static("x-ratelimit-limit"),
            header::HeaderName::from_static("x-ratelimit-remaining"),
        ])
        .max_age(3600);

    if origins.iter().any(|origin| origin == "*") {
        cors.allow_any_origin()
    } else {
        origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {}", e);
            std::process::exit(1);
        }
    };

    if config.run_migrations {
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::error!("Database migration failed: {}", e);
            std::process::exit(1);
        }
        tracing::info!("Database migrations applied");
    }

    let storage = match create_storage(&config).await {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!("Failed to initialise upload storage: {}", e);
            std::process::exit(1);
        }
    };
    let notifier = create_notifier(&config);

    let server_addr = format!("{}:{}", config.host, config.port);
    let workers = config.worker_count.max(1);
    let cors_origins = config.cors_origins();

    let app_state = web::Data::new(AppState::new(config, pool, storage, notifier));
    let eviction = app_state.submission_limiter.spawn_eviction(LIMITER_EVICTION_INTERVAL);

    tracing::info!(
        "🚀 Starting Partners Points API v{} on {} ({} workers)",
        env!("CARGO_PKG_VERSION"),
        server_addr,
        workers
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(build_cors(&cors_origins))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(workers)
    .bind(server_addr)?
    .run();

    let result = tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    };

    eviction.abort();
    tracing::info!("Server stopped");
    result
}
