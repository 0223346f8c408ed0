use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::{
    sync::{atomic::{AtomicI64, Ordering}, RwLock},
    time::Duration,
};
use sysinfo::System;

use crate::{
    constants::START_TIME,
    entities::{blog_post::BlogStats, submission::SubmissionStats, upload::UploadStats},
    errors::AppError,
    repositories::sqlx_repo::check_connection,
    use_cases::extractors::AdminClaims,
    AppState,
};

/// Seconds a health report is served from cache.
const HEALTH_CACHE_SECS: i64 = 5;

#[derive(Serialize, Clone, Default)]
struct SystemInfo {
    os: String,
    kernel: String,
    hostname: String,
    cpu_count: usize,
    memory_total: String,
}

#[derive(Serialize, Clone, Default)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    start_at: String,
    database: String,
    storage_backend: String,
    version: String,
    memory_usage: String,
    system: SystemInfo,
}

impl HealthCheckResponse {
    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

static LAST_CHECK: AtomicI64 = AtomicI64::new(0);
static CACHED_STATUS: Lazy<RwLock<HealthCheckResponse>> = Lazy::new(||
    RwLock::new(HealthCheckResponse::default())
);

async fn build_health_response(state: &web::Data<AppState>) -> HealthCheckResponse {
    let now_utc = Utc::now();
    let uptime_duration = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime_duration.num_seconds().max(0) as u64));

    let mut sys = System::new_all();
    sys.refresh_all();

    let system_info = SystemInfo {
        os: System::name().unwrap_or_else(|| "Unknown".to_string()),
        kernel: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
        hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        cpu_count: sys.cpus().len(),
        memory_total: format!("{:.2} GB", sys.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0),
    };

    let db_ok = match check_connection(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    let process = sysinfo::get_current_pid().ok().and_then(|pid| sys.process(pid));
    let memory_usage = process.map_or("Unknown".to_string(), |p|
        format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0)
    );

    HealthCheckResponse {
        status: if db_ok { "healthy" } else { "degraded" }.to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        database: if db_ok { "OK" } else { "Unavailable" }.to_string(),
        storage_backend: state.upload_handler.pipeline.storage().backend_name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        memory_usage,
        system: system_info,
    }
}

fn health_reply(response: HealthCheckResponse) -> HttpResponse {
    if response.is_healthy() {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now = Utc::now().timestamp();
    let last = LAST_CHECK.load(Ordering::Relaxed);

    if now - last > HEALTH_CACHE_SECS {
        let response = build_health_response(&state).await;

        if let Ok(mut cache) = CACHED_STATUS.write() {
            *cache = response.clone();
            LAST_CHECK.store(now, Ordering::Relaxed);
        }

        health_reply(response)
    } else {
        let cached = CACHED_STATUS
            .read()
            .map(|response| response.clone())
            .map_err(|e| e.to_string());
        match cached {
            Ok(response) => health_reply(response),
            Err(e) => {
                tracing::warn!("HealthCheck cache lock poisoned: {}", e);
                health_reply(build_health_response(&state).await)
            }
        }
    }
}

#[derive(Serialize)]
struct DashboardResponse {
    posts: BlogStats,
    submissions: SubmissionStats,
    uploads: UploadStats,
}

#[get("/dashboard")]
pub async fn admin_dashboard(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (posts, submissions, uploads) = futures::try_join!(
        state.blog_handler.stats(),
        state.submission_handler.stats(),
        state.upload_handler.stats(),
    )?;

    Ok(HttpResponse::Ok().json(DashboardResponse { posts, submissions, uploads }))
}
