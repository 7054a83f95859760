use crate::models::{
    ErrorResponse, HealthResponse, HomeResponse, MetaDebugResponse, RecommendQuery,
    RecommendRequest, RecommendResponse,
};
use crate::routes::AppState;
use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

/// Records returned by `/meta-debug`
const DEBUG_SAMPLE_SIZE: usize = 3;

/// Configure recommendation and diagnostic routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .route("/health", web::get().to(health_check))
        .route("/meta-debug", web::get().to(meta_debug))
        .route("/recommend", web::post().to(recommend));
}

async fn home() -> impl Responder {
    HttpResponse::Ok().json(HomeResponse {
        message: "Spark Parking API running!".to_string(),
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let catalog_size = state.recommender.catalog().len();
    let model_loaded = state.recommender.model_loaded();

    let status = if catalog_size > 0 && model_loaded { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        catalog_size,
        model_loaded,
    })
}

/// Row count plus the first few catalog records
async fn meta_debug(state: web::Data<AppState>) -> impl Responder {
    let catalog = state.recommender.catalog();
    HttpResponse::Ok().json(MetaDebugResponse {
        count: catalog.len(),
        sample: catalog.iter().take(DEBUG_SAMPLE_SIZE).cloned().collect(),
    })
}

/// Recommend parking near the user
///
/// POST /recommend?top_k=5
///
/// Request body:
/// ```json
/// {
///   "user_lat": 14.5547,
///   "user_lng": 121.0244,
///   "time_of_day": 18,
///   "day_of_week": 4
/// }
/// ```
async fn recommend(
    state: web::Data<AppState>,
    query: web::Query<RecommendQuery>,
    req: web::Json<RecommendRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate().and(query.validate()) {
        tracing::info!("Validation failed for recommend request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let top_k = query.top_k.unwrap_or(state.default_top_k);
    let user = req.user_location();

    match state.recommender.recommend(user, top_k) {
        Ok(ranked) => {
            tracing::info!(
                "Returning {} recommendations (from {} candidates) for ({}, {}) at {}h",
                ranked.recommendations.len(),
                ranked.total_candidates,
                user.lat,
                user.lng,
                user.time_of_day
            );
            HttpResponse::Ok().json(RecommendResponse {
                user_location: ranked.user_location,
                recommendations: ranked.recommendations,
            })
        }
        Err(e) => {
            tracing::error!("Recommendation failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Recommendation failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
