use crate::models::{ErrorResponse, EtaRequest, OptimizeRequest, RouteRequest};
use crate::routes::AppState;
use actix_web::{web, HttpResponse, Responder};

/// Configure routing proxy routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/eta", web::post().to(eta))
        .route("/route", web::post().to(route))
        .route("/optimize", web::post().to(optimize));
}

fn upstream_failure(context: &str, e: impl std::fmt::Display) -> HttpResponse {
    tracing::error!("{} failed: {}", context, e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "Routing failed".to_string(),
        message: format!("{} failed: {}", context, e),
        status_code: 500,
    })
}

/// Travel time in seconds between two points
async fn eta(state: web::Data<AppState>, req: web::Json<EtaRequest>) -> impl Responder {
    match state.routing.eta(&req).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => upstream_failure("ETA", e),
    }
}

/// Route geometry and duration, optionally through intermediate stops
async fn route(state: web::Data<AppState>, req: web::Json<RouteRequest>) -> impl Responder {
    match state.routing.route(&req).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => upstream_failure("Route", e),
    }
}

/// Best visiting order for the given stops
async fn optimize(state: web::Data<AppState>, req: web::Json<OptimizeRequest>) -> impl Responder {
    match state.routing.optimize(&req).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => upstream_failure("Optimize", e),
    }
}
