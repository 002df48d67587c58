use anyhow::Result;
use axum::{
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use super::generator;
use super::model::{AdjustPlanRequest, GeneratePlanRequest, PlanResponse};
use crate::config::Config;
use crate::error::{AppError, AppResult};

pub const SERVICE_NAME: &str = "FitAI Plan Generator";

pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate_plan", post(generate_plan))
        .route("/adjust_plan", post(adjust_plan))
}

pub async fn serve(cfg: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", cfg.planner.bind, cfg.planner.port);
    let app = routes().layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Plan generator listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

fn parse_week_start(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("week_start must be YYYY-MM-DD, got '{}'", raw)))
}

async fn generate_plan(Json(body): Json<GeneratePlanRequest>) -> AppResult<Json<PlanResponse>> {
    let week_start = parse_week_start(&body.week_start)?;
    let seed = generator::seed_for(body.user_id, &body.week_start, false);

    let plan = generator::generate_plan(&body.profile, &body.exercises, week_start, seed);
    tracing::debug!(
        "Generated {}-day plan for user {} week {}",
        plan.days.len(), body.user_id, body.week_start
    );
    Ok(Json(plan))
}

async fn adjust_plan(Json(body): Json<AdjustPlanRequest>) -> AppResult<Json<PlanResponse>> {
    let week_start = parse_week_start(&body.week_start)?;
    let seed = generator::seed_for(body.user_id, &body.week_start, true);

    let plan = generator::generate_adjusted_plan(
        &body.profile,
        &body.exercises,
        week_start,
        &body.logs_summary,
        seed,
    );
    tracing::debug!(
        "Adjusted plan for user {} week {} (previous week {}, completion {}%)",
        body.user_id, body.week_start, body.previous_plan.week_start, body.logs_summary.completion_rate
    );
    Ok(Json(plan))
}
