//! HTTP surface: HTML forms, batch upload, JSON API and health check.

pub mod handlers;
pub mod pages;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::adapters::{EnsemblClient, GnomadClient};
use crate::config::TomlConfig;
use crate::core::LiftoverPipeline;
use crate::liftover::CoordinateConverter;

/// 共享狀態，每個請求 clone 一份 Arc
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LiftoverPipeline<EnsemblClient>>,
    pub frequency: Arc<GnomadClient>,
    pub annotate_source: bool,
    pub max_batch_rows: usize,
}

impl AppState {
    pub fn new(
        pipeline: LiftoverPipeline<EnsemblClient>,
        frequency: GnomadClient,
        annotate_source: bool,
        max_batch_rows: usize,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            frequency: Arc::new(frequency),
            annotate_source,
            max_batch_rows,
        }
    }

    pub fn from_config(config: &TomlConfig, converter: Arc<CoordinateConverter>) -> Self {
        let annotator = EnsemblClient::new(
            config.annotation.server.clone(),
            config.annotation.failure_policy,
        );
        let frequency = GnomadClient::new(
            config.frequency.endpoint.clone(),
            config.frequency.dataset.clone(),
            config.frequency.failure_policy,
        );
        Self::new(
            LiftoverPipeline::new(converter, annotator),
            frequency,
            config.annotation.annotate_source,
            config.limits.max_batch_rows,
        )
    }
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::converter_index))
        .route("/convert", post(handlers::convert_form))
        .route("/batch", post(handlers::batch_upload))
        .route(
            "/frequency",
            get(handlers::frequency_index).post(handlers::frequency_form),
        )
        .route("/api/v1/convert", post(handlers::convert_json))
        .route("/api/v1/frequency", post(handlers::frequency_json))
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
