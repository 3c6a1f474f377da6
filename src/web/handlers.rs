use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::pages::{self, ConverterView, FrequencyView};
use super::AppState;
use crate::core::batch::{self, BatchFormat};
use crate::domain::{
    AnnotationRecord, ConversionDirection, FrequencyRecord, FrequencySource, GenomicCoordinate,
};
use crate::utils::error::{ErrorCategory, LiftoverError, Result};
use crate::utils::validation::{parse_position, required_form_field};

fn status_for(err: &LiftoverError) -> StatusCode {
    match err.category() {
        ErrorCategory::Input => StatusCode::BAD_REQUEST,
        ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
        ErrorCategory::Configuration | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn log_failure(err: &LiftoverError) {
    match err.category() {
        ErrorCategory::Input => warn!("Rejected request: {}", err),
        _ => error!("❌ Request failed: {} ({})", err, err.recovery_suggestion()),
    }
}

/// Which page to re-render when a form request fails.
#[derive(Debug, Clone, Copy)]
pub enum Page {
    Converter,
    Frequency,
}

/// Form failure: the page is rendered again with the message.
#[derive(Debug)]
pub struct PageError {
    page: Page,
    error: LiftoverError,
}

impl PageError {
    fn converter(error: LiftoverError) -> Self {
        Self {
            page: Page::Converter,
            error,
        }
    }

    fn frequency(error: LiftoverError) -> Self {
        Self {
            page: Page::Frequency,
            error,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        log_failure(&self.error);
        let message = Some(self.error.user_friendly_message());
        let html = match self.page {
            Page::Converter => pages::converter_page(&ConverterView {
                lookup: None,
                error: message,
            }),
            Page::Frequency => pages::frequency_page(&FrequencyView {
                error: message,
                ..Default::default()
            }),
        };
        (status_for(&self.error), Html(html)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// JSON API failure.
#[derive(Debug)]
pub struct ApiError(LiftoverError);

impl From<LiftoverError> for ApiError {
    fn from(err: LiftoverError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log_failure(&self.0);
        let body = Json(ErrorResponse {
            error: self.0.user_friendly_message(),
        });
        (status_for(&self.0), body).into_response()
    }
}

/// JSON 解析失敗視為輸入錯誤，回 400 與 ErrorResponse
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| LiftoverError::invalid_input("body", rejection.body_text()))
}

/// 請求有指定就照請求，否則用設定檔的預設值
fn resolve_annotate_source(state: &AppState, requested: Option<bool>) -> bool {
    requested.unwrap_or(state.annotate_source)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

pub async fn converter_index() -> Html<String> {
    Html(pages::converter_page(&ConverterView::default()))
}

pub async fn frequency_index() -> Html<String> {
    Html(pages::frequency_page(&FrequencyView::default()))
}

#[derive(Debug, Deserialize)]
pub struct ConversionForm {
    pub chromosome: Option<String>,
    pub position: Option<String>,
    pub conversion_type: Option<String>,
    pub annotate_original: Option<String>,
}

fn parse_direction(raw: &Option<String>) -> Result<ConversionDirection> {
    required_form_field("conversion_type", raw)?.parse()
}

impl ConversionForm {
    /// A checked box sends `on`; `off`/`false` (e.g. a hidden input) switch it off.
    fn annotate_original(&self) -> Option<bool> {
        self.annotate_original
            .as_deref()
            .map(str::trim)
            .map(|value| !matches!(value, "off" | "false" | "0"))
    }

    fn coordinate(&self) -> Result<GenomicCoordinate> {
        let chromosome = required_form_field("chromosome", &self.chromosome)?;
        let position = parse_position("position", required_form_field("position", &self.position)?)?;
        Ok(GenomicCoordinate::new(chromosome, position))
    }
}

/// Single coordinate conversion from the HTML form.
pub async fn convert_form(
    State(state): State<AppState>,
    Form(form): Form<ConversionForm>,
) -> std::result::Result<Html<String>, PageError> {
    let coordinate = form.coordinate().map_err(PageError::converter)?;
    let direction = parse_direction(&form.conversion_type).map_err(PageError::converter)?;
    let annotate_source = resolve_annotate_source(&state, form.annotate_original());

    info!("Single conversion request: {} ({})", coordinate, direction);
    let lookup = state
        .pipeline
        .lookup(direction, &coordinate, annotate_source)
        .await
        .map_err(PageError::converter)?;

    Ok(Html(pages::converter_page(&ConverterView {
        lookup: Some(&lookup),
        error: None,
    })))
}

struct BatchUpload {
    filename: String,
    data: Vec<u8>,
    direction: ConversionDirection,
}

async fn read_batch_upload(mut multipart: Multipart) -> Result<BatchUpload> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut conversion_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LiftoverError::invalid_input("file", format!("failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| {
                    LiftoverError::invalid_input("file", format!("failed to read upload: {}", e))
                })?;
                file = Some((filename, data.to_vec()));
            }
            "conversion_type" => {
                let value = field.text().await.map_err(|e| {
                    LiftoverError::invalid_input("conversion_type", e.to_string())
                })?;
                conversion_type = Some(value);
            }
            other => {
                // 忽略未知欄位
                tracing::debug!("Ignoring multipart field '{}'", other);
            }
        }
    }

    let (filename, data) = file
        .filter(|(filename, _)| !filename.is_empty())
        .ok_or_else(|| LiftoverError::invalid_input("file", "no file was uploaded"))?;
    let direction = parse_direction(&conversion_type)?;

    Ok(BatchUpload {
        filename,
        data,
        direction,
    })
}

/// Batch conversion of an uploaded table; answers with a CSV download.
pub async fn batch_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Response, PageError> {
    let upload = read_batch_upload(multipart)
        .await
        .map_err(PageError::converter)?;
    info!(
        "Batch upload received: {} ({} bytes, {})",
        upload.filename,
        upload.data.len(),
        upload.direction
    );

    let format = BatchFormat::from_filename(&upload.filename).map_err(PageError::converter)?;
    let coordinates = batch::read_coordinates(&upload.data, format, state.max_batch_rows)
        .map_err(PageError::converter)?;
    let rows = state
        .pipeline
        .run_batch(upload.direction, &coordinates)
        .await
        .map_err(PageError::converter)?;
    let output = batch::write_results(&rows).map_err(PageError::converter)?;

    let filename = batch::output_filename(upload.direction);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        output,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct FrequencyForm {
    pub gene_symbol: Option<String>,
    pub position: Option<String>,
    pub ref_allele: Option<String>,
    pub alt_allele: Option<String>,
}

struct FrequencyQuery {
    gene_symbol: String,
    position: u64,
    ref_allele: String,
    alt_allele: String,
}

impl FrequencyForm {
    fn query(&self) -> Result<FrequencyQuery> {
        Ok(FrequencyQuery {
            gene_symbol: required_form_field("gene_symbol", &self.gene_symbol)?.to_string(),
            position: parse_position("position", required_form_field("position", &self.position)?)?,
            ref_allele: required_form_field("ref_allele", &self.ref_allele)?.to_string(),
            alt_allele: required_form_field("alt_allele", &self.alt_allele)?.to_string(),
        })
    }
}

async fn run_frequency_query(state: &AppState, query: &FrequencyQuery) -> Result<Option<FrequencyRecord>> {
    info!(
        "Frequency request: {} {} {}>{}",
        query.gene_symbol, query.position, query.ref_allele, query.alt_allele
    );
    state
        .frequency
        .lookup(
            &query.gene_symbol,
            query.position,
            &query.ref_allele,
            &query.alt_allele,
        )
        .await
}

pub async fn frequency_form(
    State(state): State<AppState>,
    Form(form): Form<FrequencyForm>,
) -> std::result::Result<Html<String>, PageError> {
    let query = form.query().map_err(PageError::frequency)?;
    let record = run_frequency_query(&state, &query)
        .await
        .map_err(PageError::frequency)?;

    Ok(Html(pages::frequency_page(&FrequencyView {
        not_found: record.is_none(),
        record: record.as_ref(),
        error: None,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub chromosome: String,
    pub position: u64,
    pub conversion_type: ConversionDirection,
    pub annotate_original: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub conversion_type: ConversionDirection,
    pub source: GenomicCoordinate,
    pub target: Option<GenomicCoordinate>,
    pub candidates: Vec<GenomicCoordinate>,
    pub converted_annotation: Option<AnnotationRecord>,
    pub original_annotation: Option<AnnotationRecord>,
    pub message: Option<&'static str>,
}

pub async fn convert_json(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ConvertRequest>, JsonRejection>,
) -> std::result::Result<Json<ConvertResponse>, ApiError> {
    let request = json_body(payload)?;
    let chromosome = request.chromosome.trim();
    if chromosome.is_empty() {
        return Err(LiftoverError::invalid_input("chromosome", "field is required").into());
    }
    if request.position == 0 {
        return Err(LiftoverError::invalid_input(
            "position",
            "positions are 1-based and must be at least 1",
        )
        .into());
    }

    let coordinate = GenomicCoordinate::new(chromosome, request.position);
    let annotate_source = resolve_annotate_source(&state, request.annotate_original);
    let lookup = state
        .pipeline
        .lookup(request.conversion_type, &coordinate, annotate_source)
        .await?;

    let message = (!lookup.conversion.is_mapped()).then_some(pages::NOT_CONVERTED_MESSAGE);
    Ok(Json(ConvertResponse {
        conversion_type: lookup.direction,
        source: lookup.conversion.source,
        target: lookup.conversion.target,
        candidates: lookup.conversion.candidates,
        converted_annotation: lookup.converted_annotation,
        original_annotation: lookup.original_annotation,
        message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FrequencyRequest {
    pub gene_symbol: String,
    pub position: u64,
    pub ref_allele: String,
    pub alt_allele: String,
}

#[derive(Debug, Serialize)]
pub struct FrequencyResponse {
    pub found: bool,
    pub record: Option<FrequencyRecord>,
    pub message: Option<&'static str>,
}

pub async fn frequency_json(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FrequencyRequest>, JsonRejection>,
) -> std::result::Result<Json<FrequencyResponse>, ApiError> {
    let request = json_body(payload)?;
    let form = FrequencyForm {
        gene_symbol: Some(request.gene_symbol),
        position: Some(request.position.to_string()),
        ref_allele: Some(request.ref_allele),
        alt_allele: Some(request.alt_allele),
    };
    let query = form.query()?;
    let record = run_frequency_query(&state, &query).await?;

    Ok(Json(FrequencyResponse {
        found: record.is_some(),
        message: record
            .is_none()
            .then_some(pages::VARIANT_NOT_FOUND_MESSAGE),
        record,
    }))
}
