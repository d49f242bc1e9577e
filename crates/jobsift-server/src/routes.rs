use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use jobsift_client::AnySource;
use jobsift_core::config::clamp_max_pages;
use jobsift_core::export::{self, ExportFormat};
use jobsift_core::models::{SearchRecord, SearchRequest, SearchStats, SourceMode};
use jobsift_core::{AppError, SearchService};

use crate::dto::{
    CreateSearchResponse, ExportQuery, HealthResponse, SearchBody, SearchDetailResponse,
    SearchResponse,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/search", post(search))
        .route("/v1/searches", post(create_search))
        .route("/v1/searches/{id}", get(get_search))
        .route("/v1/searches/{id}/export", get(export_search))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

fn parse_mode(raw: Option<&str>, default: SourceMode) -> Result<SourceMode, AppError> {
    match raw {
        None => Ok(default),
        Some(mode) => mode.parse().map_err(AppError::InvalidInput),
    }
}

fn non_empty_city(city: Option<&str>) -> Option<&str> {
    city.map(str::trim).filter(|c| !c.is_empty())
}

async fn find_search(state: &AppState, id: Uuid) -> Result<SearchRecord, AppError> {
    state
        .db
        .search_repo()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Search not found: {id}")))
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/search",
    request_body = SearchBody,
    responses(
        (status = 200, description = "Listings found", body = SearchResponse),
        (status = 400, description = "Empty query or unknown mode", body = crate::dto::ErrorResponse),
    ),
    tag = "search"
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<SearchBody>,
) -> Result<impl IntoResponse, ApiError> {
    let mode = parse_mode(body.mode.as_deref(), state.default_mode)?;
    let source = AnySource::from_config(mode, &state.sources)?;
    let service = SearchService::new(source, state.sources.default_city.as_str());

    let listings = service
        .search(
            &body.query,
            non_empty_city(body.city.as_deref()),
            clamp_max_pages(body.max_pages),
        )
        .await?;

    let response = SearchResponse {
        count: listings.len(),
        listings: listings.into_iter().map(Into::into).collect(),
    };

    Ok(axum::Json(response))
}

// ---------------------------------------------------------------------------
// Saved searches
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/searches",
    request_body = SearchBody,
    responses(
        (status = 202, description = "Search recorded, acquisition running", body = CreateSearchResponse),
        (status = 400, description = "Empty query or unknown mode", body = crate::dto::ErrorResponse),
    ),
    tag = "search"
)]
pub async fn create_search(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<SearchBody>,
) -> Result<impl IntoResponse, ApiError> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput("search query must not be empty".into()).into());
    }
    let mode = parse_mode(body.mode.as_deref(), state.default_mode)?;
    let source = AnySource::from_config(mode, &state.sources)?;
    let city = non_empty_city(body.city.as_deref());

    let record = state
        .db
        .search_repo()
        .create(query, city.unwrap_or(&state.sources.default_city))
        .await?;
    let search_id = record.id;

    let request = SearchRequest::new(query, city.map(String::from), clamp_max_pages(body.max_pages))
        .with_search_id(search_id);
    let service = SearchService::with_store(
        source,
        state.db.listing_repo(),
        state.sources.default_city.as_str(),
    );

    state.tasks.spawn(async move {
        match service.run(&request).await {
            Ok(outcome) => tracing::info!(
                %search_id,
                found = outcome.listings.len(),
                saved = outcome.saved.unwrap_or(0),
                "Background search finished"
            ),
            Err(e) => tracing::error!(%search_id, error = %e, "Background search failed"),
        }
    });

    tracing::info!(%search_id, %mode, "Search accepted");
    Ok((StatusCode::ACCEPTED, axum::Json(CreateSearchResponse { search_id })))
}

#[utoipa::path(
    get,
    path = "/v1/searches/{id}",
    params(
        ("id" = Uuid, Path, description = "Search ID")
    ),
    responses(
        (status = 200, description = "Search with stored listings", body = SearchDetailResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    tag = "search"
)]
pub async fn get_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let search = find_search(&state, id).await?;
    let listings = state.db.listing_repo().list(id).await?;
    let stats = SearchStats::from_listings(&listings);

    let response = SearchDetailResponse {
        search: search.into(),
        stats: stats.into(),
        listings: listings.into_iter().map(Into::into).collect(),
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/searches/{id}/export",
    params(
        ("id" = Uuid, Path, description = "Search ID"),
        ExportQuery,
    ),
    responses(
        (status = 200, description = "Export file download"),
        (status = 400, description = "Unknown format", body = crate::dto::ErrorResponse),
        (status = 404, description = "Unknown search or nothing stored", body = crate::dto::ErrorResponse),
    ),
    tag = "search"
)]
pub async fn export_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let format = match query.format.as_deref() {
        None => ExportFormat::default(),
        Some(raw) => raw.parse().map_err(AppError::InvalidInput)?,
    };

    let search = find_search(&state, id).await?;
    let listings = state.db.listing_repo().list(id).await?;
    if listings.is_empty() {
        return Err(AppError::NotFound(format!("No listings stored for search {id}")).into());
    }

    let body = export::to_bytes(&listings, format)?;
    let file_name: String =
        url::form_urlencoded::byte_serialize(export::export_file_name(&search.query, format).as_bytes())
            .collect();

    let headers = [
        (header::CONTENT_TYPE, format.mime_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename*=UTF-8''{file_name}"),
        ),
    ];

    Ok((headers, body))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_ok = state.db.health_check().await.is_ok();

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_ok { "healthy" } else { "unhealthy" },
        database: if db_ok { "ok" } else { "error" },
    };

    (status, axum::Json(response))
}
