use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "jobsift API",
        version = "0.1.0",
        description = "Job listing search, storage and export for hh.ru."
    ),
    paths(
        crate::routes::search,
        crate::routes::create_search,
        crate::routes::get_search,
        crate::routes::export_search,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::SearchBody,
        crate::dto::SearchResponse,
        crate::dto::ListingResponse,
        crate::dto::CreateSearchResponse,
        crate::dto::SearchRecordResponse,
        crate::dto::StatsResponse,
        crate::dto::SearchDetailResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "search", description = "Listing search and export"),
        (name = "system", description = "Health and system status"),
    )
)]
pub struct ApiDoc;
