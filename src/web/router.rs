//! Router configuration for the Web API.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dto::{
    BulkDeleteRequest, BulkDeleteResponse, CompleteUploadRequest, DiskUsageResponse, FileResponse,
    RenameRequest, UpdateRemarkRequest, UploadSessionResponse,
};
use super::handlers::{self, AppState};

/// OpenAPI documentation for the Web API.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::files::upload_files,
        handlers::files::list_files,
        handlers::files::get_file,
        handlers::files::download_file,
        handlers::files::rename_file,
        handlers::files::update_remark,
        handlers::files::delete_file,
        handlers::files::bulk_delete,
        handlers::files::disk_usage,
        handlers::upload::initiate_upload,
        handlers::upload::push_chunk,
        handlers::upload::complete_upload,
        handlers::upload::abandon_upload,
    ),
    components(schemas(
        FileResponse,
        UploadSessionResponse,
        BulkDeleteRequest,
        BulkDeleteResponse,
        RenameRequest,
        UpdateRemarkRequest,
        CompleteUploadRequest,
        DiskUsageResponse,
    )),
    tags(
        (name = "files", description = "Stored file operations"),
        (name = "uploads", description = "Chunked upload lifecycle")
    )
)]
struct ApiDoc;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let file_routes = Router::new()
        .route(
            "/files",
            post(handlers::upload_files).get(handlers::list_files),
        )
        .route("/files/bulk-delete", post(handlers::bulk_delete))
        .route(
            "/files/:id",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .route("/files/:id/download", get(handlers::download_file))
        .route("/files/:id/name", patch(handlers::rename_file))
        .route("/files/:id/remark", patch(handlers::update_remark))
        .route("/disk-usage", get(handlers::disk_usage));

    let upload_routes = Router::new()
        .route("/uploads", post(handlers::initiate_upload))
        .route("/uploads/:id", delete(handlers::abandon_upload))
        .route("/uploads/:id/chunks/:index", post(handlers::push_chunk))
        .route("/uploads/:id/complete", post(handlers::complete_upload));

    let api_routes = Router::new().merge(file_routes).merge(upload_routes);

    let body_limit = app_state.max_upload_size as usize;

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state)
}

/// Create the CORS layer from the configured origins.
fn create_cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.is_empty() {
        return CorsLayer::new();
    }

    if cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = cors_origins.iter().filter_map(|o| o.parse().ok()).collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create the Swagger UI router.
pub fn create_swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

/// Create a router serving the static frontend, if the path exists.
pub fn create_static_router(static_path: &str) -> Option<Router> {
    let path = std::path::Path::new(static_path);
    if !path.is_dir() {
        tracing::warn!(
            "Static path {:?} does not exist; static serving disabled",
            path
        );
        return None;
    }

    Some(Router::new().fallback_service(ServeDir::new(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
        // Should not panic
    }

    #[test]
    fn test_openapi_lists_all_paths() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths.paths;

        assert!(paths.contains_key("/files"));
        assert!(paths.contains_key("/files/{id}/download"));
        assert!(paths.contains_key("/uploads/{id}/chunks/{index}"));
        assert!(paths.contains_key("/disk-usage"));
    }

    #[test]
    fn test_static_router_missing_path() {
        assert!(create_static_router("does/not/exist").is_none());
    }
}
