pub mod customers;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::{graphql, openapi::ApiDoc, soap, state::AppState};

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the HTTP router: REST, GraphQL and SOAP share one listener.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let rest = Router::new()
        .route("/api/customers", get(customers::list).post(customers::create))
        .route("/api/customers/search", get(customers::search))
        .route(
            "/api/customers/:id",
            get(customers::get).put(customers::update).delete(customers::delete),
        );

    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/graphql", get(graphql::graphiql).post(graphql::graphql_handler))
        .route("/CustomerSoapService", post(soap::soap_handler));

    public
        .merge(rest)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        // 每次请求创建 span，包含方法和路径等
                        .make_span_with(
                            DefaultMakeSpan::new().level(Level::INFO).include_headers(false),
                        )
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        // 响应返回时打点，包含状态码与耗时
                        .on_response(
                            DefaultOnResponse::new().level(Level::INFO).include_headers(false),
                        )
                        .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
                )
                .layer(cors),
        )
}
