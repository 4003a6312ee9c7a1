use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::admin;
use crate::graphql::{create_schema, GraphQLSchema};
use crate::metrics;
use crate::state::AppState;
use crate::web;

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "openstates-web",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GraphQL handler (supports GET and POST)
async fn graphql_handler(
    Extension(schema): Extension<GraphQLSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let started = Instant::now();
    let response = schema.execute(req.into_inner()).await;
    let had_errors = response.is_err();
    metrics::graphql::request(started.elapsed().as_secs_f64(), had_errors);
    if had_errors {
        debug!(errors = response.errors.len(), "GraphQL request returned errors");
    }
    response.into()
}

/// GraphiQL UI
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// Prometheus exposition
async fn metrics_handler() -> Response {
    match metrics::render() {
        Some(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

/// Create the HTTP server with all routes: API, pages, static files, and the admin
/// endpoints when an admin token is configured.
pub fn create_server(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let schema = create_schema(state.storage.clone(), &state.site_url);

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/graphql", get(graphql_handler).post(graphql_handler))
        .route("/graphiql", get(graphiql))
        .layer(Extension(schema))
        .merge(web::routes());
    if state.admin_token.is_some() {
        router = router.merge(admin::handlers::routes(state.clone()));
    } else {
        warn!("no admin token configured, /admin routes are not mounted");
    }

    router
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(web::handlers::fallback)
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Start the HTTP server on the specified port
pub async fn start_server(state: AppState, static_dir: &Path, port: u16) -> Result<(), hyper::Error> {
    let app = create_server(state, static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "HTTP server listening");
    info!("GraphQL:   http://localhost:{port}/graphql");
    info!("GraphiQL:  http://localhost:{port}/graphiql");
    info!("Bills:     http://localhost:{port}/<state>/bills/");

    Server::bind(&addr).serve(app.into_make_service()).await
}
