//! The single-endpoint HTTP surface.
//!
//! `GET /` serves the GraphiQL playground, `POST /` executes GraphQL.

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tracing::debug;

use crate::schema::AppSchema;

/// Shared per-process state behind the routes.
#[derive(Clone)]
pub struct AppState {
    schema: AppSchema,
    debug_requests: bool,
}

impl AppState {
    /// Bundles the schema with its serving options.
    pub fn new(schema: AppSchema, debug_requests: bool) -> Self {
        Self {
            schema,
            debug_requests,
        }
    }
}

/// Builds the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(playground).post(graphql))
        .with_state(state)
}

async fn graphql(State(state): State<AppState>, request: GraphQLRequest) -> GraphQLResponse {
    let request = request.into_inner();
    if state.debug_requests {
        debug!(query = %request.query, "executing graphql request");
    }
    state.schema.execute(request).await.into()
}

async fn playground() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/").finish())
}
