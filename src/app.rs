// src/app.rs

use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers};

/// Monta o router completo (o mesmo usado em produção e nos testes).
pub fn build_app(app_state: AppState) -> Router {
    let request_timeout = app_state.settings.request_timeout;

    let item_routes = Router::new()
        .route("/"
               ,post(handlers::inventory::create_item)
               .get(handlers::inventory::get_all_items)
        )
        .route("/{id}", get(handlers::inventory::get_item))
        .route("/{id}/movements"
               ,post(handlers::movements::record_item_movement)
               .get(handlers::movements::get_item_movements)
        )
        .route("/{id}/reconcile", post(handlers::inventory::reconcile_item));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/api/movements", post(handlers::movements::record_movement))
        .route("/api/reconcile", post(handlers::inventory::reconcile_all))
        .nest("/api/items", item_routes)
        .layer(timeout_layer(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Requisição que estoura o prazo vira 408.
fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_requests_time_out_with_408() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(50)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let res = reqwest::get(format!("http://{addr}/slow")).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::REQUEST_TIMEOUT);
        handle.abort();
    }
}
