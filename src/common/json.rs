// src/common/json.rs

use axum::{
    extract::{FromRequest, FromRequestParts},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::error::AppError;

/// Extrator JSON cujo erro de parsing sai no mesmo formato `{ "errors": ... }`
/// que o resto da API.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Mesmo tratamento para parâmetros de path (`/api/items/abc`).
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// E para a query string (`?limit=x`).
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Envelope de sucesso esperado pela UI: `{ "data": ... }`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiData<T> {
    pub data: T,
}

impl<T> ApiData<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiData<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
