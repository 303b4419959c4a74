use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

use crate::models::inventory::ItemId;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    ValidationError(#[from] validator::ValidationErrors),

    // Corpo, path ou query rejeitados antes de chegar no handler (sintaxe, content-type, tipos).
    #[error("{1}")]
    InvalidRequest(StatusCode, String),

    #[error("an item with SKU '{0}' already exists")]
    SkuAlreadyExists(String),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("insufficient stock for item {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: ItemId,
        available: Decimal,
        requested: Decimal,
    },

    // Variante para erros de banco de dados
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Erro de validação de um único campo, no mesmo formato do `validator`.
    pub fn field(field: &'static str, error: validator::ValidationError) -> Self {
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, error);
        AppError::ValidationError(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidRequest(status, _) => *status,
            AppError::SkuAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientStock { .. } => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(ref errors) => {
                let mut details = std::collections::BTreeMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let summary = details
                    .iter()
                    .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
                    .collect::<Vec<_>>()
                    .join("; ");
                json!({ "errors": summary, "details": details })
            }

            // Erros internos: loga o detalhe, devolve mensagem genérica.
            ref e @ (AppError::DatabaseError(_) | AppError::InternalServerError(_)) => {
                tracing::error!("internal server error: {}", e);
                json!({ "errors": "an unexpected error occurred" })
            }

            ref e => json!({ "errors": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
