// src/handlers/movements.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    common::{error::AppError, json::{ApiData, AppJson, AppPath, AppQuery}},
    config::AppState,
    models::inventory::{Item, ItemId, Movement, MovementId, MovementType},
};

const MAX_PAGE_SIZE: usize = 500;

// ---
// Payload: RecordMovement (rota aninhada no item)
// ---
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordMovementPayload {
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Positiva para receipt/sale; com sinal para adjustment.
    #[schema(value_type = f64, example = 4)]
    pub quantity: Decimal,
}

#[utoipa::path(
    post,
    path = "/api/items/{id}/movements",
    tag = "Movements",
    params(("id" = i64, Path, description = "Id do item")),
    request_body = RecordMovementPayload,
    responses(
        (status = 201, description = "Movimentação gravada; devolve o item atualizado", body = ApiData<Item>),
        (status = 404, description = "Item não encontrado"),
        (status = 409, description = "Estoque insuficiente"),
        (status = 422, description = "Quantidade inválida")
    )
)]
pub async fn record_item_movement(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<ItemId>,
    AppJson(payload): AppJson<RecordMovementPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (_, item) = app_state
        .ledger
        .record_movement(id, payload.movement_type, payload.quantity)
        .await?;

    Ok((StatusCode::CREATED, ApiData::new(item)))
}

// ---
// Payload: RecordMovement (rota plana, item no corpo)
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementPayload {
    #[serde(alias = "item_id")]
    pub item_id: ItemId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    #[schema(value_type = f64, example = 10)]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MovementRequest {
    Wrapped { movement: MovementPayload },
    Bare(MovementPayload),
}

impl MovementRequest {
    fn into_payload(self) -> MovementPayload {
        match self {
            MovementRequest::Wrapped { movement } => movement,
            MovementRequest::Bare(movement) => movement,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/movements",
    tag = "Movements",
    request_body = MovementRequest,
    responses(
        (status = 201, description = "Movimentação gravada; devolve o item atualizado", body = ApiData<Item>),
        (status = 409, description = "Estoque insuficiente"),
        (status = 422, description = "Quantidade inválida ou item inexistente")
    )
)]
pub async fn record_movement(
    State(app_state): State<AppState>,
    AppJson(request): AppJson<MovementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = request.into_payload();

    // Aqui o item é um campo do corpo: referência inválida é erro de validação, não 404.
    let (_, item) = app_state
        .ledger
        .record_movement(payload.item_id, payload.movement_type, payload.quantity)
        .await
        .map_err(|e| match e {
            AppError::ItemNotFound(id) => {
                let mut err = ValidationError::new("unknown_item");
                err.message = Some(format!("item {id} does not exist").into());
                AppError::field("itemId", err)
            }
            other => other,
        })?;

    Ok((StatusCode::CREATED, ApiData::new(item)))
}

// ---
// Histórico paginado
// ---
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Devolve movimentações com id maior que este.
    pub after: Option<MovementId>,

    #[validate(range(min = 1, max = 500, message = "limit must be between 1 and 500"))]
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/items/{id}/movements",
    tag = "Movements",
    params(("id" = i64, Path, description = "Id do item"), HistoryQuery),
    responses(
        (status = 200, description = "Página do histórico em ordem crescente de id", body = ApiData<Vec<Movement>>),
        (status = 404, description = "Item não encontrado"),
        (status = 422, description = "Parâmetros inválidos")
    )
)]
pub async fn get_item_movements(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<ItemId>,
    AppQuery(query): AppQuery<HistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;

    let limit = query
        .limit
        .unwrap_or(app_state.settings.history_page_size)
        .min(MAX_PAGE_SIZE);

    let movements = app_state.ledger.history_page(id, query.after, limit).await?;
    Ok((StatusCode::OK, ApiData::new(movements)))
}
