// src/handlers/inventory.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    common::{error::AppError, json::{ApiData, AppJson, AppPath, AppQuery}},
    config::AppState,
    models::inventory::{Item, ItemDetail, ItemId, ReconcileReport, Unit},
};

// ---
// Payload: CreateItem
// ---
// A validação (campos em branco) fica no serviço, que é quem conhece a política de SKU.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateItemPayload {
    #[schema(example = "Tomato")]
    pub name: String,
    #[schema(example = "TOM-1")]
    pub sku: String,
    #[serde(default)]
    pub unit: Unit,
}

/// A UI manda `{ "item": { ... } }`; clientes diretos podem mandar o objeto puro.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CreateItemRequest {
    Wrapped { item: CreateItemPayload },
    Bare(CreateItemPayload),
}

impl CreateItemRequest {
    fn into_payload(self) -> CreateItemPayload {
        match self {
            CreateItemRequest::Wrapped { item } => item,
            CreateItemRequest::Bare(item) => item,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/items",
    tag = "Inventory",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item criado", body = ApiData<Item>),
        (status = 409, description = "SKU já existe"),
        (status = 422, description = "Campos inválidos")
    )
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    AppJson(request): AppJson<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = request.into_payload();

    let new_item = app_state
        .inventory_service
        .create_item(&payload.name, &payload.sku, payload.unit)
        .await?;

    Ok((StatusCode::CREATED, ApiData::new(new_item)))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListItemsQuery {
    /// Só itens com saldo abaixo de 10.
    #[serde(default)]
    pub low_stock: bool,
}

#[utoipa::path(
    get,
    path = "/api/items",
    tag = "Inventory",
    params(ListItemsQuery),
    responses((status = 200, description = "Itens em ordem de criação", body = ApiData<Vec<Item>>))
)]
pub async fn get_all_items(
    State(app_state): State<AppState>,
    AppQuery(query): AppQuery<ListItemsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let items = if query.low_stock {
        app_state.inventory_service.list_low_stock_items().await?
    } else {
        app_state.inventory_service.list_items().await?
    };

    Ok((StatusCode::OK, ApiData::new(items)))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "Inventory",
    params(("id" = i64, Path, description = "Id do item")),
    responses(
        (status = 200, description = "Item com movimentações recentes", body = ApiData<ItemDetail>),
        (status = 404, description = "Item não encontrado")
    )
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<ItemId>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.inventory_service.get_item_detail(id).await?;
    Ok((StatusCode::OK, ApiData::new(detail)))
}

// --- Reconciliação ---

#[utoipa::path(
    post,
    path = "/api/items/{id}/reconcile",
    tag = "Inventory",
    params(("id" = i64, Path, description = "Id do item")),
    responses(
        (status = 200, description = "Saldo conferido (e corrigido, se divergente)", body = ApiData<ReconcileReport>),
        (status = 404, description = "Item não encontrado")
    )
)]
pub async fn reconcile_item(
    State(app_state): State<AppState>,
    AppPath(id): AppPath<ItemId>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.ledger.reconcile_item(id).await?;
    Ok((StatusCode::OK, ApiData::new(report)))
}

#[utoipa::path(
    post,
    path = "/api/reconcile",
    tag = "Inventory",
    responses((status = 200, description = "Conferência de todos os itens", body = ApiData<Vec<ReconcileReport>>))
)]
pub async fn reconcile_all(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let reports = app_state.ledger.reconcile_all().await?;

    let repaired = reports.iter().filter(|r| r.repaired).count();
    tracing::info!(items = reports.len(), repaired, "reconciliation finished");

    Ok((StatusCode::OK, ApiData::new(reports)))
}
