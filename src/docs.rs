// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "Salad Shop Inventory", description = "Itens, movimentações de estoque e conferência do livro-razão"),
    paths(
        // --- INVENTORY ---
        handlers::inventory::create_item,
        handlers::inventory::get_all_items,
        handlers::inventory::get_item,
        handlers::inventory::reconcile_item,
        handlers::inventory::reconcile_all,

        // --- MOVEMENTS ---
        handlers::movements::record_item_movement,
        handlers::movements::record_movement,
        handlers::movements::get_item_movements,
    ),
    components(
        schemas(
            // --- Inventory ---
            models::inventory::Unit,
            models::inventory::Item,
            models::inventory::ItemDetail,
            models::inventory::MovementType,
            models::inventory::Movement,
            models::inventory::ReconcileReport,

            // --- Payloads ---
            handlers::inventory::CreateItemPayload,
            handlers::inventory::CreateItemRequest,
            handlers::movements::RecordMovementPayload,
            handlers::movements::MovementPayload,
            handlers::movements::MovementRequest,
        )
    ),
    tags(
        (name = "Inventory", description = "Catálogo de itens e saldo"),
        (name = "Movements", description = "Livro-razão de movimentações")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/items",
            "/api/items/{id}",
            "/api/items/{id}/movements",
            "/api/items/{id}/reconcile",
            "/api/movements",
            "/api/reconcile",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
