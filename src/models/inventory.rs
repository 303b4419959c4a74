// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub type ItemId = i64;
pub type MovementId = i64;

/// Abaixo deste saldo a UI pinta a linha de vermelho.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

// --- 1. Unidades de Medida ---
// Conjunto fechado. Os valores de wire são os mesmos do <select> da UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Default, ToSchema)]
#[sqlx(type_name = "item_unit")]
pub enum Unit {
    #[default]
    #[sqlx(rename = "pcs")]
    #[serde(rename = "pcs", alias = "pieces", alias = "piece")]
    Pieces,

    #[sqlx(rename = "kg")]
    #[serde(rename = "kg", alias = "kilograms", alias = "kilogram")]
    Kilograms,

    #[sqlx(rename = "litre")]
    #[serde(rename = "litre", alias = "litres", alias = "liter", alias = "liters", alias = "l")]
    Litres,
}

// --- 2. Itens ---
// O `stock` nunca vem do cliente: é sempre a soma dos deltas do livro-razão.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[schema(example = 1)]
    pub id: ItemId,
    #[schema(example = "Tomato")]
    pub name: String,
    #[schema(example = "TOM-1")]
    pub sku: String,
    pub unit: Unit,
    #[schema(value_type = f64, example = 12.5)]
    pub stock: Decimal,
}

impl Item {
    pub fn is_low_stock(&self) -> bool {
        self.stock < Decimal::from(LOW_STOCK_THRESHOLD)
    }
}

fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Dados de criação já normalizados (trim) e prontos para o store.
#[derive(Debug, Clone, Validate)]
pub struct NewItem {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub sku: String,

    pub unit: Unit,

    /// Chave usada na restrição de unicidade (depende da política de caixa).
    pub sku_key: String,
}

impl NewItem {
    pub fn new(name: &str, sku: &str, unit: Unit, sku_case_sensitive: bool) -> Self {
        let sku = sku.trim().to_string();
        Self {
            name: name.trim().to_string(),
            sku_key: sku_key(&sku, sku_case_sensitive),
            sku,
            unit,
        }
    }
}

pub fn sku_key(sku: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        sku.to_string()
    } else {
        sku.to_lowercase()
    }
}

// --- 3. Movimentações (livro-razão) ---
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "movement_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Receipt,
    Sale,
    Adjustment,
}

impl MovementType {
    /// Converte a quantidade informada no delta com sinal.
    /// Receipt e sale exigem quantidade positiva; adjustment aceita qualquer valor diferente de zero.
    pub fn signed_delta(&self, quantity: Decimal) -> Result<Decimal, ValidationError> {
        match self {
            MovementType::Receipt | MovementType::Sale if quantity <= Decimal::ZERO => {
                let mut err = ValidationError::new("range");
                err.add_param("min".into(), &0);
                err.message = Some(format!("quantity must be greater than zero for {}", self.as_str()).into());
                Err(err)
            }
            MovementType::Adjustment if quantity.is_zero() => {
                let mut err = ValidationError::new("non_zero");
                err.message = Some("adjustment quantity must not be zero".into());
                Err(err)
            }
            MovementType::Receipt | MovementType::Adjustment => Ok(quantity),
            MovementType::Sale => Ok(-quantity),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Receipt => "receipt",
            MovementType::Sale => "sale",
            MovementType::Adjustment => "adjustment",
        }
    }
}

/// Saldo depois de aplicar o delta. Fora da faixa do `Decimal` é erro de entrada, nunca panic.
pub fn stock_after(stock: Decimal, delta: Decimal) -> Result<Decimal, ValidationError> {
    stock.checked_add(delta).ok_or_else(|| {
        let mut err = ValidationError::new("overflow");
        err.message = Some("resulting stock is out of range".into());
        err
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: MovementId,
    pub item_id: ItemId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    #[schema(value_type = f64)]
    pub quantity_delta: Decimal,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

// --- 4. Visões compostas ---

/// Item + histórico recente, usado pela tela de detalhe.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub movements: Vec<Movement>,
}

/// Resultado da conferência estoque x livro-razão.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub item_id: ItemId,
    #[schema(value_type = f64)]
    pub recorded_stock: Decimal,
    #[schema(value_type = f64)]
    pub ledger_stock: Decimal,
    pub repaired: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn signed_delta_follows_movement_type() {
        assert_eq!(MovementType::Receipt.signed_delta(dec!(3)).unwrap(), dec!(3));
        assert_eq!(MovementType::Sale.signed_delta(dec!(3)).unwrap(), dec!(-3));
        assert_eq!(MovementType::Adjustment.signed_delta(dec!(-2.5)).unwrap(), dec!(-2.5));
    }

    #[test]
    fn non_positive_quantities_are_rejected_except_for_adjustments() {
        assert!(MovementType::Receipt.signed_delta(dec!(0)).is_err());
        assert!(MovementType::Sale.signed_delta(dec!(-1)).is_err());
        assert!(MovementType::Adjustment.signed_delta(dec!(0)).is_err());
    }

    #[test]
    fn stock_after_rejects_out_of_range_results() {
        assert_eq!(stock_after(dec!(2), dec!(-5)).unwrap(), dec!(-3));
        assert_eq!(stock_after(Decimal::MAX, Decimal::MAX).unwrap_err().code, "overflow");
        assert!(stock_after(Decimal::MIN, dec!(-1)).is_err());
    }

    #[test]
    fn unit_accepts_ui_values_and_aliases() {
        let unit: Unit = serde_json::from_str("\"kg\"").unwrap();
        assert_eq!(unit, Unit::Kilograms);
        let unit: Unit = serde_json::from_str("\"litres\"").unwrap();
        assert_eq!(unit, Unit::Litres);
        assert_eq!(serde_json::to_string(&Unit::Pieces).unwrap(), "\"pcs\"");
        assert!(serde_json::from_str::<Unit>("\"boxes\"").is_err());
    }

    #[test]
    fn new_item_trims_and_builds_sku_key() {
        let item = NewItem::new("  Olive Oil ", " OIL-1 ", Unit::Litres, false);
        assert_eq!(item.name, "Olive Oil");
        assert_eq!(item.sku, "OIL-1");
        assert_eq!(item.sku_key, "oil-1");
        assert!(item.validate().is_ok());

        let blank = NewItem::new("   ", "X", Unit::Pieces, true);
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn item_serializes_with_the_ui_shape() {
        let item = Item {
            id: 7,
            name: "Tomato".into(),
            sku: "TOM-1".into(),
            unit: Unit::Kilograms,
            stock: dec!(4),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 7, "name": "Tomato", "sku": "TOM-1", "unit": "kg", "stock": 4.0 })
        );
        assert!(item.is_low_stock());
    }
}
