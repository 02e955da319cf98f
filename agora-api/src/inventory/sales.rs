//! Sales: model, body validation, stock-aware service operations and
//! handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{DocId, Document};

use super::InventoryState;
use super::error::InventoryError;
use super::stock;

/// One line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    /// Product sold.
    #[serde(rename = "productId")]
    pub product_id: DocId,
    /// Units sold.
    pub quantity: u64,
}

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: DocId,
    /// Line items.
    #[serde(rename = "itensSold")]
    pub items_sold: Vec<SaleItem>,
}

impl Document for Sale {
    fn id(&self) -> &DocId {
        &self.id
    }
}

/// `GET /sales` response.
#[derive(Debug, Serialize)]
pub struct SaleList {
    /// Every sale, in creation order.
    pub sales: Vec<Sale>,
}

const INVALID_SALE: &str = "Wrong product ID or invalid quantity";

/// Validates a sale body: a non-empty array of `{productId, quantity}` with
/// well-formed ids and integer quantities of at least 1.
///
/// # Errors
///
/// Returns [`InventoryError::InvalidData`] if any item is malformed.
pub fn validate_sale(body: &Value) -> Result<Vec<SaleItem>, InventoryError> {
    let invalid = || InventoryError::InvalidData(INVALID_SALE.to_string());

    let items = body.as_array().filter(|items| !items.is_empty()).ok_or_else(invalid)?;
    items
        .iter()
        .map(|item| -> Result<SaleItem, InventoryError> {
            let product_id = item
                .get("productId")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<DocId>().ok())
                .ok_or_else(invalid)?;
            let quantity = item
                .get("quantity")
                .and_then(Value::as_u64)
                .filter(|q| *q >= super::products::QUANTITY_MIN)
                .ok_or_else(invalid)?;
            Ok(SaleItem {
                product_id,
                quantity,
            })
        })
        .collect()
}

fn sale_not_found() -> InventoryError {
    InventoryError::NotFound("Sale not found".to_string())
}

impl InventoryState {
    /// Records a sale and takes the sold units out of stock.
    ///
    /// Check and write happen under the inventory lock: either the sale is
    /// stored and every product decremented, or nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::ProductNotFound`] or
    /// [`InventoryError::StockProblem`] when the sale cannot be applied.
    pub async fn record_sale(&self, items: Vec<SaleItem>) -> Result<Sale, InventoryError> {
        let _guard = self.stock_lock.lock().await;

        let levels = self.stock_levels(&items).await;
        let after = stock::check_sale(&levels, &items).inspect_err(|e| {
            tracing::info!(error = %e, "sale refused");
        })?;

        let sale = self
            .sales
            .insert(Sale {
                id: DocId::new(),
                items_sold: items,
            })
            .await;
        self.write_levels(after).await;

        tracing::info!(sale = %sale.id, items = sale.items_sold.len(), "sale recorded");
        Ok(sale)
    }

    /// Looks a sale up by id.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] if it does not exist.
    pub async fn sale(&self, id: &DocId) -> Result<Sale, InventoryError> {
        self.sales.find_by_id(id).await.ok_or_else(sale_not_found)
    }

    /// Replaces a sale's line items. Stock is left as is.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] for an unknown id.
    pub async fn update_sale(&self, id: &DocId, items: Vec<SaleItem>) -> Result<Sale, InventoryError> {
        self.sales
            .update(id, |s| s.items_sold = items)
            .await
            .ok_or_else(sale_not_found)
    }

    /// Deletes a sale and puts its units back in stock.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] for an unknown id.
    pub async fn delete_sale(&self, id: &DocId) -> Result<Sale, InventoryError> {
        let _guard = self.stock_lock.lock().await;

        let removed = self.sales.delete(id).await.ok_or_else(sale_not_found)?;
        let levels = self.stock_levels(&removed.items_sold).await;
        self.write_levels(stock::restore(&levels, &removed.items_sold))
            .await;

        tracing::info!(sale = %removed.id, "sale deleted, stock restored");
        Ok(removed)
    }

    /// Current stock of every existing product named in `items`.
    async fn stock_levels(&self, items: &[SaleItem]) -> HashMap<DocId, u64> {
        let mut levels = HashMap::new();
        for (id, _) in stock::demand(items) {
            if let Some(product) = self.products.find_by_id(&id).await {
                levels.insert(id, product.quantity);
            }
        }
        levels
    }

    async fn write_levels(&self, levels: Vec<(DocId, u64)>) {
        for (id, quantity) in levels {
            self.products.update(&id, |p| p.quantity = quantity).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn create(
    State(state): State<Arc<InventoryState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Sale>, InventoryError> {
    let Json(body) = payload?;
    let items = validate_sale(&body)?;
    Ok(Json(state.record_sale(items).await?))
}

pub(super) async fn list(State(state): State<Arc<InventoryState>>) -> Json<SaleList> {
    Json(SaleList {
        sales: state.sales.find_all().await,
    })
}

pub(super) async fn get(
    State(state): State<Arc<InventoryState>>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, InventoryError> {
    let id: DocId = id.parse().map_err(|_| sale_not_found())?;
    Ok(Json(state.sale(&id).await?))
}

pub(super) async fn update(
    State(state): State<Arc<InventoryState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Sale>, InventoryError> {
    let id: DocId = id.parse().map_err(|_| sale_not_found())?;
    let Json(body) = payload?;
    let items = validate_sale(&body)?;
    Ok(Json(state.update_sale(&id, items).await?))
}

pub(super) async fn remove(
    State(state): State<Arc<InventoryState>>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, InventoryError> {
    let id: DocId = id
        .parse()
        .map_err(|_| InventoryError::InvalidData("Wrong sale ID format".to_string()))?;
    Ok(Json(state.delete_sale(&id).await?))
}
