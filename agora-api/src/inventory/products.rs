//! Products: model, body validation, service operations and handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{DocId, Document};

use super::InventoryState;
use super::error::InventoryError;

/// Minimum product name length, in characters.
pub const NAME_MIN_LENGTH: usize = 5;

/// Minimum quantity accepted on create and update.
pub const QUANTITY_MIN: u64 = 1;

/// A product and its current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: DocId,
    /// Unique product name.
    pub name: String,
    /// Units in stock.
    pub quantity: u64,
}

impl Document for Product {
    fn id(&self) -> &DocId {
        &self.id
    }
}

/// Validated create/update body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    /// Product name.
    pub name: String,
    /// Units in stock.
    pub quantity: u64,
}

/// `GET /products` response.
#[derive(Debug, Serialize)]
pub struct ProductList {
    /// Every product, in creation order.
    pub products: Vec<Product>,
}

/// Validates a product body, reporting the first offending field.
///
/// # Errors
///
/// Returns [`InventoryError::InvalidData`] naming the field and the rule it
/// broke.
pub fn validate_product(body: &Value) -> Result<ProductInput, InventoryError> {
    let invalid = |msg: String| InventoryError::InvalidData(msg);

    let Some(fields) = body.as_object() else {
        return Err(invalid(r#""value" must be of type object"#.to_string()));
    };

    let name = match fields.get("name") {
        None | Some(Value::Null) => return Err(invalid(r#""name" is required"#.to_string())),
        Some(Value::String(name)) => name,
        Some(_) => return Err(invalid(r#""name" must be a string"#.to_string())),
    };
    if name.chars().count() < NAME_MIN_LENGTH {
        return Err(invalid(format!(
            r#""name" length must be at least {NAME_MIN_LENGTH} characters long"#
        )));
    }

    let too_small = || invalid(format!(r#""quantity" must be larger than or equal to {QUANTITY_MIN}"#));
    let quantity = match fields.get("quantity") {
        None | Some(Value::Null) => return Err(invalid(r#""quantity" is required"#.to_string())),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(q) => q,
            None if n.as_i64().is_some() => return Err(too_small()),
            None => return Err(invalid(r#""quantity" must be an integer"#.to_string())),
        },
        Some(_) => return Err(invalid(r#""quantity" must be a number"#.to_string())),
    };
    if quantity < QUANTITY_MIN {
        return Err(too_small());
    }

    Ok(ProductInput {
        name: name.clone(),
        quantity,
    })
}

/// Parses a product id path segment.
fn parse_product_id(raw: &str) -> Result<DocId, InventoryError> {
    raw.parse()
        .map_err(|_| InventoryError::InvalidData("Wrong id format".to_string()))
}

fn product_not_found() -> InventoryError {
    InventoryError::NotFound("Product not found".to_string())
}

fn duplicate_name() -> InventoryError {
    InventoryError::InvalidData("Product already exists".to_string())
}

impl InventoryState {
    /// Creates a product unless one with the same name exists.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::InvalidData`] on a duplicate name.
    pub async fn create_product(&self, input: ProductInput) -> Result<Product, InventoryError> {
        let _guard = self.stock_lock.lock().await;
        if self.products.find_one(|p| p.name == input.name).await.is_some() {
            return Err(duplicate_name());
        }
        let product = Product {
            id: DocId::new(),
            name: input.name,
            quantity: input.quantity,
        };
        tracing::info!(product = %product.id, name = %product.name, "product created");
        Ok(self.products.insert(product).await)
    }

    /// Looks a product up by id.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] if it does not exist.
    pub async fn product(&self, id: &DocId) -> Result<Product, InventoryError> {
        self.products.find_by_id(id).await.ok_or_else(product_not_found)
    }

    /// Replaces a product's name and stock.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] for an unknown id, or
    /// [`InventoryError::InvalidData`] if another product has the name.
    pub async fn update_product(
        &self,
        id: &DocId,
        input: ProductInput,
    ) -> Result<Product, InventoryError> {
        let _guard = self.stock_lock.lock().await;
        let taken = self
            .products
            .find_one(|p| p.name == input.name && p.id != *id)
            .await;
        if taken.is_some() {
            return Err(duplicate_name());
        }
        self.products
            .update(id, |p| {
                p.name = input.name;
                p.quantity = input.quantity;
            })
            .await
            .ok_or_else(product_not_found)
    }

    /// Deletes a product and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::NotFound`] for an unknown id.
    pub async fn delete_product(&self, id: &DocId) -> Result<Product, InventoryError> {
        let _guard = self.stock_lock.lock().await;
        let removed = self.products.delete(id).await.ok_or_else(product_not_found)?;
        tracing::info!(product = %removed.id, "product deleted");
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn create(
    State(state): State<Arc<InventoryState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), InventoryError> {
    let Json(body) = payload?;
    let input = validate_product(&body)?;
    let product = state.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub(super) async fn list(State(state): State<Arc<InventoryState>>) -> Json<ProductList> {
    Json(ProductList {
        products: state.products.find_all().await,
    })
}

pub(super) async fn get(
    State(state): State<Arc<InventoryState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, InventoryError> {
    let id = parse_product_id(&id)?;
    Ok(Json(state.product(&id).await?))
}

pub(super) async fn update(
    State(state): State<Arc<InventoryState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Product>, InventoryError> {
    let id = parse_product_id(&id)?;
    let Json(body) = payload?;
    let input = validate_product(&body)?;
    Ok(Json(state.update_product(&id, input).await?))
}

pub(super) async fn remove(
    State(state): State<Arc<InventoryState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, InventoryError> {
    let id = parse_product_id(&id)?;
    Ok(Json(state.delete_product(&id).await?))
}
