//! Inventory service: products and sales with stock bookkeeping.
//!
//! Every write that can change stock (product create/update/delete, sale
//! create/delete) runs under one inventory lock so a sale's stock check and
//! stock write never interleave with another.

pub mod error;
pub mod products;
pub mod sales;
pub mod stock;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::db::Collection;
use crate::server;

use self::products::Product;
use self::sales::Sale;

/// Shared state of the inventory service.
pub struct InventoryState {
    /// Product collection.
    pub products: Collection<Product>,
    /// Sale collection.
    pub sales: Collection<Sale>,
    stock_lock: Mutex<()>,
}

impl InventoryState {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: Collection::new("products"),
            sales: Collection::new("sales"),
            stock_lock: Mutex::new(()),
        }
    }
}

impl Default for InventoryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the inventory router.
pub fn router(state: Arc<InventoryState>) -> Router {
    Router::new()
        .route("/", get(server::root))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/sales", get(sales::list).post(sales::create))
        .route(
            "/sales/{id}",
            get(sales::get).put(sales::update).delete(sales::remove),
        )
        .layer(server::catch_panics())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
