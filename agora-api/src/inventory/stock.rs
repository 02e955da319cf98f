//! Stock bookkeeping for sales.
//!
//! Pure functions over a snapshot of stock levels. The caller reads the
//! levels, computes the new ones here and writes them back while holding the
//! inventory lock, so a sale is applied completely or not at all.

use std::collections::HashMap;

use crate::db::DocId;

use super::sales::SaleItem;

/// Why a sale cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StockError {
    /// A line item references an unknown product.
    #[error("product {0} not found")]
    ProductNotFound(DocId),

    /// The total requested for a product exceeds its stock.
    #[error("product {product}: requested {requested}, available {available}")]
    OutOfStock {
        /// Product that ran short.
        product: DocId,
        /// Units requested across all line items.
        requested: u64,
        /// Units in stock.
        available: u64,
    },
}

/// Total quantity requested per product, in order of first appearance.
#[must_use]
pub fn demand(items: &[SaleItem]) -> Vec<(DocId, u64)> {
    let mut totals: Vec<(DocId, u64)> = Vec::new();
    for item in items {
        match totals.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, qty)) => *qty = qty.saturating_add(item.quantity),
            None => totals.push((item.product_id.clone(), item.quantity)),
        }
    }
    totals
}

/// Computes the stock levels after selling `items`.
///
/// `levels` holds the current stock of every known product involved. An
/// unknown product takes precedence over a shortfall, matching the order
/// in which clients are told about problems.
///
/// # Errors
///
/// Returns [`StockError::ProductNotFound`] if any item names a product
/// missing from `levels`, otherwise [`StockError::OutOfStock`] for the first
/// product whose total demand exceeds its stock.
pub fn check_sale(
    levels: &HashMap<DocId, u64>,
    items: &[SaleItem],
) -> Result<Vec<(DocId, u64)>, StockError> {
    let totals = demand(items);

    if let Some((missing, _)) = totals.iter().find(|(id, _)| !levels.contains_key(id)) {
        return Err(StockError::ProductNotFound(missing.clone()));
    }

    totals
        .into_iter()
        .map(|(id, requested)| {
            let available = levels.get(&id).copied().unwrap_or_default();
            match available.checked_sub(requested) {
                Some(left) => Ok((id, left)),
                None => Err(StockError::OutOfStock {
                    product: id,
                    requested,
                    available,
                }),
            }
        })
        .collect()
}

/// Computes the stock levels after a sale of `items` is undone.
///
/// Products that no longer exist are skipped.
#[must_use]
pub fn restore(levels: &HashMap<DocId, u64>, items: &[SaleItem]) -> Vec<(DocId, u64)> {
    demand(items)
        .into_iter()
        .filter_map(|(id, qty)| {
            let current = *levels.get(&id)?;
            Some((id, current.saturating_add(qty)))
        })
        .collect()
}
