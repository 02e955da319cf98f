//! Property-based tests for sale stock bookkeeping.
//!
//! Uses proptest to verify:
//! 1. A sale is accepted exactly when every product's total demand fits its stock.
//! 2. An accepted sale lowers each level by exactly the demand.
//! 3. Restoring an accepted sale brings every level back.

use std::collections::HashMap;

use agora_api::db::DocId;
use agora_api::inventory::sales::SaleItem;
use agora_api::inventory::stock::{StockError, check_sale, demand, restore};
use proptest::prelude::*;

/// Stock levels for a handful of products plus sale lines drawn from them.
fn arb_sale() -> impl Strategy<Value = (HashMap<DocId, u64>, Vec<SaleItem>)> {
    prop::collection::vec(0u64..50, 1..6).prop_flat_map(|stock| {
        let ids: Vec<DocId> = stock.iter().map(|_| DocId::new()).collect();
        let n = ids.len();
        let lines = prop::collection::vec((0..n, 1u64..30), 1..8);
        (Just(ids), Just(stock), lines).prop_map(|(ids, stock, lines)| {
            let levels = ids.iter().cloned().zip(stock).collect();
            let items = lines
                .into_iter()
                .map(|(i, quantity)| SaleItem {
                    product_id: ids[i].clone(),
                    quantity,
                })
                .collect();
            (levels, items)
        })
    })
}

fn apply(levels: &HashMap<DocId, u64>, changes: Vec<(DocId, u64)>) -> HashMap<DocId, u64> {
    let mut next = levels.clone();
    next.extend(changes);
    next
}

proptest! {
    #[test]
    fn accepted_iff_demand_fits((levels, items) in arb_sale()) {
        let fits = demand(&items).iter().all(|(id, qty)| *qty <= levels[id]);
        match check_sale(&levels, &items) {
            Ok(_) => prop_assert!(fits),
            Err(StockError::OutOfStock { requested, available, .. }) => {
                prop_assert!(!fits);
                prop_assert!(requested > available);
            }
            Err(StockError::ProductNotFound(id)) => {
                prop_assert!(false, "every product is stocked, got missing {}", id);
            }
        }
    }

    #[test]
    fn accepted_sale_subtracts_demand((levels, items) in arb_sale()) {
        if let Ok(changes) = check_sale(&levels, &items) {
            let after = apply(&levels, changes);
            for (id, qty) in demand(&items) {
                prop_assert_eq!(after[&id] + qty, levels[&id]);
            }
            for (id, level) in &levels {
                if !items.iter().any(|i| &i.product_id == id) {
                    prop_assert_eq!(after[id], *level);
                }
            }
        }
    }

    #[test]
    fn restore_undoes_sale((levels, items) in arb_sale()) {
        if let Ok(changes) = check_sale(&levels, &items) {
            let after = apply(&levels, changes);
            let back = apply(&after, restore(&after, &items));
            prop_assert_eq!(back, levels);
        }
    }

    #[test]
    fn unknown_product_is_reported((levels, mut items) in arb_sale()) {
        let stranger = DocId::new();
        items.push(SaleItem { product_id: stranger.clone(), quantity: 1 });
        prop_assert_eq!(check_sale(&levels, &items), Err(StockError::ProductNotFound(stranger)));
    }
}
