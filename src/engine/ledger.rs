// ============================================================================
// Product Ledger
// Per-product working copy of remaining quantities
// ============================================================================

use super::snapshot::{RemainingBook, SnapshotIndex};
use crate::domain::{OfferId, OrderId, ProductId};
use crate::numeric::{NumericResult, Quantity};
use std::collections::HashMap;

/// Remaining demand and supply of one product's orders and offers.
///
/// Offers of the same product allocate against this shared pool one after
/// another, so each sees what the previous ones consumed. The ledger is
/// committed back into the run's [`RemainingBook`] once the product is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLedger {
    product_id: ProductId,
    orders: HashMap<OrderId, Quantity>,
    offers: HashMap<OfferId, Quantity>,
}

impl ProductLedger {
    /// Copy the product's current remaining quantities out of `book`
    pub fn open(index: &SnapshotIndex<'_>, book: &RemainingBook, product_id: ProductId) -> Self {
        Self {
            product_id,
            orders: index
                .orders_of(product_id)
                .iter()
                .map(|&id| (id, book.order(id)))
                .collect(),
            offers: index
                .offers_of(product_id)
                .iter()
                .map(|&id| (id, book.offer(id)))
                .collect(),
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn order_remaining(&self, order_id: OrderId) -> Quantity {
        self.orders.get(&order_id).copied().unwrap_or_default()
    }

    pub fn offer_remaining(&self, offer_id: OfferId) -> Quantity {
        self.offers.get(&offer_id).copied().unwrap_or_default()
    }

    /// Total remaining demand of the given orders
    pub fn demand(&self, order_ids: &[OrderId]) -> NumericResult<Quantity> {
        Quantity::checked_sum(order_ids.iter().map(|&id| self.order_remaining(id)))
    }

    /// Move `quantity` from an offer's supply onto an order's demand
    pub fn consume(
        &mut self,
        offer_id: OfferId,
        order_id: OrderId,
        quantity: Quantity,
    ) -> NumericResult<()> {
        let order = self.orders.entry(order_id).or_default();
        *order = order.checked_sub(quantity)?;

        let offer = self.offers.entry(offer_id).or_default();
        *offer = offer.checked_sub(quantity)?;

        Ok(())
    }

    /// Write the working copy back into the run's book
    pub fn commit(self, book: &mut RemainingBook) {
        for (order_id, remaining) in self.orders {
            book.set_order(order_id, remaining);
        }
        for (offer_id, remaining) in self.offers {
            book.set_offer(offer_id, remaining);
        }
    }
}
