// ============================================================================
// Snapshot Index
// Lookup structures and remaining-quantity state for one engine run
// ============================================================================

use crate::domain::{OfferId, OfferView, OrderId, OrderView, ProductId};
use crate::error::{DistributionError, DistributionResult};
use crate::numeric::{NumericResult, Quantity};
use std::collections::{HashMap, HashSet};

/// Read-only index over the caller's order and offer snapshot.
///
/// Groups preserve input order. Products are listed in the order they first
/// appear among the orders; products that only have offers are never
/// visited, so their offers stay untouched.
pub struct SnapshotIndex<'a> {
    order_by_id: HashMap<OrderId, &'a OrderView>,
    offer_by_id: HashMap<OfferId, &'a OfferView>,
    products: Vec<ProductId>,
    orders_by_product: HashMap<ProductId, Vec<OrderId>>,
    offers_by_product: HashMap<ProductId, Vec<OfferId>>,
}

impl<'a> SnapshotIndex<'a> {
    /// Build the index. No validation happens here.
    pub fn build(orders: &'a [OrderView], offers: &'a [OfferView]) -> Self {
        let mut order_by_id = HashMap::with_capacity(orders.len());
        let mut products = Vec::new();
        let mut orders_by_product: HashMap<ProductId, Vec<OrderId>> = HashMap::new();

        for order in orders {
            order_by_id.insert(order.id, order);
            orders_by_product
                .entry(order.product_id)
                .or_insert_with(|| {
                    products.push(order.product_id);
                    Vec::new()
                })
                .push(order.id);
        }

        let mut offer_by_id = HashMap::with_capacity(offers.len());
        let mut offers_by_product: HashMap<ProductId, Vec<OfferId>> = HashMap::new();

        for offer in offers {
            offer_by_id.insert(offer.id, offer);
            offers_by_product
                .entry(offer.product_id)
                .or_default()
                .push(offer.id);
        }

        Self {
            order_by_id,
            offer_by_id,
            products,
            orders_by_product,
            offers_by_product,
        }
    }

    /// Products to visit, in first-appearance order
    pub fn products(&self) -> &[ProductId] {
        &self.products
    }

    pub fn orders_of(&self, product_id: ProductId) -> &[OrderId] {
        self.orders_by_product
            .get(&product_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn offers_of(&self, product_id: ProductId) -> &[OfferId] {
        self.offers_by_product
            .get(&product_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn order(&self, order_id: OrderId) -> Option<&'a OrderView> {
        self.order_by_id.get(&order_id).copied()
    }

    pub fn offer(&self, offer_id: OfferId) -> Option<&'a OfferView> {
        self.offer_by_id.get(&offer_id).copied()
    }

    pub fn order_count(&self) -> usize {
        self.order_by_id.len()
    }

    pub fn offer_count(&self) -> usize {
        self.offer_by_id.len()
    }
}

// ============================================================================
// Remaining Quantities
// ============================================================================

/// Unallocated demand of every order and supply of every offer in a run.
///
/// Owned by one run; products read it and commit their consumption back in
/// product order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemainingBook {
    orders: HashMap<OrderId, Quantity>,
    offers: HashMap<OfferId, Quantity>,
}

impl RemainingBook {
    /// Initialize every tracker to the record's full quantity
    pub fn from_snapshot(orders: &[OrderView], offers: &[OfferView]) -> Self {
        Self {
            orders: orders.iter().map(|o| (o.id, o.quantity)).collect(),
            offers: offers.iter().map(|o| (o.id, o.quantity)).collect(),
        }
    }

    /// Remaining demand of an order (zero if unknown)
    pub fn order(&self, order_id: OrderId) -> Quantity {
        self.orders.get(&order_id).copied().unwrap_or_default()
    }

    /// Remaining supply of an offer (zero if unknown)
    pub fn offer(&self, offer_id: OfferId) -> Quantity {
        self.offers.get(&offer_id).copied().unwrap_or_default()
    }

    pub fn total_order_remaining(&self) -> NumericResult<Quantity> {
        Quantity::checked_sum(self.orders.values().copied())
    }

    pub fn total_offer_remaining(&self) -> NumericResult<Quantity> {
        Quantity::checked_sum(self.offers.values().copied())
    }

    pub(crate) fn set_order(&mut self, order_id: OrderId, remaining: Quantity) {
        self.orders.insert(order_id, remaining);
    }

    pub(crate) fn set_offer(&mut self, offer_id: OfferId, remaining: Quantity) {
        self.offers.insert(offer_id, remaining);
    }
}

// ============================================================================
// Input Validation
// ============================================================================

/// Reject snapshots that break the record invariants the engine relies on:
/// non-negative quantities and prices, unique ids. A zero quantity is an
/// exhausted record and is skipped by the allocators.
pub fn validate_snapshot(orders: &[OrderView], offers: &[OfferView]) -> DistributionResult<()> {
    let mut seen_orders = HashSet::with_capacity(orders.len());
    for order in orders {
        if order.quantity.is_negative() {
            return Err(DistributionError::NegativeOrderQuantity {
                order: order.id,
                quantity: order.quantity,
            });
        }
        if order.unit_price.is_negative() {
            return Err(DistributionError::NegativeUnitPrice {
                order: order.id,
                price: order.unit_price,
            });
        }
        if !seen_orders.insert(order.id) {
            return Err(DistributionError::DuplicateOrder(order.id));
        }
    }

    let mut seen_offers = HashSet::with_capacity(offers.len());
    for offer in offers {
        if offer.quantity.is_negative() {
            return Err(DistributionError::NegativeOfferQuantity {
                offer: offer.id,
                quantity: offer.quantity,
            });
        }
        if let (Some(start), Some(end)) = (offer.start_date, offer.end_date) {
            if end < start {
                return Err(DistributionError::InvalidOfferWindow {
                    offer: offer.id,
                    start,
                    end,
                });
            }
        }
        if !seen_offers.insert(offer.id) {
            return Err(DistributionError::DuplicateOffer(offer.id));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CooperatedId;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn order(id: i64, product: i64, quantity: &str) -> OrderView {
        OrderView::new(OrderId::new(id), ProductId::new(product), q(quantity), q("1"))
    }

    fn offer(id: i64, product: i64, quantity: &str) -> OfferView {
        OfferView::new(
            OfferId::new(id),
            ProductId::new(product),
            CooperatedId::new(id * 10),
            q(quantity),
        )
    }

    #[test]
    fn test_groups_preserve_input_order() {
        let orders = vec![order(3, 2, "1"), order(1, 1, "1"), order(2, 2, "1")];
        let offers = vec![offer(9, 2, "1"), offer(8, 3, "1"), offer(7, 2, "1")];

        let index = SnapshotIndex::build(&orders, &offers);

        assert_eq!(index.products(), &[ProductId::new(2), ProductId::new(1)]);
        assert_eq!(
            index.orders_of(ProductId::new(2)),
            &[OrderId::new(3), OrderId::new(2)]
        );
        assert_eq!(
            index.offers_of(ProductId::new(2)),
            &[OfferId::new(9), OfferId::new(7)]
        );
        assert!(index.offers_of(ProductId::new(1)).is_empty());
        assert_eq!(index.order_count(), 3);
        assert_eq!(index.offer_count(), 3);
        assert_eq!(index.offer(OfferId::new(8)).unwrap().product_id, ProductId::new(3));
    }

    #[test]
    fn test_remaining_book_starts_full() {
        let orders = vec![order(1, 1, "4.5"), order(2, 1, "2")];
        let offers = vec![offer(1, 1, "3")];
        let book = RemainingBook::from_snapshot(&orders, &offers);

        assert_eq!(book.order(OrderId::new(1)), q("4.5"));
        assert_eq!(book.offer(OfferId::new(1)), q("3"));
        assert_eq!(book.order(OrderId::new(99)), Quantity::ZERO);
        assert_eq!(book.total_order_remaining().unwrap(), q("6.5"));
        assert_eq!(book.total_offer_remaining().unwrap(), q("3"));
    }

    #[test]
    fn test_validation_rejects_bad_records() {
        let good_orders = vec![order(1, 1, "1")];
        let good_offers = vec![offer(1, 1, "1")];
        assert!(validate_snapshot(&good_orders, &good_offers).is_ok());

        let err = validate_snapshot(&[order(1, 1, "-1")], &good_offers).unwrap_err();
        assert!(matches!(err, DistributionError::NegativeOrderQuantity { .. }));

        let err = validate_snapshot(&good_orders, &[offer(1, 1, "-2")]).unwrap_err();
        assert!(matches!(err, DistributionError::NegativeOfferQuantity { .. }));

        let err = validate_snapshot(&[order(1, 1, "1"), order(1, 2, "1")], &[]).unwrap_err();
        assert_eq!(err, DistributionError::DuplicateOrder(OrderId::new(1)));

        let err = validate_snapshot(&[], &[offer(5, 1, "1"), offer(5, 1, "1")]).unwrap_err();
        assert_eq!(err, DistributionError::DuplicateOffer(OfferId::new(5)));

        let mut cheap = order(2, 1, "1");
        cheap.unit_price = -q("0.01");
        let err = validate_snapshot(&[cheap], &[]).unwrap_err();
        assert!(matches!(err, DistributionError::NegativeUnitPrice { .. }));
    }

    #[test]
    fn test_validation_rejects_inverted_offer_window() {
        let day = |d| chrono::NaiveDate::from_ymd_opt(2026, 3, d).unwrap();

        let single_day = offer(1, 1, "1").with_window(day(5), day(5));
        assert!(validate_snapshot(&[], &[single_day]).is_ok());

        let inverted = offer(2, 1, "1").with_window(day(9), day(2));
        let err = validate_snapshot(&[], &[inverted]).unwrap_err();
        assert_eq!(
            err,
            DistributionError::InvalidOfferWindow {
                offer: OfferId::new(2),
                start: day(9),
                end: day(2),
            }
        );
    }

    #[test]
    fn test_validation_accepts_exhausted_records() {
        let orders = vec![order(1, 1, "0"), order(2, 2, "3")];
        let offers = vec![offer(1, 1, "0"), offer(2, 2, "0.00")];

        assert!(validate_snapshot(&orders, &offers).is_ok());
    }
}
