// ============================================================================
// Order Allocator
// Demand-side water-filling: spreads one offer's contribution over orders
// ============================================================================

use super::ledger::ProductLedger;
use super::snapshot::SnapshotIndex;
use crate::domain::{DistributionProposal, OfferView, OrderId};
use crate::error::{DistributionError, DistributionResult};
use crate::numeric::Quantity;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Spread `allocated` units of `offer` evenly over the product's orders.
///
/// Each pass splits what is left of the allocation into equal shares
/// (truncated to cents) over the orders that still need something; an order
/// takes at most what it needs. Whatever capped orders left behind is
/// re-split over the remaining orders on the next pass. The pass loop ends
/// when the allocation is used up, every order is satisfied, or a share
/// truncates to zero.
///
/// Everything one offer gives to one order is merged into a single proposal,
/// emitted in the order the pairs were first matched.
///
/// # Example
/// ```text
/// Offer gives 10, orders need [2, 20]:
///   pass 1: share 5  -> order A takes 2, order B takes 5 (3 left)
///   pass 2: share 3  -> order B takes 3
/// Proposals: A = 2, B = 8
/// ```
pub fn allocate_orders(
    offer: &OfferView,
    allocated: Quantity,
    order_ids: &[OrderId],
    index: &SnapshotIndex<'_>,
    ledger: &mut ProductLedger,
) -> DistributionResult<Vec<DistributionProposal>> {
    let mut allocated = allocated;
    let mut active: SmallVec<[OrderId; 16]> = order_ids
        .iter()
        .copied()
        .filter(|&id| ledger.order_remaining(id).is_positive())
        .collect();

    let mut matched: SmallVec<[(OrderId, Quantity); 16]> = SmallVec::new();
    let mut slots: HashMap<OrderId, usize> = HashMap::new();

    while allocated.is_positive() && !active.is_empty() {
        let share = allocated.checked_div_int(active.len() as i64)?;
        if !share.is_positive() {
            tracing::trace!(
                offer = %offer.id,
                residual = %allocated,
                active = active.len(),
                "share truncated to zero"
            );
            break;
        }

        for &order_id in &active {
            let quantity = share.min(ledger.order_remaining(order_id));
            if !quantity.is_positive() {
                continue;
            }

            allocated = allocated.checked_sub(quantity)?;
            ledger.consume(offer.id, order_id, quantity)?;

            match slots.get(&order_id) {
                Some(&slot) => {
                    let total = &mut matched[slot].1;
                    *total = total.checked_add(quantity)?;
                },
                None => {
                    slots.insert(order_id, matched.len());
                    matched.push((order_id, quantity));
                },
            }
        }

        active.retain(|id| ledger.order_remaining(*id).is_positive());
    }

    matched
        .into_iter()
        .map(|(order_id, quantity)| {
            let order = index.order(order_id).ok_or_else(|| {
                DistributionError::InvariantViolation(format!(
                    "{order_id} is grouped under a product but missing from the snapshot"
                ))
            })?;
            Ok(DistributionProposal::new(
                offer.id,
                order_id,
                offer.cooperated_id,
                quantity,
                order.value_of(quantity)?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CooperatedId, OfferId, OrderView, ProductId};
    use crate::engine::snapshot::RemainingBook;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn orders(needs: &[(&str, &str)]) -> Vec<OrderView> {
        needs
            .iter()
            .enumerate()
            .map(|(i, (quantity, price))| {
                OrderView::new(OrderId::new(i as i64 + 1), ProductId::new(1), q(quantity), q(price))
            })
            .collect()
    }

    fn offer(quantity: &str) -> OfferView {
        OfferView::new(OfferId::new(1), ProductId::new(1), CooperatedId::new(5), q(quantity))
    }

    fn run(orders: &[OrderView], offers: &[OfferView], allocated: &str) -> (Vec<DistributionProposal>, ProductLedger) {
        let index = SnapshotIndex::build(orders, offers);
        let book = RemainingBook::from_snapshot(orders, offers);
        let mut ledger = ProductLedger::open(&index, &book, ProductId::new(1));
        let proposals = allocate_orders(
            &offers[0],
            q(allocated),
            index.orders_of(ProductId::new(1)),
            &index,
            &mut ledger,
        )
        .unwrap();
        (proposals, ledger)
    }

    #[test]
    fn test_single_order_takes_everything() {
        let orders = orders(&[("10", "5.00")]);
        let offers = vec![offer("10")];
        let (proposals, ledger) = run(&orders, &offers, "10");

        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].quantity, q("10"));
        assert_eq!(proposals[0].total_value, q("50"));
        assert_eq!(proposals[0].cooperated_id, CooperatedId::new(5));
        assert_eq!(ledger.order_remaining(OrderId::new(1)), Quantity::ZERO);
        assert_eq!(ledger.offer_remaining(OfferId::new(1)), Quantity::ZERO);
    }

    #[test]
    fn test_capped_share_is_resplit_and_merged() {
        let orders = orders(&[("2", "1"), ("20", "1")]);
        let offers = vec![offer("10")];
        let (proposals, ledger) = run(&orders, &offers, "10");

        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].order_id, OrderId::new(1));
        assert_eq!(proposals[0].quantity, q("2"));
        assert_eq!(proposals[1].order_id, OrderId::new(2));
        assert_eq!(proposals[1].quantity, q("8"));
        assert_eq!(ledger.order_remaining(OrderId::new(2)), q("12"));
    }

    #[test]
    fn test_merged_value_truncates_once() {
        let orders = orders(&[("1", "0.99"), ("20", "0.99")]);
        let offers = vec![offer("20")];
        // pass 1: share 5.01, order 1 capped at 1; pass 2: order 2 takes 4.02
        let (proposals, _) = run(&orders, &offers, "10.03");

        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[1].order_id, OrderId::new(2));
        assert_eq!(proposals[1].quantity, q("9.03"));
        // 9.03 * 0.99 = 8.9397; per-pass 4.95 + 3.97 would give 8.92
        assert_eq!(proposals[1].total_value, q("8.93"));
    }

    #[test]
    fn test_zero_share_stops_with_residual() {
        let orders = orders(&[("5", "1"), ("5", "1"), ("5", "1")]);
        let offers = vec![offer("1")];
        let (proposals, ledger) = run(&orders, &offers, "0.02");

        assert!(proposals.is_empty());
        assert_eq!(ledger.offer_remaining(OfferId::new(1)), q("1"));
    }

    #[test]
    fn test_uneven_split_truncates() {
        let orders = orders(&[("5", "1"), ("5", "1"), ("5", "1")]);
        let offers = vec![offer("1")];
        let (proposals, _) = run(&orders, &offers, "1");

        // 1 / 3 = 0.33 each, 0.01 left; 0.01 / 3 truncates to zero
        let quantities: Vec<_> = proposals.iter().map(|p| p.quantity).collect();
        assert_eq!(quantities, vec![q("0.33"), q("0.33"), q("0.33")]);
    }

    #[test]
    fn test_total_value_truncates() {
        let orders = orders(&[("10", "1.99")]);
        let offers = vec![offer("10")];
        let (proposals, _) = run(&orders, &offers, "3.33");

        // 3.33 * 1.99 = 6.6267
        assert_eq!(proposals[0].total_value, q("6.62"));
    }

    #[test]
    fn test_satisfied_orders_are_skipped() {
        let orders = orders(&[("1", "1"), ("1", "1")]);
        let offers = vec![offer("5")];
        let (proposals, ledger) = run(&orders, &offers, "5");

        assert_eq!(proposals.len(), 2);
        // Demand ran out before the allocation did
        assert_eq!(ledger.offer_remaining(OfferId::new(1)), q("3"));
    }
}
