// ============================================================================
// Proposal Verification
// Consistency checks on computed and edited proposals
// ============================================================================

use super::snapshot::SnapshotIndex;
use crate::domain::{DistributionProposal, OfferId, OrderId};
use crate::error::{DistributionError, DistributionResult};
use crate::numeric::Quantity;
use std::collections::{HashMap, HashSet};

fn violation(message: String) -> DistributionError {
    DistributionError::InvariantViolation(message)
}

/// Check a computed proposal against the snapshot it came from.
///
/// Every entry must have a positive quantity, reference a known offer and
/// order of the same product, carry the offer's producer and the truncated
/// value of its quantity, and appear at most once per (offer, order) pair.
/// Per offer the quantities may not exceed the offer's quantity, per order
/// they may not exceed the order's quantity.
pub fn verify_proposals(
    index: &SnapshotIndex<'_>,
    proposals: &[DistributionProposal],
) -> DistributionResult<()> {
    let mut pairs = HashSet::with_capacity(proposals.len());
    let mut by_offer: HashMap<OfferId, Quantity> = HashMap::new();
    let mut by_order: HashMap<OrderId, Quantity> = HashMap::new();

    for proposal in proposals {
        if !proposal.quantity.is_positive() {
            return Err(violation(format!("{proposal} has a non-positive quantity")));
        }

        let offer = index
            .offer(proposal.offer_id)
            .ok_or_else(|| violation(format!("{proposal} references an unknown offer")))?;
        let order = index
            .order(proposal.order_id)
            .ok_or_else(|| violation(format!("{proposal} references an unknown order")))?;

        if offer.product_id != order.product_id {
            return Err(violation(format!(
                "{proposal} pairs {} with {}",
                offer.product_id, order.product_id
            )));
        }
        if offer.cooperated_id != proposal.cooperated_id {
            return Err(violation(format!(
                "{proposal} names {} but the offer belongs to {}",
                proposal.cooperated_id, offer.cooperated_id
            )));
        }
        if proposal.total_value != order.value_of(proposal.quantity)? {
            return Err(violation(format!(
                "{proposal} does not match unit price {}",
                order.unit_price
            )));
        }
        if !pairs.insert(proposal.pair()) {
            return Err(violation(format!("{proposal} repeats an (offer, order) pair")));
        }

        let offer_total = by_offer.entry(offer.id).or_default();
        *offer_total = offer_total.checked_add(proposal.quantity)?;
        if *offer_total > offer.quantity {
            return Err(violation(format!(
                "{} allocates {} out of {}",
                offer.id, offer_total, offer.quantity
            )));
        }

        let order_total = by_order.entry(order.id).or_default();
        *order_total = order_total.checked_add(proposal.quantity)?;
        if *order_total > order.quantity {
            return Err(violation(format!(
                "{} receives {} but asked for {}",
                order.id, order_total, order.quantity
            )));
        }
    }

    Ok(())
}

/// Check a caller-edited proposal before reconciliation.
///
/// Stored proposals require a positive quantity and a unique (offer, order)
/// pair; nothing else is assumed about the edit.
pub fn check_altered(altered: &[DistributionProposal]) -> DistributionResult<()> {
    let mut pairs = HashSet::with_capacity(altered.len());

    for proposal in altered {
        if !proposal.quantity.is_positive() {
            return Err(DistributionError::NonPositiveProposal {
                offer: proposal.offer_id,
                order: proposal.order_id,
                quantity: proposal.quantity,
            });
        }
        if !pairs.insert(proposal.pair()) {
            return Err(DistributionError::DuplicateProposal {
                offer: proposal.offer_id,
                order: proposal.order_id,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CooperatedId, OfferView, OrderView, ProductId};

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn snapshot() -> (Vec<OrderView>, Vec<OfferView>) {
        let orders = vec![
            OrderView::new(OrderId::new(1), ProductId::new(1), q("5"), q("2")),
            OrderView::new(OrderId::new(2), ProductId::new(2), q("5"), q("2")),
        ];
        let offers = vec![
            OfferView::new(OfferId::new(1), ProductId::new(1), CooperatedId::new(7), q("3")),
            OfferView::new(OfferId::new(2), ProductId::new(1), CooperatedId::new(8), q("10")),
        ];
        (orders, offers)
    }

    fn proposal(offer: i64, order: i64, cooperated: i64, quantity: &str) -> DistributionProposal {
        let quantity = q(quantity);
        DistributionProposal::new(
            OfferId::new(offer),
            OrderId::new(order),
            CooperatedId::new(cooperated),
            quantity,
            quantity.checked_mul_int(2).unwrap(),
        )
    }

    fn verify(proposals: &[DistributionProposal]) -> DistributionResult<()> {
        let (orders, offers) = snapshot();
        let index = SnapshotIndex::build(&orders, &offers);
        verify_proposals(&index, proposals)
    }

    #[test]
    fn test_consistent_proposal_passes() {
        assert!(verify(&[proposal(1, 1, 7, "3"), proposal(2, 1, 8, "2")]).is_ok());
        assert!(verify(&[]).is_ok());
    }

    #[test]
    fn test_bounds_are_enforced() {
        // Offer 1 only has 3
        assert!(verify(&[proposal(1, 1, 7, "3.01")]).is_err());
        // Order 1 only asked for 5
        assert!(verify(&[proposal(1, 1, 7, "3"), proposal(2, 1, 8, "2.01")]).is_err());
    }

    #[test]
    fn test_pairing_is_enforced() {
        // Cross-product
        assert!(verify(&[proposal(1, 2, 7, "1")]).is_err());
        // Wrong producer
        assert!(verify(&[proposal(1, 1, 8, "1")]).is_err());
        // Repeated pair
        assert!(verify(&[proposal(2, 1, 8, "1"), proposal(2, 1, 8, "1")]).is_err());
        // Unknown ids
        assert!(verify(&[proposal(9, 1, 7, "1")]).is_err());
        // Zero quantity
        assert!(verify(&[proposal(1, 1, 7, "0")]).is_err());
    }

    #[test]
    fn test_value_must_match_price() {
        let mut wrong = proposal(1, 1, 7, "1");
        wrong.total_value = q("2.01");
        let err = verify(&[wrong]).unwrap_err();
        assert!(matches!(err, DistributionError::InvariantViolation(_)));
    }

    #[test]
    fn test_altered_checks() {
        assert!(check_altered(&[proposal(1, 1, 7, "1"), proposal(1, 2, 7, "1")]).is_ok());

        let err = check_altered(&[proposal(1, 1, 7, "0")]).unwrap_err();
        assert!(matches!(err, DistributionError::NonPositiveProposal { .. }));

        let err = check_altered(&[proposal(1, 1, 7, "1"), proposal(1, 1, 7, "2")]).unwrap_err();
        assert_eq!(
            err,
            DistributionError::DuplicateProposal {
                offer: OfferId::new(1),
                order: OrderId::new(1),
            }
        );
    }
}
