// ============================================================================
// Distribution Proposal Domain Model
// ============================================================================

use super::{CooperatedId, OfferId, OrderId};
use crate::numeric::{Money, Quantity};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A proposed allocation of quantity from one offer to one order.
///
/// Proposals are pure outputs; `id` stays `None` until the caller persists
/// them as distribution records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistributionProposal {
    pub id: Option<i64>,
    pub offer_id: OfferId,
    pub order_id: OrderId,
    /// Producer behind the offer
    pub cooperated_id: CooperatedId,
    pub quantity: Quantity,
    /// `quantity × unit_price` of the order, truncated to cents
    pub total_value: Money,
}

impl DistributionProposal {
    pub fn new(
        offer_id: OfferId,
        order_id: OrderId,
        cooperated_id: CooperatedId,
        quantity: Quantity,
        total_value: Money,
    ) -> Self {
        Self {
            id: None,
            offer_id,
            order_id,
            cooperated_id,
            quantity,
            total_value,
        }
    }

    /// The (offer, order) pair this proposal links.
    pub fn pair(&self) -> (OfferId, OrderId) {
        (self.offer_id, self.order_id)
    }
}

impl fmt::Display for DistributionProposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {} ({})",
            self.offer_id, self.order_id, self.quantity, self.total_value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_creation() {
        let proposal = DistributionProposal::new(
            OfferId::new(1),
            OrderId::new(2),
            CooperatedId::new(3),
            "5".parse().unwrap(),
            "25".parse().unwrap(),
        );

        assert_eq!(proposal.id, None);
        assert_eq!(proposal.pair(), (OfferId::new(1), OrderId::new(2)));
        assert_eq!(proposal.to_string(), "offer#1 -> order#2: 5.00 (25.00)");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_proposal_json_shape() {
        let proposal = DistributionProposal::new(
            OfferId::new(1),
            OrderId::new(2),
            CooperatedId::new(3),
            "5".parse().unwrap(),
            "25".parse().unwrap(),
        );

        let json = serde_json::to_value(&proposal).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": null,
                "offer_id": 1,
                "order_id": 2,
                "cooperated_id": 3,
                "quantity": "5.00",
                "total_value": "25.00",
            })
        );
    }
}
