// ============================================================================
// Distribution Summary
// Per-record totals and suggested statuses for a computed proposal
// ============================================================================

use super::offer::status::OfferStatus;
use super::order::status::OrderStatus;
use super::{
    CooperatedId, DistributionProposal, OfferId, OfferView, OrderId, OrderView, ProductId,
};
use crate::error::{DistributionError, DistributionResult};
use crate::numeric::{Money, Quantity};
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How much of one order a proposal covers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderAllocation {
    pub order_id: OrderId,
    pub ordered: Quantity,
    pub allocated: Quantity,
    pub remaining: Quantity,
    pub status: OrderStatus,
}

/// How much of one offer a proposal consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OfferAllocation {
    pub offer_id: OfferId,
    pub cooperated_id: CooperatedId,
    pub offered: Quantity,
    pub allocated: Quantity,
    pub remaining: Quantity,
    pub status: OfferStatus,
}

/// Supply of one producer for one product, across all of its offers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CooperatedSupply {
    pub cooperated_id: CooperatedId,
    pub product_id: ProductId,
    pub offered: Quantity,
    pub allocated: Quantity,
}

/// Aggregated view of a proposal against the snapshot it was computed from.
///
/// Statuses are suggestions for the caller's record lifecycle; nothing here
/// is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistributionSummary {
    /// In snapshot order
    pub orders: Vec<OrderAllocation>,
    /// In snapshot order
    pub offers: Vec<OfferAllocation>,
    /// Sorted by (cooperated, product)
    pub supply: Vec<CooperatedSupply>,
    pub total_quantity: Quantity,
    pub total_value: Money,
}

impl DistributionSummary {
    /// Aggregate `proposals` against `orders` and `offers`.
    ///
    /// # Errors
    /// `InvariantViolation` if a proposal references an id missing from the
    /// snapshot; `Numeric` on overflow.
    pub fn build(
        orders: &[OrderView],
        offers: &[OfferView],
        proposals: &[DistributionProposal],
    ) -> DistributionResult<Self> {
        let mut by_order: HashMap<OrderId, Quantity> = HashMap::with_capacity(orders.len());
        let mut by_offer: HashMap<OfferId, Quantity> = HashMap::with_capacity(offers.len());
        let mut total_quantity = Quantity::ZERO;
        let mut total_value = Money::ZERO;

        for proposal in proposals {
            let order_total = by_order.entry(proposal.order_id).or_default();
            *order_total = order_total.checked_add(proposal.quantity)?;

            let offer_total = by_offer.entry(proposal.offer_id).or_default();
            *offer_total = offer_total.checked_add(proposal.quantity)?;

            total_quantity = total_quantity.checked_add(proposal.quantity)?;
            total_value = total_value.checked_add(proposal.total_value)?;
        }

        let order_allocations = orders
            .iter()
            .map(|order| {
                let allocated = by_order.remove(&order.id).unwrap_or_default();
                Ok(OrderAllocation {
                    order_id: order.id,
                    ordered: order.quantity,
                    allocated,
                    remaining: order.quantity.checked_sub(allocated)?,
                    status: OrderStatus::for_allocation(allocated, order.quantity),
                })
            })
            .collect::<DistributionResult<Vec<_>>>()?;

        let mut supply: BTreeMap<(CooperatedId, ProductId), CooperatedSupply> = BTreeMap::new();
        let mut offer_allocations = Vec::with_capacity(offers.len());
        for offer in offers {
            let allocated = by_offer.remove(&offer.id).unwrap_or_default();

            let entry = supply
                .entry((offer.cooperated_id, offer.product_id))
                .or_insert(CooperatedSupply {
                    cooperated_id: offer.cooperated_id,
                    product_id: offer.product_id,
                    offered: Quantity::ZERO,
                    allocated: Quantity::ZERO,
                });
            entry.offered = entry.offered.checked_add(offer.quantity)?;
            entry.allocated = entry.allocated.checked_add(allocated)?;

            offer_allocations.push(OfferAllocation {
                offer_id: offer.id,
                cooperated_id: offer.cooperated_id,
                offered: offer.quantity,
                allocated,
                remaining: offer.quantity.checked_sub(allocated)?,
                status: OfferStatus::for_allocation(allocated, offer.quantity),
            });
        }

        if let Some(order_id) = by_order.keys().min() {
            return Err(DistributionError::InvariantViolation(format!(
                "proposal references {order_id} which is not in the snapshot"
            )));
        }
        if let Some(offer_id) = by_offer.keys().min() {
            return Err(DistributionError::InvariantViolation(format!(
                "proposal references {offer_id} which is not in the snapshot"
            )));
        }

        Ok(Self {
            orders: order_allocations,
            offers: offer_allocations,
            supply: supply.into_values().collect(),
            total_quantity,
            total_value,
        })
    }

    pub fn order(&self, order_id: OrderId) -> Option<&OrderAllocation> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    pub fn offer(&self, offer_id: OfferId) -> Option<&OfferAllocation> {
        self.offers.iter().find(|o| o.offer_id == offer_id)
    }

    /// Render the summary as JSON for the caller's reporting layer
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
