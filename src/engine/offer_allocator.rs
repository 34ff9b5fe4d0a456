// ============================================================================
// Offer Allocator
// Supply-side water-filling: how much each offer contributes to a product
// ============================================================================

use crate::domain::OfferId;
use crate::numeric::{NumericResult, Quantity};

/// Quantity each offer contributes to one product's demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyAllocation {
    /// One entry per offer, in the product's offer input order
    pub contributions: Vec<(OfferId, Quantity)>,
    /// Demand the offers could not cover (no supply left or truncation)
    pub uncovered: Quantity,
}

impl SupplyAllocation {
    pub fn contribution(&self, offer_id: OfferId) -> Quantity {
        self.contributions
            .iter()
            .find(|(id, _)| *id == offer_id)
            .map(|(_, quantity)| *quantity)
            .unwrap_or_default()
    }

    pub fn total(&self) -> NumericResult<Quantity> {
        Quantity::checked_sum(self.contributions.iter().map(|(_, quantity)| *quantity))
    }
}

struct WorkingOffer {
    /// Position in the input (and in `contributions`)
    slot: usize,
    remaining: Quantity,
}

/// Spread `demand` over `offers` by water-filling.
///
/// Offers are visited from the scarcest to the most plentiful (stable on
/// ties). While every listed offer can give the scarcest one's whole
/// remaining supply without covering the demand, each gives exactly that and
/// the scarcest offer drops out. Once that would overshoot, the remaining
/// demand is split evenly (truncated to cents) and the pass ends; a sub-cent
/// residual stays uncovered.
///
/// # Example
/// ```text
/// Demand 10, offers [2, 3, 100]:
///   2 * 3 =  6 < 10  -> each gives 2, demand 4, offers [1, 98]
///   1 * 2 =  2 <  4  -> each gives 1, demand 2, offers [97]
///  97 * 1 = 97 >= 2  -> split 2 / 1 = 2
/// Contributions: [2, 3, 5]
/// ```
pub fn allocate_offers(
    offers: &[(OfferId, Quantity)],
    demand: Quantity,
) -> NumericResult<SupplyAllocation> {
    let mut contributions: Vec<(OfferId, Quantity)> =
        offers.iter().map(|&(id, _)| (id, Quantity::ZERO)).collect();

    let mut working: Vec<WorkingOffer> = offers
        .iter()
        .enumerate()
        .filter(|(_, (_, remaining))| remaining.is_positive())
        .map(|(slot, &(_, remaining))| WorkingOffer { slot, remaining })
        .collect();
    // Stable: equal remaining keeps input order
    working.sort_by_key(|offer| offer.remaining);

    let mut demand = demand;
    // Everything before `head` is exhausted; uniform decrements keep the tail sorted
    let mut head = 0;

    while demand.is_positive() && head < working.len() {
        let active = &mut working[head..];
        let n = active.len() as i64;
        let min_remaining = active[0].remaining;

        if min_remaining.checked_mul_int(n)? < demand {
            give(active, &mut contributions, min_remaining)?;
            demand = demand.checked_sub(min_remaining.checked_mul_int(n)?)?;

            while head < working.len() && !working[head].remaining.is_positive() {
                head += 1;
            }
        } else {
            let share = demand.checked_div_int(n)?;
            give(active, &mut contributions, share)?;
            demand = demand.checked_sub(share.checked_mul_int(n)?)?;
            break;
        }
    }

    tracing::trace!(uncovered = %demand, "offer allocation finished");

    Ok(SupplyAllocation {
        contributions,
        uncovered: demand,
    })
}

/// Take `step` from every active offer
fn give(
    active: &mut [WorkingOffer],
    contributions: &mut [(OfferId, Quantity)],
    step: Quantity,
) -> NumericResult<()> {
    for offer in active.iter_mut() {
        offer.remaining = offer.remaining.checked_sub(step)?;
        let contribution = &mut contributions[offer.slot].1;
        *contribution = contribution.checked_add(step)?;
    }
    Ok(())
}
