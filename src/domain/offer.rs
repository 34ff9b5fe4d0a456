// ============================================================================
// Offer Domain Model
// ============================================================================

use super::{CooperatedId, OfferId, ProductId};
use crate::numeric::Quantity;
use chrono::NaiveDate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Read-only view of one producer supply offer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OfferView {
    pub id: OfferId,
    pub product_id: ProductId,
    pub cooperated_id: CooperatedId,
    /// Offered quantity
    pub quantity: Quantity,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl OfferView {
    pub fn new(
        id: OfferId,
        product_id: ProductId,
        cooperated_id: CooperatedId,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            product_id,
            cooperated_id,
            quantity,
            start_date: None,
            end_date: None,
        }
    }

    /// Set the supply window of the offer.
    ///
    /// The window is not checked here; input validation rejects offers whose
    /// `end` precedes `start`.
    pub fn with_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }
}

// ============================================================================
// Offer Status Machine
// ============================================================================

pub mod status {
    use crate::error::{DistributionError, DistributionResult};
    use crate::numeric::Quantity;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    /// Lifecycle of a persistent offer record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
    pub enum OfferStatus {
        NotAllocated,
        PartiallyAllocated,
        Allocated,
        Fulfilled,
        Cancelled,
    }

    impl OfferStatus {
        pub fn as_str(&self) -> &'static str {
            match self {
                OfferStatus::NotAllocated => "NOT_ALLOCATED",
                OfferStatus::PartiallyAllocated => "PARTIALLY_ALLOCATED",
                OfferStatus::Allocated => "ALLOCATED",
                OfferStatus::Fulfilled => "FULFILLED",
                OfferStatus::Cancelled => "CANCELLED",
            }
        }

        /// Offers a caller should include in a distribution snapshot.
        pub fn available_for_distribution(&self) -> bool {
            matches!(
                self,
                OfferStatus::NotAllocated | OfferStatus::PartiallyAllocated
            )
        }

        /// Offers that may still be referenced by a distribution record.
        pub fn accepts_distribution(&self) -> bool {
            !matches!(self, OfferStatus::Fulfilled | OfferStatus::Cancelled)
        }

        pub fn for_allocation(allocated: Quantity, offered: Quantity) -> Self {
            if !allocated.is_positive() {
                OfferStatus::NotAllocated
            } else if allocated >= offered {
                OfferStatus::Allocated
            } else {
                OfferStatus::PartiallyAllocated
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum OfferStatusTransition {
        PartialAllocation,
        FullAllocation,
        Release,
        /// Goods delivered
        Fulfil,
        Cancel,
    }

    impl OfferStatusTransition {
        pub fn as_str(&self) -> &'static str {
            match self {
                OfferStatusTransition::PartialAllocation => "partial-allocation",
                OfferStatusTransition::FullAllocation => "full-allocation",
                OfferStatusTransition::Release => "release",
                OfferStatusTransition::Fulfil => "fulfil",
                OfferStatusTransition::Cancel => "cancel",
            }
        }
    }

    impl OfferStatus {
        pub fn transition(&self, transition: OfferStatusTransition) -> DistributionResult<OfferStatus> {
            use OfferStatus::*;
            use OfferStatusTransition::*;

            match (self, transition) {
                (NotAllocated | PartiallyAllocated | Allocated, PartialAllocation) => {
                    Ok(PartiallyAllocated)
                },
                (NotAllocated | PartiallyAllocated | Allocated, FullAllocation) => Ok(Allocated),
                (PartiallyAllocated | Allocated, Release) => Ok(NotAllocated),

                (PartiallyAllocated | Allocated, Fulfil) => Ok(Fulfilled),

                (NotAllocated | PartiallyAllocated | Allocated, Cancel) => Ok(Cancelled),

                _ => Err(DistributionError::InvalidTransition {
                    from: self.as_str(),
                    via: transition.as_str(),
                }),
            }
        }
    }
}
