// ============================================================================
// Order Domain Model
// ============================================================================

use super::{ClientId, OrderId, ProductId};
use crate::numeric::{Money, NumericResult, Quantity};
use chrono::NaiveDate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Read-only view of one client order, as supplied by the caller.
///
/// The engine never mutates a view; remaining demand is tracked in the
/// engine's own scratch state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderView {
    pub id: OrderId,
    pub product_id: ProductId,
    /// Ordered quantity
    pub quantity: Quantity,
    pub unit_price: Money,
    pub client_id: Option<ClientId>,
    pub delivery_date: Option<NaiveDate>,
}

impl OrderView {
    pub fn new(id: OrderId, product_id: ProductId, quantity: Quantity, unit_price: Money) -> Self {
        Self {
            id,
            product_id,
            quantity,
            unit_price,
            client_id: None,
            delivery_date: None,
        }
    }

    pub fn with_client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn with_delivery_date(mut self, date: NaiveDate) -> Self {
        self.delivery_date = Some(date);
        self
    }

    /// Value of `quantity` units at this order's unit price, truncated to cents.
    pub fn value_of(&self, quantity: Quantity) -> NumericResult<Money> {
        quantity.checked_mul_trunc(self.unit_price)
    }

    /// Value of the whole order.
    pub fn total_value(&self) -> NumericResult<Money> {
        self.value_of(self.quantity)
    }
}

// ============================================================================
// Order Status Machine
// ============================================================================

pub mod status {
    use crate::error::{DistributionError, DistributionResult};
    use crate::numeric::Quantity;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    /// Lifecycle of a persistent order record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
    pub enum OrderStatus {
        Open,
        Partial,
        Filled,
        ClosedPartial,
        ClosedFilled,
        Cancelled,
    }

    impl OrderStatus {
        pub fn as_str(&self) -> &'static str {
            match self {
                OrderStatus::Open => "OPEN",
                OrderStatus::Partial => "PARTIAL",
                OrderStatus::Filled => "FILLED",
                OrderStatus::ClosedPartial => "CLOSED_PARTIAL",
                OrderStatus::ClosedFilled => "CLOSED_FILLED",
                OrderStatus::Cancelled => "CANCELLED",
            }
        }

        pub fn is_terminal(&self) -> bool {
            matches!(
                self,
                OrderStatus::ClosedPartial | OrderStatus::ClosedFilled | OrderStatus::Cancelled
            )
        }

        pub fn is_closed(&self) -> bool {
            matches!(self, OrderStatus::ClosedPartial | OrderStatus::ClosedFilled)
        }

        /// Orders that may still receive distributions.
        pub fn accepts_distribution(&self) -> bool {
            !self.is_terminal()
        }

        /// Status an open order should carry once `allocated` of `ordered` is distributed.
        pub fn for_allocation(allocated: Quantity, ordered: Quantity) -> Self {
            if !allocated.is_positive() {
                OrderStatus::Open
            } else if allocated >= ordered {
                OrderStatus::Filled
            } else {
                OrderStatus::Partial
            }
        }
    }

    /// Valid changes of an order record
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum OrderStatusTransition {
        PartialAllocation,
        FullAllocation,
        /// Every distribution of the order was removed
        Release,
        Close,
        Cancel,
    }

    impl OrderStatusTransition {
        pub fn as_str(&self) -> &'static str {
            match self {
                OrderStatusTransition::PartialAllocation => "partial-allocation",
                OrderStatusTransition::FullAllocation => "full-allocation",
                OrderStatusTransition::Release => "release",
                OrderStatusTransition::Close => "close",
                OrderStatusTransition::Cancel => "cancel",
            }
        }
    }

    impl OrderStatus {
        pub fn transition(&self, transition: OrderStatusTransition) -> DistributionResult<OrderStatus> {
            use OrderStatus::*;
            use OrderStatusTransition::*;

            match (self, transition) {
                (Open | Partial | Filled, PartialAllocation) => Ok(Partial),
                (Open | Partial | Filled, FullAllocation) => Ok(Filled),
                (Partial | Filled, Release) => Ok(Open),

                (Partial, Close) => Ok(ClosedPartial),
                (Filled, Close) => Ok(ClosedFilled),

                (Open | Partial | Filled, Cancel) => Ok(Cancelled),

                _ => Err(DistributionError::InvalidTransition {
                    from: self.as_str(),
                    via: transition.as_str(),
                }),
            }
        }
    }
}
