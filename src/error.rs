//! Error types of the distribution engine.
//!
//! Well-formed snapshots never produce an error. Everything here is either a
//! precondition violation on the caller's input, an arithmetic overflow, or a
//! failure of an injected collaborator.

use crate::domain::{OfferId, OrderId};
use crate::numeric::{Money, NumericError, Quantity};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by the distribution pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DistributionError {
    /// Fixed-point arithmetic failed (overflow, division by zero)
    #[error("arithmetic error: {0}")]
    Numeric(#[from] NumericError),

    /// An order in the snapshot has a negative remaining quantity
    #[error("{order} has negative quantity {quantity}")]
    NegativeOrderQuantity { order: OrderId, quantity: Quantity },

    /// An offer in the snapshot has a negative remaining quantity
    #[error("{offer} has negative quantity {quantity}")]
    NegativeOfferQuantity { offer: OfferId, quantity: Quantity },

    /// An order in the snapshot has a negative unit price
    #[error("{order} has negative unit price {price}")]
    NegativeUnitPrice { order: OrderId, price: Money },

    /// An offer's supply window ends before it starts
    #[error("{offer} window ends {end} before it starts {start}")]
    InvalidOfferWindow {
        offer: OfferId,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// The same order id appears twice in the snapshot
    #[error("duplicate {0} in order snapshot")]
    DuplicateOrder(OrderId),

    /// The same offer id appears twice in the snapshot
    #[error("duplicate {0} in offer snapshot")]
    DuplicateOffer(OfferId),

    /// An edited proposal carries a zero or negative quantity
    #[error("proposal {offer} -> {order} has non-positive quantity {quantity}")]
    NonPositiveProposal {
        offer: OfferId,
        order: OrderId,
        quantity: Quantity,
    },

    /// An edited proposal repeats an (offer, order) pair
    #[error("duplicate proposal {offer} -> {order}")]
    DuplicateProposal { offer: OfferId, order: OrderId },

    /// The computed proposal breaks a capacity, demand or pairing invariant
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A status change is not allowed by the record state machine
    #[error("invalid status transition from {from} via {via}")]
    InvalidTransition {
        from: &'static str,
        via: &'static str,
    },

    /// Engine configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A product worker thread panicked
    #[error("distribution worker panicked: {0}")]
    WorkerPanicked(String),

    /// An injected post-processing stage failed
    #[error("post-processing stage '{stage}' failed: {reason}")]
    Stage { stage: String, reason: String },
}

/// Result alias used throughout the crate.
pub type DistributionResult<T> = Result<T, DistributionError>;
