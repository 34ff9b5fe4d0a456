// ============================================================================
// Distribution Engine Library
// Fair-share allocation of producer supply to client demand
// ============================================================================

//! # Distribution Engine
//!
//! Computes how a cooperative's producer offers are split over open client
//! orders, product by product.
//!
//! ## Features
//!
//! - **Two-stage water-filling**: offers are drained scarcest-first, then
//!   each offer's share is spread evenly over the product's orders
//! - **Exact fixed-point arithmetic** truncated to cents, so no offer or
//!   order is ever over-allocated
//! - **Deterministic output**: same snapshot, same proposals, in the same
//!   order, sequential or parallel
//! - **Pluggable post-processing** (equity adjustment, reconciliation of
//!   manual edits) and event handlers
//!
//! ## Example
//!
//! ```rust
//! use distribution_engine::prelude::*;
//! use distribution_engine::numeric::Quantity;
//! use std::sync::Arc;
//!
//! let orders = vec![OrderView::new(
//!     OrderId::new(1),
//!     ProductId::new(7),
//!     "10".parse::<Quantity>().unwrap(),
//!     "5.00".parse().unwrap(),
//! )];
//! let offers = vec![
//!     OfferView::new(OfferId::new(1), ProductId::new(7), CooperatedId::new(3), "4".parse().unwrap()),
//!     OfferView::new(OfferId::new(2), ProductId::new(7), CooperatedId::new(4), "20".parse().unwrap()),
//! ];
//!
//! let engine = DistributionEngine::new(DistributionConfig::strict(), Arc::new(NoOpEventHandler));
//! let proposals = engine.run_distribution(&orders, &offers).unwrap();
//!
//! // The smaller offer is drained, the larger one covers the rest
//! assert_eq!(proposals.len(), 2);
//! assert_eq!(proposals[0].quantity.to_string(), "4.00");
//! assert_eq!(proposals[1].quantity.to_string(), "6.00");
//!
//! let summary = DistributionSummary::build(&orders, &offers, &proposals).unwrap();
//! assert_eq!(summary.orders[0].status, OrderStatus::Filled);
//! ```

pub mod domain;
pub mod engine;
pub mod error;
pub mod interfaces;
#[cfg(feature = "logging")]
pub mod logging;
pub mod numeric;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        ClientId, CooperatedId, DistributionConfig, DistributionProposal, DistributionSummary,
        ExecutionMode, OfferId, OfferStatus, OfferStatusTransition, OfferView, OrderId,
        OrderStatus, OrderStatusTransition, OrderView, ProductId,
    };
    pub use crate::engine::{
        create_from_config, run_distribution, run_redistribution, DistributionEngine,
        DistributionEngineBuilder, DistributionRun,
    };
    pub use crate::error::{DistributionError, DistributionResult};
    pub use crate::interfaces::{
        AcceptAltered, DistributionEvent, EquityAdjustment, EventHandler, IdentityEquity,
        LoggingEventHandler, NoOpEventHandler, Reconciler, RecordingEventHandler, SkipReason,
    };
}
