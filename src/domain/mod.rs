// ============================================================================
// Domain Models Module
// Snapshot views, proposals and record lifecycles
// ============================================================================

pub mod config;
pub mod distribution;
pub mod ids;
pub mod offer;
pub mod order;
pub mod summary;

pub use config::{DistributionConfig, ExecutionMode};
pub use distribution::DistributionProposal;
pub use ids::{ClientId, CooperatedId, OfferId, OrderId, ProductId};
pub use offer::OfferView;
pub use order::OrderView;
pub use summary::{CooperatedSupply, DistributionSummary, OfferAllocation, OrderAllocation};

// Re-export record state machines
pub use offer::status::{OfferStatus, OfferStatusTransition};
pub use order::status::{OrderStatus, OrderStatusTransition};
