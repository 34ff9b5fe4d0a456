// ============================================================================
// Engine Module
// Contains the allocation passes and the pipeline driver
// ============================================================================

mod assembler;
mod distribution_engine;
mod ledger;
mod offer_allocator;
mod order_allocator;
mod snapshot;
mod verification;

pub mod factory;

pub use assembler::{DistributionRun, ProductAllocation, ProductOutcome, ProposalAssembler};
pub use distribution_engine::{run_distribution, run_redistribution, DistributionEngine};
pub use factory::{create_from_config, DistributionEngineBuilder};
pub use ledger::ProductLedger;
pub use offer_allocator::{allocate_offers, SupplyAllocation};
pub use order_allocator::allocate_orders;
pub use snapshot::{validate_snapshot, RemainingBook, SnapshotIndex};
pub use verification::{check_altered, verify_proposals};
