// ============================================================================
// Proposal Assembler
// Commits per-product results into one run, in product order
// ============================================================================

use super::ledger::ProductLedger;
use super::snapshot::RemainingBook;
use crate::domain::{DistributionProposal, ProductId};
use crate::error::DistributionResult;
use crate::interfaces::{DistributionEvent, SkipReason};
use crate::numeric::Quantity;
use chrono::Utc;
use uuid::Uuid;

/// What one product produced during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductOutcome {
    /// Nothing was allocated and nothing needs committing
    Skipped {
        product_id: ProductId,
        reason: SkipReason,
    },

    /// The product went through both allocators
    Allocated(ProductAllocation),
}

impl ProductOutcome {
    pub fn product_id(&self) -> ProductId {
        match self {
            ProductOutcome::Skipped { product_id, .. } => *product_id,
            ProductOutcome::Allocated(allocation) => allocation.ledger.product_id(),
        }
    }
}

/// Proposals and consumed quantities of one allocated product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductAllocation {
    /// Offers of the product that still had supply
    pub offers: usize,
    /// Remaining demand when the product was opened
    pub demand: Quantity,
    /// Sum of the product's proposal quantities
    pub allocated: Quantity,
    /// `demand - allocated`
    pub residual: Quantity,
    pub proposals: Vec<DistributionProposal>,
    pub ledger: ProductLedger,
}

/// Result of the allocation pass, before any post-processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionRun {
    pub run_id: Uuid,
    /// Every proposal in emission order
    pub proposals: Vec<DistributionProposal>,
    /// Remaining quantities after the run
    pub remaining: RemainingBook,
    pub total_quantity: Quantity,
    /// Demand left uncovered, summed over allocated products
    pub uncovered: Quantity,
}

/// Owns the run's [`RemainingBook`] and collects product results.
///
/// Products must be committed in product order; the assembler appends
/// proposals as it receives them and never merges across products.
pub struct ProposalAssembler {
    run_id: Uuid,
    book: RemainingBook,
    proposals: Vec<DistributionProposal>,
    total_quantity: Quantity,
    uncovered: Quantity,
}

impl ProposalAssembler {
    pub fn new(run_id: Uuid, book: RemainingBook) -> Self {
        Self {
            run_id,
            book,
            proposals: Vec::new(),
            total_quantity: Quantity::ZERO,
            uncovered: Quantity::ZERO,
        }
    }

    /// Current remaining quantities
    pub fn book(&self) -> &RemainingBook {
        &self.book
    }

    /// Append one product's result and describe it as an event
    pub fn commit(&mut self, outcome: ProductOutcome) -> DistributionResult<DistributionEvent> {
        match outcome {
            ProductOutcome::Skipped { product_id, reason } => {
                Ok(DistributionEvent::ProductSkipped {
                    run_id: self.run_id,
                    product_id,
                    reason,
                    timestamp: Utc::now(),
                })
            },
            ProductOutcome::Allocated(allocation) => {
                let product_id = allocation.ledger.product_id();
                let proposal_count = allocation.proposals.len();

                self.total_quantity = self.total_quantity.checked_add(allocation.allocated)?;
                self.uncovered = self.uncovered.checked_add(allocation.residual)?;
                self.proposals.extend(allocation.proposals);
                allocation.ledger.commit(&mut self.book);

                Ok(DistributionEvent::ProductAllocated {
                    run_id: self.run_id,
                    product_id,
                    offers: allocation.offers,
                    demand: allocation.demand,
                    allocated: allocation.allocated,
                    residual: allocation.residual,
                    proposals: proposal_count,
                    timestamp: Utc::now(),
                })
            },
        }
    }

    pub fn finish(self) -> DistributionRun {
        DistributionRun {
            run_id: self.run_id,
            proposals: self.proposals,
            remaining: self.book,
            total_quantity: self.total_quantity,
            uncovered: self.uncovered,
        }
    }
}
