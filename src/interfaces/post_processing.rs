// ============================================================================
// Post-Processing Interfaces
// Stages applied to a proposal after the allocation pass
// ============================================================================

use crate::domain::DistributionProposal;
use crate::error::DistributionResult;

/// Equity adjustment applied to every proposal before it is returned.
///
/// No fairness policy is prescribed; the default stage returns the proposal
/// unchanged so the allocator output can be inspected on its own.
pub trait EquityAdjustment: Send + Sync {
    /// Adjust a complete proposal
    fn adjust(
        &self,
        proposals: Vec<DistributionProposal>,
    ) -> DistributionResult<Vec<DistributionProposal>>;

    /// Stage name for logging
    fn name(&self) -> &str;
}

/// Returns the proposal unchanged
pub struct IdentityEquity;

impl EquityAdjustment for IdentityEquity {
    fn adjust(
        &self,
        proposals: Vec<DistributionProposal>,
    ) -> DistributionResult<Vec<DistributionProposal>> {
        Ok(proposals)
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// Merges a caller-edited proposal with the proposal it was derived from.
pub trait Reconciler: Send + Sync {
    fn reconcile(
        &self,
        original: &[DistributionProposal],
        altered: Vec<DistributionProposal>,
    ) -> DistributionResult<Vec<DistributionProposal>>;

    fn name(&self) -> &str;
}

/// Takes the edited proposal as the new truth
pub struct AcceptAltered;

impl Reconciler for AcceptAltered {
    fn reconcile(
        &self,
        _original: &[DistributionProposal],
        altered: Vec<DistributionProposal>,
    ) -> DistributionResult<Vec<DistributionProposal>> {
        Ok(altered)
    }

    fn name(&self) -> &str {
        "accept-altered"
    }
}
