// ============================================================================
// Distribution Engine Configuration
// Execution mode and the checks applied around the allocation pass
// ============================================================================

use crate::error::{DistributionError, DistributionResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Upper bound on product worker threads
pub const MAX_WORKERS: usize = 256;

// ============================================================================
// Execution Mode
// ============================================================================

/// How products are scheduled within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecutionMode {
    /// One product after another on the calling thread
    Sequential,

    /// Products spread over scoped worker threads.
    /// Results are committed in product order, so output is identical to
    /// `Sequential` for the same snapshot.
    Parallel {
        /// Number of worker threads (1..=MAX_WORKERS)
        workers: usize,
    },
}

// ============================================================================
// Complete Engine Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DistributionConfig {
    pub execution: ExecutionMode,

    /// Reject snapshots with duplicate ids, negative quantities or
    /// negative prices before allocating
    pub validate_input: bool,

    /// Check capacity/demand bounds and pairing of the computed proposal
    /// before handing it to post-processing
    pub verify_output: bool,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl DistributionConfig {
    pub fn new(execution: ExecutionMode) -> Self {
        Self {
            execution,
            validate_input: true,
            verify_output: true,
        }
    }

    /// Builder method: set execution mode
    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    /// Builder method: toggle input validation
    pub fn with_input_validation(mut self, enabled: bool) -> Self {
        self.validate_input = enabled;
        self
    }

    /// Builder method: toggle output verification
    pub fn with_output_verification(mut self, enabled: bool) -> Self {
        self.verify_output = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> DistributionResult<()> {
        if let ExecutionMode::Parallel { workers } = self.execution {
            if workers == 0 {
                return Err(DistributionError::InvalidConfig(
                    "parallel execution needs at least one worker".to_string(),
                ));
            }
            if workers > MAX_WORKERS {
                return Err(DistributionError::InvalidConfig(format!(
                    "at most {MAX_WORKERS} workers are supported, got {workers}"
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Preset Configurations (Factory Methods)
// ============================================================================

impl DistributionConfig {
    /// Sequential execution, input validated, output verified
    pub fn strict() -> Self {
        Self::new(ExecutionMode::Sequential)
    }

    /// Sequential execution for snapshots the caller already guarantees
    /// (skips both checks)
    pub fn trusted_input() -> Self {
        Self::new(ExecutionMode::Sequential)
            .with_input_validation(false)
            .with_output_verification(false)
    }

    /// Parallel execution with all checks enabled
    pub fn parallel(workers: usize) -> Self {
        Self::new(ExecutionMode::Parallel { workers })
    }
}
