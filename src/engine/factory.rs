// ============================================================================
// Distribution Engine Factory
// Creates distribution engines with proper configuration
// ============================================================================

use crate::domain::config::{DistributionConfig, ExecutionMode};
use crate::engine::DistributionEngine;
use crate::error::DistributionResult;
use crate::interfaces::{
    AcceptAltered, EquityAdjustment, EventHandler, IdentityEquity, NoOpEventHandler, Reconciler,
};
use std::sync::Arc;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a distribution engine from configuration
///
/// # Arguments
/// * `config` - Engine configuration
/// * `event_handler` - Event handler for run and product events
///
/// # Returns
/// * `DistributionResult<DistributionEngine>` - Configured engine or
///   `InvalidConfig`
///
/// # Example
/// ```
/// use distribution_engine::prelude::*;
/// use std::sync::Arc;
///
/// let config = DistributionConfig::parallel(4);
/// let engine = create_from_config(config, Arc::new(NoOpEventHandler)).unwrap();
/// assert_eq!(engine.config().execution, ExecutionMode::Parallel { workers: 4 });
/// ```
pub fn create_from_config(
    config: DistributionConfig,
    event_handler: Arc<dyn EventHandler>,
) -> DistributionResult<DistributionEngine> {
    config.validate()?;

    Ok(DistributionEngine::new(config, event_handler))
}

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating distribution engines with fluent API
///
/// # Example
/// ```
/// use distribution_engine::prelude::*;
/// use std::sync::Arc;
///
/// let engine = DistributionEngineBuilder::new()
///     .parallel(8)
///     .with_output_verification(false)
///     .with_event_handler(Arc::new(LoggingEventHandler))
///     .build()
///     .unwrap();
///
/// assert!(!engine.config().verify_output);
/// ```
pub struct DistributionEngineBuilder {
    config: DistributionConfig,
    equity: Box<dyn EquityAdjustment>,
    reconciler: Box<dyn Reconciler>,
    event_handler: Arc<dyn EventHandler>,
}

impl Default for DistributionEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DistributionEngineBuilder {
    /// Strict sequential engine with identity stages and no event handler
    pub fn new() -> Self {
        Self::from_config(DistributionConfig::strict())
    }

    fn from_config(config: DistributionConfig) -> Self {
        Self {
            config,
            equity: Box::new(IdentityEquity),
            reconciler: Box::new(AcceptAltered),
            event_handler: Arc::new(NoOpEventHandler),
        }
    }

    // ========================================================================
    // Execution Configuration
    // ========================================================================

    /// Compute products one after another (default)
    pub fn sequential(mut self) -> Self {
        self.config.execution = ExecutionMode::Sequential;
        self
    }

    /// Compute products on `workers` scoped threads
    pub fn parallel(mut self, workers: usize) -> Self {
        self.config.execution = ExecutionMode::Parallel { workers };
        self
    }

    pub fn with_input_validation(mut self, enabled: bool) -> Self {
        self.config.validate_input = enabled;
        self
    }

    pub fn with_output_verification(mut self, enabled: bool) -> Self {
        self.config.verify_output = enabled;
        self
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    /// Replace the identity equity stage
    pub fn with_equity(mut self, equity: Box<dyn EquityAdjustment>) -> Self {
        self.equity = equity;
        self
    }

    /// Replace the accept-altered reconciler
    pub fn with_reconciler(mut self, reconciler: Box<dyn Reconciler>) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn with_event_handler(mut self, event_handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = event_handler;
        self
    }

    // ========================================================================
    // Preset Configurations
    // ========================================================================

    /// Start from [`DistributionConfig::strict`]
    pub fn strict() -> Self {
        Self::from_config(DistributionConfig::strict())
    }

    /// Start from [`DistributionConfig::trusted_input`]
    pub fn trusted_input() -> Self {
        Self::from_config(DistributionConfig::trusted_input())
    }

    /// Start from [`DistributionConfig::parallel`]
    pub fn parallel_preset(workers: usize) -> Self {
        Self::from_config(DistributionConfig::parallel(workers))
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the distribution engine
    pub fn build(self) -> DistributionResult<DistributionEngine> {
        self.config.validate()?;

        Ok(DistributionEngine::with_stages(
            self.config,
            self.equity,
            self.reconciler,
            self.event_handler,
        ))
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &DistributionConfig {
        &self.config
    }
}
