// ============================================================================
// Event Handler Interface
// Defines the contract for observing distribution runs
// ============================================================================

use crate::domain::ProductId;
use crate::numeric::Quantity;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why a product produced no proposals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SkipReason {
    /// The product has orders but no offers in the snapshot
    NoOffers,
    /// Every order of the product is already covered
    NoDemand,
}

/// Events emitted by the distribution engine
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistributionEvent {
    /// A distribution run started
    RunStarted {
        run_id: Uuid,
        products: usize,
        orders: usize,
        offers: usize,
        timestamp: DateTime<Utc>,
    },

    /// A product was left untouched
    ProductSkipped {
        run_id: Uuid,
        product_id: ProductId,
        reason: SkipReason,
        timestamp: DateTime<Utc>,
    },

    /// A product was allocated.
    /// `residual` is demand left uncovered, either from lack of supply or
    /// from truncation to cents.
    ProductAllocated {
        run_id: Uuid,
        product_id: ProductId,
        offers: usize,
        demand: Quantity,
        allocated: Quantity,
        residual: Quantity,
        proposals: usize,
        timestamp: DateTime<Utc>,
    },

    /// A manually edited proposal was reconciled
    RedistributionApplied {
        run_id: Uuid,
        original: usize,
        altered: usize,
        timestamp: DateTime<Utc>,
    },

    /// The run finished; counts are after post-processing
    RunCompleted {
        run_id: Uuid,
        proposals: usize,
        total_quantity: Quantity,
        timestamp: DateTime<Utc>,
    },
}

impl DistributionEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            DistributionEvent::RunStarted { run_id, .. }
            | DistributionEvent::ProductSkipped { run_id, .. }
            | DistributionEvent::ProductAllocated { run_id, .. }
            | DistributionEvent::RedistributionApplied { run_id, .. }
            | DistributionEvent::RunCompleted { run_id, .. } => *run_id,
        }
    }
}

/// Event handler trait for processing distribution events
/// Implementations can handle logging, metrics, notifications, etc.
pub trait EventHandler: Send + Sync {
    /// Handle a distribution event
    fn on_event(&self, event: DistributionEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<DistributionEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: DistributionEvent) {}
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: DistributionEvent) {
        match &event {
            DistributionEvent::ProductSkipped {
                product_id, reason, ..
            } => {
                tracing::debug!(product = %product_id, ?reason, "product skipped");
            },
            DistributionEvent::ProductAllocated {
                product_id,
                allocated,
                residual,
                ..
            } if residual.is_positive() => {
                tracing::info!(
                    product = %product_id,
                    allocated = %allocated,
                    residual = %residual,
                    "product allocated with uncovered demand"
                );
            },
            _ => tracing::debug!("distribution event: {:?}", event),
        }
    }
}

/// Keeps every event in memory, in emission order
#[derive(Default)]
pub struct RecordingEventHandler {
    events: Mutex<Vec<DistributionEvent>>,
}

impl RecordingEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far
    pub fn events(&self) -> Vec<DistributionEvent> {
        self.events.lock().clone()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<DistributionEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventHandler for RecordingEventHandler {
    fn on_event(&self, event: DistributionEvent) {
        self.events.lock().push(event);
    }

    fn on_events(&self, events: Vec<DistributionEvent>) {
        self.events.lock().extend(events);
    }
}
