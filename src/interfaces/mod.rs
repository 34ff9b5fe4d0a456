// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod event_handler;
mod post_processing;

pub use event_handler::{
    DistributionEvent, EventHandler, LoggingEventHandler, NoOpEventHandler, RecordingEventHandler,
    SkipReason,
};
pub use post_processing::{AcceptAltered, EquityAdjustment, IdentityEquity, Reconciler};
