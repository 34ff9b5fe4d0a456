// ============================================================================
// Distribution Engine
// Pipeline driver: snapshot in, ordered proposals out
// ============================================================================

use super::assembler::{DistributionRun, ProductAllocation, ProductOutcome, ProposalAssembler};
use super::ledger::ProductLedger;
use super::offer_allocator::allocate_offers;
use super::order_allocator::allocate_orders;
use super::snapshot::{validate_snapshot, RemainingBook, SnapshotIndex};
use super::verification::{check_altered, verify_proposals};
use crate::domain::{
    DistributionConfig, DistributionProposal, ExecutionMode, OfferView, OrderView, ProductId,
};
use crate::error::{DistributionError, DistributionResult};
use crate::interfaces::{
    AcceptAltered, DistributionEvent, EquityAdjustment, EventHandler, IdentityEquity,
    NoOpEventHandler, Reconciler, SkipReason,
};
use crate::numeric::Quantity;
use chrono::Utc;
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

/// Fair-share distribution engine with pluggable post-processing
pub struct DistributionEngine {
    config: DistributionConfig,

    /// Applied to every proposal before it is returned
    equity: Box<dyn EquityAdjustment>,

    /// Merges caller edits in `run_redistribution`
    reconciler: Box<dyn Reconciler>,

    /// Event handler for processing events
    event_handler: Arc<dyn EventHandler>,
}

impl Default for DistributionEngine {
    fn default() -> Self {
        Self::new(DistributionConfig::default(), Arc::new(NoOpEventHandler))
    }
}

impl DistributionEngine {
    /// Create an engine with identity post-processing stages
    pub fn new(config: DistributionConfig, event_handler: Arc<dyn EventHandler>) -> Self {
        Self::with_stages(
            config,
            Box::new(IdentityEquity),
            Box::new(AcceptAltered),
            event_handler,
        )
    }

    /// Create an engine with explicit post-processing stages
    pub fn with_stages(
        config: DistributionConfig,
        equity: Box<dyn EquityAdjustment>,
        reconciler: Box<dyn Reconciler>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            config,
            equity,
            reconciler,
            event_handler,
        }
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    /// Run the allocation pass only, without the equity stage.
    ///
    /// The snapshot is not modified; remaining quantities after the run are
    /// returned in [`DistributionRun::remaining`].
    pub fn distribute(
        &self,
        orders: &[OrderView],
        offers: &[OfferView],
    ) -> DistributionResult<DistributionRun> {
        let (run, mut events) = self.allocate(orders, offers)?;

        events.push(DistributionEvent::RunCompleted {
            run_id: run.run_id,
            proposals: run.proposals.len(),
            total_quantity: run.total_quantity,
            timestamp: Utc::now(),
        });
        self.event_handler.on_events(events);

        Ok(run)
    }

    /// Compute a distribution proposal for a snapshot of open orders and
    /// offers, then apply the equity stage.
    ///
    /// # Errors
    /// Fails fast on malformed input (when validation is enabled), on an
    /// inconsistent result (when verification is enabled), on arithmetic
    /// overflow and on a failing post-processing stage. A well-formed
    /// snapshot never fails.
    pub fn run_distribution(
        &self,
        orders: &[OrderView],
        offers: &[OfferView],
    ) -> DistributionResult<Vec<DistributionProposal>> {
        let (run, mut events) = self.allocate(orders, offers)?;

        let proposals = self.equity.adjust(run.proposals)?;
        let total_quantity = Quantity::checked_sum(proposals.iter().map(|p| p.quantity))?;
        tracing::debug!(
            stage = self.equity.name(),
            proposals = proposals.len(),
            "equity stage applied"
        );

        events.push(DistributionEvent::RunCompleted {
            run_id: run.run_id,
            proposals: proposals.len(),
            total_quantity,
            timestamp: Utc::now(),
        });
        self.event_handler.on_events(events);

        Ok(proposals)
    }

    /// Reconcile a caller-edited proposal with the one it was derived from,
    /// then apply the equity stage.
    ///
    /// # Errors
    /// `NonPositiveProposal` or `DuplicateProposal` if the edit breaks the
    /// stored-record constraints; any error of the injected stages.
    pub fn run_redistribution(
        &self,
        original: &[DistributionProposal],
        altered: Vec<DistributionProposal>,
    ) -> DistributionResult<Vec<DistributionProposal>> {
        check_altered(&altered)?;

        let run_id = Uuid::new_v4();
        let altered_count = altered.len();

        let reconciled = self.reconciler.reconcile(original, altered)?;
        let proposals = self.equity.adjust(reconciled)?;
        let total_quantity = Quantity::checked_sum(proposals.iter().map(|p| p.quantity))?;

        tracing::debug!(
            %run_id,
            reconciler = self.reconciler.name(),
            equity = self.equity.name(),
            original = original.len(),
            altered = altered_count,
            "redistribution applied"
        );

        self.event_handler.on_events(vec![
            DistributionEvent::RedistributionApplied {
                run_id,
                original: original.len(),
                altered: altered_count,
                timestamp: Utc::now(),
            },
            DistributionEvent::RunCompleted {
                run_id,
                proposals: proposals.len(),
                total_quantity,
                timestamp: Utc::now(),
            },
        ]);

        Ok(proposals)
    }

    /// Run `run_distribution` on the tokio blocking pool
    #[cfg(feature = "async")]
    pub async fn run_distribution_async(
        self: Arc<Self>,
        orders: Vec<OrderView>,
        offers: Vec<OfferView>,
    ) -> DistributionResult<Vec<DistributionProposal>> {
        tokio::task::spawn_blocking(move || self.run_distribution(&orders, &offers))
            .await
            .map_err(|e| DistributionError::WorkerPanicked(e.to_string()))?
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    fn allocate(
        &self,
        orders: &[OrderView],
        offers: &[OfferView],
    ) -> DistributionResult<(DistributionRun, Vec<DistributionEvent>)> {
        if self.config.validate_input {
            validate_snapshot(orders, offers)?;
        }

        let run_id = Uuid::new_v4();
        let index = SnapshotIndex::build(orders, offers);
        let book = RemainingBook::from_snapshot(orders, offers);

        tracing::debug!(
            %run_id,
            products = index.products().len(),
            orders = index.order_count(),
            offers = index.offer_count(),
            execution = ?self.config.execution,
            "distribution run started"
        );

        let mut events = vec![DistributionEvent::RunStarted {
            run_id,
            products: index.products().len(),
            orders: index.order_count(),
            offers: index.offer_count(),
            timestamp: Utc::now(),
        }];

        let mut assembler = ProposalAssembler::new(run_id, book);
        match self.config.execution {
            ExecutionMode::Sequential => {
                for &product_id in index.products() {
                    let outcome = allocate_product(&index, assembler.book(), product_id)?;
                    events.push(assembler.commit(outcome)?);
                }
            },
            ExecutionMode::Parallel { workers } => {
                let outcomes = allocate_parallel(&index, assembler.book(), workers)?;
                for outcome in outcomes {
                    events.push(assembler.commit(outcome)?);
                }
            },
        }
        let run = assembler.finish();

        if self.config.verify_output {
            if let Err(err) = verify_proposals(&index, &run.proposals) {
                tracing::warn!(%run_id, error = %err, "computed proposal failed verification");
                return Err(err);
            }
        }

        tracing::debug!(
            %run_id,
            proposals = run.proposals.len(),
            total_quantity = %run.total_quantity,
            uncovered = %run.uncovered,
            "distribution run finished"
        );

        Ok((run, events))
    }
}

// ============================================================================
// Per-Product Pipeline
// ============================================================================

/// Run both allocators for one product against the current `book`.
///
/// Reads only the product's own orders and offers, so products can be
/// computed independently and committed afterwards.
fn allocate_product(
    index: &SnapshotIndex<'_>,
    book: &RemainingBook,
    product_id: ProductId,
) -> DistributionResult<ProductOutcome> {
    let order_ids = index.orders_of(product_id);
    let offer_ids = index.offers_of(product_id);

    if offer_ids.is_empty() {
        return Ok(ProductOutcome::Skipped {
            product_id,
            reason: SkipReason::NoOffers,
        });
    }

    let mut ledger = ProductLedger::open(index, book, product_id);
    let demand = ledger.demand(order_ids)?;
    if !demand.is_positive() {
        return Ok(ProductOutcome::Skipped {
            product_id,
            reason: SkipReason::NoDemand,
        });
    }

    let supply: Vec<_> = offer_ids
        .iter()
        .map(|&id| (id, ledger.offer_remaining(id)))
        .collect();
    let available = supply.iter().filter(|(_, q)| q.is_positive()).count();

    let supply_allocation = allocate_offers(&supply, demand)?;

    let mut proposals = Vec::new();
    for &(offer_id, allocated) in &supply_allocation.contributions {
        if !allocated.is_positive() {
            continue;
        }
        let offer = index.offer(offer_id).ok_or_else(|| {
            DistributionError::InvariantViolation(format!(
                "{offer_id} is grouped under {product_id} but missing from the snapshot"
            ))
        })?;
        proposals.extend(allocate_orders(offer, allocated, order_ids, index, &mut ledger)?);
    }

    let allocated = Quantity::checked_sum(proposals.iter().map(|p| p.quantity))?;
    let residual = demand.checked_sub(allocated)?;

    tracing::trace!(
        product = %product_id,
        demand = %demand,
        allocated = %allocated,
        residual = %residual,
        "product allocated"
    );

    Ok(ProductOutcome::Allocated(ProductAllocation {
        offers: available,
        demand,
        allocated,
        residual,
        proposals,
        ledger,
    }))
}

/// Compute products on scoped worker threads, returned in product order
fn allocate_parallel(
    index: &SnapshotIndex<'_>,
    book: &RemainingBook,
    workers: usize,
) -> DistributionResult<Vec<ProductOutcome>> {
    let products = index.products();
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = products.len().div_ceil(workers.max(1));

    let chunks = crossbeam::thread::scope(|scope| {
        let handles: Vec<_> = products
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move |_| {
                    chunk
                        .iter()
                        .map(|&product_id| allocate_product(index, book, product_id))
                        .collect::<DistributionResult<Vec<_>>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|payload| DistributionError::WorkerPanicked(panic_message(&*payload)))
                    .and_then(|outcomes| outcomes)
            })
            .collect::<DistributionResult<Vec<_>>>()
    })
    .map_err(|payload| DistributionError::WorkerPanicked(panic_message(&*payload)))??;

    Ok(chunks.into_iter().flatten().collect())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ============================================================================
// Default Engine Shortcuts
// ============================================================================

/// [`DistributionEngine::run_distribution`] with the default engine
pub fn run_distribution(
    orders: &[OrderView],
    offers: &[OfferView],
) -> DistributionResult<Vec<DistributionProposal>> {
    DistributionEngine::default().run_distribution(orders, offers)
}

/// [`DistributionEngine::run_redistribution`] with the default engine
pub fn run_redistribution(
    original: &[DistributionProposal],
    altered: Vec<DistributionProposal>,
) -> DistributionResult<Vec<DistributionProposal>> {
    DistributionEngine::default().run_redistribution(original, altered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CooperatedId, OfferId, OrderId};
    use crate::interfaces::RecordingEventHandler;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn order(id: i64, product: i64, quantity: &str, price: &str) -> OrderView {
        OrderView::new(OrderId::new(id), ProductId::new(product), q(quantity), q(price))
    }

    fn offer(id: i64, product: i64, quantity: &str) -> OfferView {
        OfferView::new(
            OfferId::new(id),
            ProductId::new(product),
            CooperatedId::new(100 + id),
            q(quantity),
        )
    }

    fn quantities(proposals: &[DistributionProposal]) -> Vec<Quantity> {
        proposals.iter().map(|p| p.quantity).collect()
    }

    #[test]
    fn test_single_order_single_offer() {
        let orders = vec![order(1, 1, "10", "5.00")];
        let offers = vec![offer(1, 1, "10")];

        let proposals = run_distribution(&orders, &offers).unwrap();

        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].quantity, q("10"));
        assert_eq!(proposals[0].total_value, q("50"));
        assert_eq!(proposals[0].cooperated_id, CooperatedId::new(101));
    }

    #[test]
    fn test_equal_offers_share_one_order() {
        let orders = vec![order(1, 1, "10", "1")];
        let offers = vec![offer(1, 1, "10"), offer(2, 1, "10")];

        let proposals = run_distribution(&orders, &offers).unwrap();

        assert_eq!(quantities(&proposals), vec![q("5"), q("5")]);
        assert_eq!(proposals[0].offer_id, OfferId::new(1));
        assert_eq!(proposals[1].offer_id, OfferId::new(2));
    }

    #[test]
    fn test_scarce_offers_are_drained_first() {
        let orders = vec![order(1, 1, "10", "1")];
        let offers = vec![offer(1, 1, "2"), offer(2, 1, "3"), offer(3, 1, "100")];

        let proposals = run_distribution(&orders, &offers).unwrap();

        assert_eq!(quantities(&proposals), vec![q("2"), q("3"), q("5")]);
    }

    #[test]
    fn test_exhausted_offers_produce_nothing() {
        let orders = vec![order(1, 1, "10", "1")];
        let offers = vec![offer(1, 1, "0"), offer(2, 1, "0")];

        assert!(run_distribution(&orders, &offers).unwrap().is_empty());
    }

    #[test]
    fn test_exhausted_product_does_not_block_others() {
        let orders = vec![order(1, 1, "10", "1"), order(2, 2, "4", "2")];
        let offers = vec![offer(1, 1, "0"), offer(2, 2, "4")];

        let proposals = run_distribution(&orders, &offers).unwrap();

        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].order_id, OrderId::new(2));
        assert_eq!(proposals[0].offer_id, OfferId::new(2));
        assert_eq!(proposals[0].quantity, q("4"));
        assert_eq!(proposals[0].total_value, q("8"));
    }

    #[test]
    fn test_negative_offer_is_rejected() {
        let orders = vec![order(1, 1, "10", "1")];
        let offers = vec![offer(1, 1, "-1")];

        assert!(matches!(
            run_distribution(&orders, &offers),
            Err(DistributionError::NegativeOfferQuantity { .. })
        ));
    }

    #[test]
    fn test_products_are_independent() {
        let orders = vec![
            order(1, 2, "4", "1"),
            order(2, 1, "6", "1"),
            order(3, 3, "1", "1"),
        ];
        let offers = vec![offer(1, 1, "10"), offer(2, 2, "1"), offer(3, 4, "50")];

        let run = DistributionEngine::default().distribute(&orders, &offers).unwrap();

        // Product 2 first: first appearance among the orders
        assert_eq!(run.proposals[0].order_id, OrderId::new(1));
        assert_eq!(run.proposals[0].quantity, q("1"));
        assert_eq!(run.proposals[1].order_id, OrderId::new(2));
        assert_eq!(run.proposals[1].quantity, q("6"));
        assert_eq!(run.proposals.len(), 2);

        assert_eq!(run.total_quantity, q("7"));
        // Product 3 is skipped for lack of offers and not counted
        assert_eq!(run.uncovered, q("3"));
        // Product 4 has no orders: its offer is untouched
        assert_eq!(run.remaining.offer(OfferId::new(3)), q("50"));
        assert_eq!(run.remaining.offer(OfferId::new(1)), q("4"));
    }

    #[test]
    fn test_offers_of_a_product_see_each_others_consumption() {
        // Demand 4 over offers [10, 10]: each contributes 2, the second
        // offer must find the first order already partly covered
        let orders = vec![order(1, 1, "1", "1"), order(2, 1, "3", "1")];
        let offers = vec![offer(1, 1, "10"), offer(2, 1, "10")];

        let proposals = run_distribution(&orders, &offers).unwrap();

        let to_first: Quantity = Quantity::checked_sum(
            proposals
                .iter()
                .filter(|p| p.order_id == OrderId::new(1))
                .map(|p| p.quantity),
        )
        .unwrap();
        assert_eq!(to_first, q("1"));
        assert_eq!(
            Quantity::checked_sum(proposals.iter().map(|p| p.quantity)).unwrap(),
            q("4")
        );
    }

    #[test]
    fn test_validation_fails_fast() {
        let orders = vec![order(1, 1, "1", "1"), order(1, 1, "2", "1")];
        let err = run_distribution(&orders, &[]).unwrap_err();
        assert_eq!(err, DistributionError::DuplicateOrder(OrderId::new(1)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let orders: Vec<_> = (1..=40)
            .map(|i| order(i, i % 7, &format!("{}.{:02}", i % 9 + 1, i % 100), "1.37"))
            .collect();
        let offers: Vec<_> = (1..=60)
            .map(|i| offer(i, i % 7, &format!("{}.{:02}", i % 5 + 1, (i * 13) % 100)))
            .collect();

        let sequential = DistributionEngine::default().distribute(&orders, &offers).unwrap();
        let parallel = DistributionEngine::new(
            DistributionConfig::parallel(3),
            Arc::new(NoOpEventHandler),
        )
        .distribute(&orders, &offers)
        .unwrap();

        assert_eq!(sequential.proposals, parallel.proposals);
        assert_eq!(sequential.remaining, parallel.remaining);
        assert_eq!(sequential.uncovered, parallel.uncovered);
    }

    #[test]
    fn test_events_describe_the_run() {
        let handler = Arc::new(RecordingEventHandler::new());
        let engine = DistributionEngine::new(DistributionConfig::strict(), handler.clone());

        let orders = vec![order(1, 1, "10", "1"), order(2, 2, "1", "1")];
        let offers = vec![offer(1, 1, "3"), offer(2, 1, "3"), offer(3, 1, "3")];
        engine.run_distribution(&orders, &offers).unwrap();

        let events = handler.take();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            DistributionEvent::RunStarted { products: 2, orders: 2, offers: 3, .. }
        ));
        match &events[1] {
            DistributionEvent::ProductAllocated {
                offers,
                demand,
                allocated,
                residual,
                ..
            } => {
                assert_eq!(*offers, 3);
                assert_eq!(*demand, q("10"));
                assert_eq!(*allocated, q("9"));
                assert_eq!(*residual, q("1"));
            },
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            events[2],
            DistributionEvent::ProductSkipped { reason: SkipReason::NoOffers, .. }
        ));
        assert!(matches!(events[3], DistributionEvent::RunCompleted { proposals: 3, .. }));
        assert!(events.iter().all(|e| e.run_id() == events[0].run_id()));
    }

    #[test]
    fn test_redistribution_checks_and_reconciles() {
        let original = run_distribution(&[order(1, 1, "10", "1")], &[offer(1, 1, "10")]).unwrap();

        let mut altered = original.clone();
        altered[0].quantity = q("7");
        altered[0].total_value = q("7");
        let result = run_redistribution(&original, altered.clone()).unwrap();
        assert_eq!(result, altered);

        let mut zero = original.clone();
        zero[0].quantity = Quantity::ZERO;
        assert!(matches!(
            run_redistribution(&original, zero),
            Err(DistributionError::NonPositiveProposal { .. })
        ));

        let doubled = vec![original[0].clone(), original[0].clone()];
        assert!(matches!(
            run_redistribution(&original, doubled),
            Err(DistributionError::DuplicateProposal { .. })
        ));
    }

    #[test]
    fn test_equity_stage_errors_propagate() {
        struct Refuse;
        impl EquityAdjustment for Refuse {
            fn adjust(
                &self,
                _proposals: Vec<DistributionProposal>,
            ) -> DistributionResult<Vec<DistributionProposal>> {
                Err(DistributionError::Stage {
                    stage: self.name().to_string(),
                    reason: "no policy".to_string(),
                })
            }

            fn name(&self) -> &str {
                "refuse"
            }
        }

        let engine = DistributionEngine::with_stages(
            DistributionConfig::strict(),
            Box::new(Refuse),
            Box::new(AcceptAltered),
            Arc::new(NoOpEventHandler),
        );
        let err = engine
            .run_distribution(&[order(1, 1, "1", "1")], &[offer(1, 1, "1")])
            .unwrap_err();
        assert!(matches!(err, DistributionError::Stage { .. }));
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_async_matches_sync() {
        let orders = vec![order(1, 1, "10", "2.50"), order(2, 1, "5", "2.50")];
        let offers = vec![offer(1, 1, "4"), offer(2, 1, "7")];

        let engine = Arc::new(DistributionEngine::default());
        let expected = engine.run_distribution(&orders, &offers).unwrap();
        let proposals = engine
            .run_distribution_async(orders, offers)
            .await
            .unwrap();

        assert_eq!(proposals, expected);
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(run_distribution(&[], &[]).unwrap().is_empty());
        let engine = DistributionEngine::new(
            DistributionConfig::parallel(4),
            Arc::new(NoOpEventHandler),
        );
        assert!(engine.run_distribution(&[], &[offer(1, 1, "5")]).unwrap().is_empty());
    }
}
