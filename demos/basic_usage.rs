// ============================================================================
// Basic Usage Example
// ============================================================================

use distribution_engine::numeric::Quantity;
use distribution_engine::prelude::*;
use std::sync::Arc;

fn q(value: &str) -> Quantity {
    value.parse().expect("valid quantity literal")
}

fn main() {
    #[cfg(feature = "logging")]
    let _ = distribution_engine::logging::init_logging("distribution_engine=debug");

    println!("=== Distribution Engine Example ===\n");

    // Two products: tomatoes (1) and lettuce (2)
    let orders = vec![
        OrderView::new(OrderId::new(1), ProductId::new(1), q("30"), q("4.20")),
        OrderView::new(OrderId::new(2), ProductId::new(1), q("12.5"), q("4.50")),
        OrderView::new(OrderId::new(3), ProductId::new(2), q("8"), q("2.99")),
    ];
    let offers = vec![
        OfferView::new(OfferId::new(1), ProductId::new(1), CooperatedId::new(10), q("5")),
        OfferView::new(OfferId::new(2), ProductId::new(1), CooperatedId::new(11), q("18")),
        OfferView::new(OfferId::new(3), ProductId::new(1), CooperatedId::new(12), q("100")),
        OfferView::new(OfferId::new(4), ProductId::new(2), CooperatedId::new(10), q("3")),
    ];

    let handler = Arc::new(RecordingEventHandler::new());
    let engine = DistributionEngineBuilder::new()
        .with_event_handler(handler.clone())
        .build()
        .expect("strict configuration is valid");

    let proposals = engine
        .run_distribution(&orders, &offers)
        .expect("snapshot is well formed");

    println!("Proposals:");
    for proposal in &proposals {
        println!("  {proposal}");
    }

    let summary = DistributionSummary::build(&orders, &offers, &proposals)
        .expect("proposals reference the snapshot");

    println!("\nOrders:");
    for order in &summary.orders {
        println!(
            "  {}: {} of {} ({})",
            order.order_id,
            order.allocated,
            order.ordered,
            order.status.as_str()
        );
    }

    println!("\nProducers:");
    for supply in &summary.supply {
        println!(
            "  {} / {}: {} of {}",
            supply.cooperated_id, supply.product_id, supply.allocated, supply.offered
        );
    }

    println!(
        "\nTotal: {} units, {} value",
        summary.total_quantity, summary.total_value
    );

    println!("\nEvents:");
    for event in handler.take() {
        println!("  {event:?}");
    }
}
