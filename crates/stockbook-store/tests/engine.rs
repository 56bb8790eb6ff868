//! End-to-end tests for the ledger & transaction engine.
//!
//! Each test drives the public `Ledger` API against an in-memory store,
//! covering the engine's observable guarantees: non-negative stock,
//! transfer conservation, all-or-nothing mutations, snapshot immutability,
//! and migration idempotence.

use stockbook_core::OrderItemDraft;
use stockbook_store::{migrate, Ledger, LedgerConfig, LedgerError};

async fn open_ledger() -> Ledger {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    Ledger::open(LedgerConfig::in_memory()).await.unwrap()
}

fn line(article_id: i64, quantity: i64, price: f64, name: &str) -> OrderItemDraft {
    OrderItemDraft {
        article_id,
        quantity,
        price,
        name: name.to_string(),
    }
}

#[tokio::test]
async fn merge_on_add() {
    let ledger = open_ledger().await;

    ledger.add_article("Widget", 5).await.unwrap();
    ledger.add_article("Widget", 3).await.unwrap();

    let articles = ledger.fetch_articles().await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].name, "Widget");
    assert_eq!(articles[0].quantity, 8);
}

#[tokio::test]
async fn conservation_of_stock_across_move_and_return() {
    let ledger = open_ledger().await;
    let a = ledger.add_article("Widget", 10).await.unwrap();

    for q in [1, 4, 10] {
        ledger.move_to_secondary(a.id, q).await.unwrap();
        ledger.return_to_main(a.id, q).await.unwrap();

        let source = ledger.fetch_articles().await.unwrap();
        assert_eq!(source[0].quantity, 10, "source restored after ±{q}");
        assert!(
            ledger.fetch_secondary_stock().await.unwrap().is_empty(),
            "destination empty after ±{q}"
        );
    }
}

#[tokio::test]
async fn quantities_never_go_negative() {
    let ledger = open_ledger().await;
    let a = ledger.add_article("Widget", 5).await.unwrap();
    ledger.move_to_secondary(a.id, 5).await.unwrap();

    // Overdraw both sides; every attempt must fail and change nothing.
    assert!(ledger.move_to_secondary(a.id, 1).await.is_err());
    assert!(ledger.sell_secondary(a.id, 6).await.is_err());
    assert!(ledger.return_to_main(a.id, 6).await.is_err());

    let source = ledger.fetch_articles().await.unwrap();
    let dest = ledger.fetch_secondary_stock().await.unwrap();
    assert_eq!(source[0].quantity, 0);
    assert_eq!(dest[0].quantity, 5);
}

#[tokio::test]
async fn failed_move_is_fully_rolled_back() {
    let ledger = open_ledger().await;
    let a = ledger.add_article("Widget", 3).await.unwrap();
    ledger.move_to_secondary(a.id, 1).await.unwrap();

    let err = ledger.move_to_secondary(a.id, 5).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientStock {
            available: 2,
            requested: 5,
            ..
        }
    ));

    // Neither side moved.
    assert_eq!(ledger.fetch_articles().await.unwrap()[0].quantity, 2);
    assert_eq!(ledger.fetch_secondary_stock().await.unwrap()[0].quantity, 1);
}

#[tokio::test]
async fn selling_full_quantity_removes_destination_row() {
    let ledger = open_ledger().await;
    let a = ledger.add_article("Widget", 10).await.unwrap();
    ledger.move_to_secondary(a.id, 4).await.unwrap();

    ledger.sell_secondary(a.id, 4).await.unwrap();

    assert!(ledger.fetch_secondary_stock().await.unwrap().is_empty());
    // Price-less article: selling never touches the price table either way.
    assert!(ledger.fetch_prices().await.unwrap().is_empty());
}

#[tokio::test]
async fn order_snapshots_are_immutable() {
    let ledger = open_ledger().await;
    let a = ledger.add_article("A", 10).await.unwrap();

    let order = ledger
        .save_order("Bob", vec![line(a.id, 4, 2.5, "A")])
        .await
        .unwrap();

    ledger.update_article(a.id, "Renamed", 99).await.unwrap();
    ledger.delete_article(a.id).await.unwrap();

    let items = ledger.fetch_order_items(order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "A");
    assert_eq!(items[0].quantity, 4);
    assert!((items[0].price - 2.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn full_sale_flow() {
    let ledger = open_ledger().await;

    // Stock arrives at the source location.
    let a = ledger.add_article("A", 10).await.unwrap();

    // Four units go out to the stall.
    ledger.move_to_secondary(a.id, 4).await.unwrap();
    assert_eq!(ledger.fetch_articles().await.unwrap()[0].quantity, 6);
    assert_eq!(ledger.fetch_secondary_stock().await.unwrap()[0].quantity, 4);

    // Price set after the move; prices are independent of stock levels.
    ledger.set_price(a.id, 2.5).await.unwrap();

    // Bob buys everything on the stall.
    ledger.sell_secondary(a.id, 4).await.unwrap();
    assert!(ledger.fetch_secondary_stock().await.unwrap().is_empty());

    let order = ledger
        .save_order("Bob", vec![line(a.id, 4, 2.5, "A")])
        .await
        .unwrap();

    let orders = ledger.fetch_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].client, "Bob");
    assert!((orders[0].total - 10.0).abs() < 1e-9);

    // The article goes away; history must not.
    ledger.delete_article(a.id).await.unwrap();

    let items = ledger.fetch_order_items(order.id).await.unwrap();
    assert_eq!(items[0].name, "A");
    assert_eq!(items[0].quantity, 4);
    assert!((items[0].price - 2.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn price_survives_stock_reaching_zero() {
    let ledger = open_ledger().await;
    let a = ledger.add_article("Widget", 4).await.unwrap();
    ledger.set_price(a.id, 1.25).await.unwrap();

    ledger.move_to_secondary(a.id, 4).await.unwrap();
    ledger.sell_secondary(a.id, 4).await.unwrap();

    // Source at zero, destination row gone - the price row remains.
    let prices = ledger.fetch_prices().await.unwrap();
    assert_eq!(prices.len(), 1);
    assert!((prices[0].price - 1.25).abs() < f64::EPSILON);
}

#[tokio::test]
async fn split_stock_is_valid() {
    let ledger = open_ledger().await;
    let a = ledger.add_article("Widget", 10).await.unwrap();

    ledger.move_to_secondary(a.id, 3).await.unwrap();

    // The same article lives at both locations, independently.
    assert_eq!(ledger.fetch_articles().await.unwrap()[0].quantity, 7);
    assert_eq!(ledger.fetch_secondary_stock().await.unwrap()[0].quantity, 3);
    assert_eq!(ledger.fetch_total_quantity().await.unwrap(), 7);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let ledger = open_ledger().await;

    assert_eq!(
        migrate::current_version(ledger.pool()).await.unwrap(),
        migrate::LATEST_VERSION
    );

    // Second run must apply zero steps and leave data intact.
    ledger.add_article("Widget", 1).await.unwrap();
    migrate::run(ledger.pool()).await.unwrap();

    assert_eq!(
        migrate::current_version(ledger.pool()).await.unwrap(),
        migrate::LATEST_VERSION
    );
    assert_eq!(ledger.fetch_articles().await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_order_leaves_other_clients_pins() {
    let ledger = open_ledger().await;

    let order = ledger
        .save_order("Bob", vec![line(1, 1, 1.0, "A")])
        .await
        .unwrap();
    ledger.add_pin("Bob", 48.2, 16.4).await.unwrap();
    ledger.add_pin("Alice", 40.4, -3.7).await.unwrap();

    ledger.delete_order(order.id).await.unwrap();

    let pins = ledger.fetch_pins().await.unwrap();
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].name, "Alice");
    assert!(ledger.fetch_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn settings_round_trip() {
    let ledger = open_ledger().await;

    assert_eq!(ledger.get_setting("currency").await.unwrap(), None);
    ledger.save_setting("currency", "EUR").await.unwrap();
    ledger.save_setting("currency", "USD").await.unwrap();
    assert_eq!(
        ledger.get_setting("currency").await.unwrap().as_deref(),
        Some("USD")
    );
}

#[tokio::test]
async fn interleaved_writers_stay_consistent() {
    let ledger = open_ledger().await;
    let a = ledger.add_article("Widget", 100).await.unwrap();

    // Two tasks hammer opposite transfers; serialized writes plus the
    // check-then-act guard keep every intermediate state legal.
    let out = {
        let ledger = ledger.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                let _ = ledger.move_to_secondary(a.id, 3).await;
            }
        })
    };
    let back = {
        let ledger = ledger.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                let _ = ledger.return_to_main(a.id, 2).await;
            }
        })
    };
    out.await.unwrap();
    back.await.unwrap();

    let source = ledger.fetch_articles().await.unwrap()[0].quantity;
    let dest = ledger
        .fetch_secondary_stock()
        .await
        .unwrap()
        .first()
        .map(|e| e.quantity)
        .unwrap_or(0);

    assert!(source >= 0);
    assert!(dest >= 0);
    assert_eq!(source + dest, 100, "no units created or destroyed");
}
