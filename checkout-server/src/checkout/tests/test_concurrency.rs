use super::*;
use crate::checkout::error::CheckoutError;
use shared::order::OrderStatus;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_never_oversell() {
    // 10 buyers race for 5 units; exactly 5 single-unit orders can win
    let ctx = setup().await;
    let product = seed_product(&ctx, "Hot Item", 10.0, 5).await;

    let mut handles = Vec::new();
    for user_id in 1..=10 {
        let engine = ctx.engine.clone();
        let product_id = product.id;
        handles.push(tokio::spawn(async move {
            engine.create_order(user_id, &[line(product_id, 1)]).await
        }));
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(CheckoutError::InsufficientStock { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(accepted, 5);
    assert_eq!(rejected, 5);
    assert_eq!(product_counters(&ctx, product.id).await, (5, 5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settles_on_one_order_yield_exactly_one_winner() {
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 5).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 2)])
        .await
        .unwrap();

    let e1 = ctx.engine.clone();
    let e2 = ctx.engine.clone();
    let order_id = view.id;
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { e1.settle(order_id).await }),
        tokio::spawn(async move { e2.settle(order_id).await }),
    );
    let results = [r1.unwrap(), r2.unwrap()];

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one settlement must succeed");
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        CheckoutError::InvalidState {
            current: OrderStatus::Settled
        }
    ));

    // Stock debited exactly once
    assert_eq!(product_counters(&ctx, product.id).await, (3, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn settle_and_cancel_race_resolves_to_one_terminal_state() {
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 5).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 2)])
        .await
        .unwrap();

    let e1 = ctx.engine.clone();
    let e2 = ctx.engine.clone();
    let order_id = view.id;
    let (settle, cancel) = tokio::join!(
        tokio::spawn(async move { e1.settle(order_id).await }),
        tokio::spawn(async move { e2.cancel(order_id, Some("admin")).await }),
    );
    let settle = settle.unwrap();
    let cancel = cancel.unwrap();

    assert!(
        settle.is_ok() ^ cancel.is_ok(),
        "exactly one of settle/cancel must win"
    );

    let reloaded = repository::order::find_by_id(&ctx.db.pool, order_id)
        .await
        .unwrap()
        .unwrap();
    if settle.is_ok() {
        assert_eq!(reloaded.status, OrderStatus::Settled);
        assert_eq!(product_counters(&ctx, product.id).await, (3, 0));
    } else {
        assert_eq!(reloaded.status, OrderStatus::Cancelled);
        assert_eq!(product_counters(&ctx, product.id).await, (5, 0));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_multi_line_orders_proceed_without_deadlock() {
    let ctx = setup().await;
    let p1 = seed_product(&ctx, "Alpha", 10.0, 10).await;
    let p2 = seed_product(&ctx, "Beta", 10.0, 10).await;

    // Half the tasks order (p1, p2), half (p2, p1); lock ordering inside
    // the engine keeps them deadlock-free
    let mut handles = Vec::new();
    for user_id in 1..=8 {
        let engine = ctx.engine.clone();
        let (a, b) = if user_id % 2 == 0 {
            (p1.id, p2.id)
        } else {
            (p2.id, p1.id)
        };
        handles.push(tokio::spawn(async move {
            engine.create_order(user_id, &[line(a, 1), line(b, 1)]).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 8);
    assert_eq!(product_counters(&ctx, p1.id).await, (10, 8));
    assert_eq!(product_counters(&ctx, p2.id).await, (10, 8));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sweep_and_settle_agree_on_one_outcome() {
    use shared::util::now_millis;

    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 5).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 2)])
        .await
        .unwrap();
    force_deadline(&ctx, view.id, now_millis() - 1_000).await;

    // The hold is logically expired: settlement must lose no matter how the
    // race with the sweeper interleaves
    let e1 = ctx.engine.clone();
    let e2 = ctx.engine.clone();
    let order_id = view.id;
    let (settle, sweep) = tokio::join!(
        tokio::spawn(async move { e1.settle(order_id).await }),
        tokio::spawn(async move { e2.sweep(100).await }),
    );
    let settle = settle.unwrap();
    sweep.unwrap().unwrap();

    assert!(matches!(
        settle.unwrap_err(),
        CheckoutError::HoldExpired | CheckoutError::InvalidState { .. }
    ));

    // Whether or not this pass already reclaimed it, a follow-up sweep
    // leaves the system in the terminal state with the hold released
    ctx.engine.sweep(100).await.unwrap();
    let reloaded = repository::order::find_by_id(&ctx.db.pool, order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, OrderStatus::Expired);
    assert_eq!(product_counters(&ctx, product.id).await, (5, 0));
}
