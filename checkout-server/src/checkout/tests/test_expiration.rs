use super::*;
use crate::checkout::error::CheckoutError;
use shared::order::OrderStatus;
use shared::util::now_millis;

#[tokio::test]
async fn sweep_reclaims_expired_holds() {
    // Scenario C: deadline in the past, sweep releases the hold
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 5).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 2)])
        .await
        .unwrap();
    force_deadline(&ctx, view.id, now_millis() - 1_000).await;

    let outcome = ctx.engine.sweep(100).await.unwrap();
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed, 0);

    assert_eq!(product_counters(&ctx, product.id).await, (5, 0));
    let reloaded = repository::order::find_by_id(&ctx.db.pool, view.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, OrderStatus::Expired);
    assert!(reloaded.hold_deadline.is_none());
}

#[tokio::test]
async fn sweep_twice_never_double_releases() {
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 5).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 2)])
        .await
        .unwrap();
    force_deadline(&ctx, view.id, now_millis() - 1_000).await;

    let first = ctx.engine.sweep(100).await.unwrap();
    assert_eq!(first.succeeded, 1);

    // Second pass finds nothing: EXPIRED orders don't match the query, and
    // the status re-check skips them even if they did
    let second = ctx.engine.sweep(100).await.unwrap();
    assert_eq!(second.succeeded, 0);
    assert_eq!(second.failed, 0);
    assert_eq!(product_counters(&ctx, product.id).await, (5, 0));
}

#[tokio::test]
async fn sweep_ignores_live_holds() {
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 5).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 2)])
        .await
        .unwrap();

    let outcome = ctx.engine.sweep(100).await.unwrap();
    assert_eq!(outcome.succeeded, 0);

    let reloaded = repository::order::find_by_id(&ctx.db.pool, view.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.status, OrderStatus::Held);
    assert_eq!(product_counters(&ctx, product.id).await, (5, 2));
}

#[tokio::test]
async fn expire_skips_orders_that_settled_in_the_meantime() {
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 5).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 2)])
        .await
        .unwrap();
    ctx.engine.settle(view.id).await.unwrap();

    // Simulates the race where the order settles between the sweep query
    // and per-order processing: skip, don't error
    let expired = ctx.engine.expire_order(view.id).await.unwrap();
    assert!(!expired);
    assert_eq!(product_counters(&ctx, product.id).await, (3, 0));
}

#[tokio::test]
async fn sweep_batch_size_bounds_one_pass() {
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 10).await;

    let mut order_ids = Vec::new();
    for user_id in 1..=3 {
        let view = ctx
            .engine
            .create_order(user_id, &[line(product.id, 1)])
            .await
            .unwrap();
        force_deadline(&ctx, view.id, now_millis() - 1_000).await;
        order_ids.push(view.id);
    }

    let first = ctx.engine.sweep(2).await.unwrap();
    assert_eq!(first.succeeded, 2);

    let second = ctx.engine.sweep(2).await.unwrap();
    assert_eq!(second.succeeded, 1);

    let (_, reserved) = product_counters(&ctx, product.id).await;
    assert_eq!(reserved, 0);
}

#[tokio::test]
async fn release_clamps_reserved_at_zero_on_corrupted_counters() {
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 10).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 3)])
        .await
        .unwrap();
    force_deadline(&ctx, view.id, now_millis() - 1_000).await;

    // Corrupt the counter below this order's hold; the release must clamp
    // at zero instead of going negative
    sqlx::query("UPDATE product SET reserved = 1 WHERE id = ?")
        .bind(product.id)
        .execute(&ctx.db.pool)
        .await
        .unwrap();

    let outcome = ctx.engine.sweep(100).await.unwrap();
    assert_eq!(outcome.succeeded, 1);
    let (_, reserved) = product_counters(&ctx, product.id).await;
    assert_eq!(reserved, 0);
}

#[tokio::test]
async fn cancel_releases_the_hold_and_marks_cancelled() {
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 5).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 2)])
        .await
        .unwrap();

    let cancelled = ctx.engine.cancel(view.id, Some("ops@store")).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.hold_deadline.is_none());

    assert_eq!(product_counters(&ctx, product.id).await, (5, 0));
}

#[tokio::test]
async fn cancel_is_held_only() {
    let ctx = setup().await;
    let product = seed_product(&ctx, "Widget", 10.0, 5).await;
    let view = ctx
        .engine
        .create_order(1, &[line(product.id, 2)])
        .await
        .unwrap();
    ctx.engine.settle(view.id).await.unwrap();

    let err = ctx.engine.cancel(view.id, None).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::InvalidState {
            current: OrderStatus::Settled
        }
    ));

    let err = ctx.engine.cancel(999, None).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderNotFound(999)));
}
