use std::sync::Arc;
use std::time::Duration;

use crate::checkout::manager::CheckoutEngine;
use crate::db::DbService;
use crate::db::repository;
use shared::models::{Product, ProductCreate};
use shared::order::OrderLineInput;

mod test_concurrency;
mod test_expiration;

/// Test harness: tempdir-backed SQLite plus an engine with a 10-minute TTL
pub(crate) struct TestContext {
    pub engine: Arc<CheckoutEngine>,
    pub db: DbService,
    _work_dir: tempfile::TempDir,
}

pub(crate) async fn setup() -> TestContext {
    let work_dir = tempfile::tempdir().expect("create temp dir");
    let db_path = work_dir.path().join("checkout.db");
    let db = DbService::new(&db_path.to_string_lossy())
        .await
        .expect("open test database");
    let engine = Arc::new(CheckoutEngine::new(
        db.pool.clone(),
        Duration::from_secs(600),
    ));
    TestContext {
        engine,
        db,
        _work_dir: work_dir,
    }
}

pub(crate) async fn seed_product(ctx: &TestContext, name: &str, price: f64, stock: i64) -> Product {
    repository::product::create(
        &ctx.db.pool,
        ProductCreate {
            name: name.to_string(),
            description: None,
            price,
            stock: Some(stock),
            is_active: Some(true),
        },
    )
    .await
    .expect("seed product")
}

pub(crate) async fn seed_inactive_product(ctx: &TestContext, name: &str, stock: i64) -> Product {
    repository::product::create(
        &ctx.db.pool,
        ProductCreate {
            name: name.to_string(),
            description: None,
            price: 5.0,
            stock: Some(stock),
            is_active: Some(false),
        },
    )
    .await
    .expect("seed inactive product")
}

/// Read (stock, reserved) directly from the ledger
pub(crate) async fn product_counters(ctx: &TestContext, product_id: i64) -> (i64, i64) {
    sqlx::query_as::<_, (i64, i64)>("SELECT stock, reserved FROM product WHERE id = ?")
        .bind(product_id)
        .fetch_one(&ctx.db.pool)
        .await
        .expect("read counters")
}

/// Rewrite an order's deadline, bypassing the engine (simulates elapsed time)
pub(crate) async fn force_deadline(ctx: &TestContext, order_id: i64, deadline_millis: i64) {
    sqlx::query("UPDATE orders SET hold_deadline = ? WHERE id = ?")
        .bind(deadline_millis)
        .bind(order_id)
        .execute(&ctx.db.pool)
        .await
        .expect("set deadline");
}

pub(crate) fn line(product_id: i64, quantity: i64) -> OrderLineInput {
    OrderLineInput {
        product_id,
        quantity,
    }
}
