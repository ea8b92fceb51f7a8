//! Product Repository
//!
//! Catalog reads and management writes. The `stock`/`reserved` pair is only
//! ever mutated by the checkout engine; the one exception is the `stock`
//! column on update, which is guarded so it can never drop below `reserved`.

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, reserved, is_active, created_at, updated_at";

/// Find all active products
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM product WHERE is_active = 1 ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(products)
}

/// Find product by id
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

/// Find a batch of products by id (no particular order, missing ids absent)
pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql =
        format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id IN ({placeholders})");

    let mut query = sqlx::query_as::<_, Product>(&sql);
    for id in ids.iter().copied() {
        query = query.bind(id);
    }

    let products = query.fetch_all(pool).await?;
    Ok(products)
}

/// Create a new product
pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    if data.name.trim().is_empty() {
        return Err(RepoError::Validation("name cannot be empty".into()));
    }
    let stock = data.stock.unwrap_or(0);
    if stock < 0 {
        return Err(RepoError::Validation("stock cannot be negative".into()));
    }

    let id = snowflake_id();
    let now = now_millis();
    sqlx::query(
        "INSERT INTO product (id, name, description, price, stock, reserved, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.name)
    .bind(data.description)
    .bind(data.price)
    .bind(stock)
    .bind(data.is_active.unwrap_or(true))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Update a product
///
/// The statement itself guards the ledger invariant: a `stock` value below
/// the current `reserved` matches zero rows, so the write never commits.
pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    if let Some(stock) = data.stock
        && stock < 0
    {
        return Err(RepoError::Validation("stock cannot be negative".into()));
    }

    let rows = sqlx::query(
        "UPDATE product \
         SET name = COALESCE(?1, name), \
             description = COALESCE(?2, description), \
             price = COALESCE(?3, price), \
             stock = COALESCE(?4, stock), \
             is_active = COALESCE(?5, is_active), \
             updated_at = ?6 \
         WHERE id = ?7 AND COALESCE(?4, stock) >= reserved",
    )
    .bind(data.name)
    .bind(data.description)
    .bind(data.price)
    .bind(data.stock)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        // Zero rows means either the product is missing or the stock guard hit
        return match find_by_id(pool, id).await? {
            Some(product) => Err(RepoError::Validation(format!(
                "stock cannot drop below reserved quantity ({})",
                product.reserved
            ))),
            None => Err(RepoError::NotFound(format!("Product {id} not found"))),
        };
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}
