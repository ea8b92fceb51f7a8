//! Database-facing models
//!
//! Plain serde structs; sqlx row derives are feature-gated behind `db` so
//! clients can use the same types without pulling in a database driver.

mod order;
mod product;

pub use order::{Order, OrderLine};
pub use product::{Product, ProductCreate, ProductUpdate};
