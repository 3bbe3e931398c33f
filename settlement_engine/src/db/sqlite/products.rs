use log::trace;
use sqlx::SqliteConnection;

use super::SqliteDatabaseError;
use crate::db_types::{stock_after_sale, NewProduct, Product, StockAdjustment};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as("INSERT INTO products (name, price, stock) VALUES ($1, $2, $3) RETURNING *")
        .bind(product.name)
        .bind(product.price.value())
        .bind(product.stock.max(0))
        .fetch_one(conn)
        .await?;
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Takes `quantity` units out of stock. Overselling empties the stock instead of failing.
pub async fn apply_sale(
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<StockAdjustment, SqliteDatabaseError> {
    let product =
        fetch_product(product_id, &mut *conn).await?.ok_or(SqliteDatabaseError::ProductNotFound(product_id))?;
    let new_stock = stock_after_sale(product.stock, quantity);
    sqlx::query("UPDATE products SET stock = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(new_stock)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    if new_stock == 0 && product.stock < quantity {
        trace!("🗃️ Product {product_id} oversold: {quantity} requested, {} in stock", product.stock);
    }
    Ok(StockAdjustment { product_id, product_name: product.name, quantity, old_stock: product.stock, new_stock })
}
