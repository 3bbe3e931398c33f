use log::{debug, trace};
use sqlx::SqliteConnection;

use super::SqliteDatabaseError;
use crate::db_types::{Clp, NewOrder, Order, OrderId, OrderLine, OrderStatusType};

/// Inserts a new order and its lines. This is not atomic by itself; pass `&mut *tx` to embed it in a transaction.
///
/// Orders always start out `Pending`. The first statement is the insert itself, so inside a transaction the write
/// lock is taken straight away. Duplicate ids and unknown clients or products are caught by the schema constraints.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SqliteDatabaseError> {
    if order.lines.is_empty() {
        return Err(SqliteDatabaseError::EmptyOrder(order.order_id));
    }
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                client_id,
                total,
                shipping_address,
                notes
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.client_id)
    .bind(order.total.value())
    .bind(order.shipping_address)
    .bind(order.notes)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match constraint_violation(&e) {
        Some(ConstraintViolation::Unique) => SqliteDatabaseError::DuplicateOrder(order.order_id.clone()),
        Some(ConstraintViolation::ForeignKey) => SqliteDatabaseError::ClientNotFound(order.client_id),
        None => SqliteDatabaseError::from(e),
    })?;
    for line in order.lines {
        sqlx::query("INSERT INTO order_lines (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)")
            .bind(inserted.order_id.as_str())
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price.value())
            .execute(&mut *conn)
            .await
            .map_err(|e| match constraint_violation(&e) {
                Some(ConstraintViolation::ForeignKey) => SqliteDatabaseError::ProductNotFound(line.product_id),
                _ => SqliteDatabaseError::from(e),
            })?;
    }
    debug!("🗃️ Order {} inserted with id {}", inserted.order_id, inserted.id);
    Ok(inserted)
}

enum ConstraintViolation {
    Unique,
    ForeignKey,
}

fn constraint_violation(e: &sqlx::Error) -> Option<ConstraintViolation> {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Some(ConstraintViolation::Unique),
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => Some(ConstraintViolation::ForeignKey),
        _ => None,
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_lines(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

/// Moves the order from `Pending` to `Processing`, if and only if it is currently `Pending`.
///
/// Returns `false` if no row was changed, either because the order does not exist or because it is in another state.
/// This is the settlement guard. Run it as the first statement of the settlement transaction so that concurrent
/// settlements of the same order queue up behind the write lock and see each other's result.
pub async fn mark_processing_if_pending(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND status = $3
        "#,
    )
    .bind(OrderStatusType::Processing)
    .bind(order_id.as_str())
    .bind(OrderStatusType::Pending)
    .execute(conn)
    .await?;
    trace!("🗃️ Settlement guard for {order_id} changed {} rows", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

/// The sum of totals and the number of the client's orders that count as settled (processing, shipped or delivered).
pub async fn settled_totals_for_client(
    client_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(Clp, i64), sqlx::Error> {
    let (total, count): (i64, i64) = sqlx::query_as(
        r#"
            SELECT COALESCE(SUM(total), 0), COUNT(*) FROM orders
            WHERE client_id = $1 AND status IN ($2, $3, $4)
        "#,
    )
    .bind(client_id)
    .bind(OrderStatusType::Processing)
    .bind(OrderStatusType::Shipped)
    .bind(OrderStatusType::Delivered)
    .fetch_one(conn)
    .await?;
    Ok((Clp::from(total), count))
}

pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $2 RETURNING *",
    )
    .bind(status)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
