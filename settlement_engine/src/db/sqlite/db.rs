//! `SqliteDatabase` is the SQLite implementation of the settlement engine backend.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::{clients, db_url, new_pool, orders, products, SqliteDatabaseError};
use crate::{
    db_types::{
        Client,
        ClientSegment,
        NewClient,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderLine,
        OrderStatusType,
        Product,
        SegmentRules,
    },
    traits::{OrderManagement, SettleOrderResult, SettledOrder, SettlementDatabase},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SettlementDatabase for SqliteDatabase {
    type Error = SqliteDatabaseError;

    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn settle_order(&self, order_id: &OrderId, rules: &SegmentRules) -> Result<SettleOrderResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        // The guard must be the first statement. It takes the write lock, so a concurrent settlement of the same
        // order waits here and then finds the order already moved on.
        if !orders::mark_processing_if_pending(order_id, &mut tx).await? {
            let current = orders::fetch_order_by_order_id(order_id, &mut tx).await?;
            tx.rollback().await?;
            let result = match current {
                Some(order) => {
                    debug!("🗃️ Order {order_id} is {} and will not be settled again", order.status);
                    SettleOrderResult::AlreadySettled(order.status)
                },
                None => SettleOrderResult::NotFound,
            };
            return Ok(result);
        }
        let order = orders::fetch_order_by_order_id(order_id, &mut tx).await?.ok_or_else(|| {
            let msg = format!(
                "Order {order_id} does not exist, but we updated it within this same transaction. This represents a \
                 bug and the transaction will be rolled back"
            );
            error!("🗃️ {msg}");
            SqliteDatabaseError::QueryError(msg)
        })?;
        let lines = orders::fetch_order_lines(order_id, &mut tx).await?;
        let mut stock_adjustments = Vec::with_capacity(lines.len());
        for line in &lines {
            let adjustment = products::apply_sale(line.product_id, line.quantity, &mut tx).await?;
            trace!(
                "🗃️ Stock for product {} ({}) adjusted from {} to {}",
                adjustment.product_id,
                adjustment.product_name,
                adjustment.old_stock,
                adjustment.new_stock
            );
            stock_adjustments.push(adjustment);
        }
        let client_id = order.client_id;
        let previous_segment = clients::fetch_client(client_id, &mut tx)
            .await?
            .map(|c| c.segment)
            .ok_or(SqliteDatabaseError::ClientNotFound(client_id))?;
        // This order is already `Processing`, so it is included in the totals.
        let (total_spent, order_count) = orders::settled_totals_for_client(client_id, &mut tx).await?;
        let segment = rules.evaluate(total_spent, order_count, previous_segment);
        let client = clients::update_aggregates(client_id, total_spent, order_count, segment, &mut tx)
            .await?
            .ok_or(SqliteDatabaseError::ClientNotFound(client_id))?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {order_id} settled. Client #{client_id} has spent {total_spent} over {order_count} orders and is \
             now {segment} (was {previous_segment})"
        );
        Ok(SettleOrderResult::Settled(SettledOrder { order, lines, stock_adjustments, client, previous_segment }))
    }

    async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_order_lines(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_client(&self, client_id: i64) -> Result<Option<Client>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let client = clients::fetch_client(client_id, &mut conn).await?;
        Ok(client)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Migrations are embedded in the binary.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn insert_client(&self, client: NewClient) -> Result<Client, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let client = clients::insert_client(client, &mut conn).await?;
        debug!("🗃️ Client #{} ({}) created", client.id, client.name);
        Ok(client)
    }

    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("🗃️ Product #{} ({}) created with {} units in stock", product.id, product.name, product.stock);
        Ok(product)
    }

    /// Stores a new `Pending` order with its lines in one transaction.
    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, SqliteDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Manual status change, for fulfilment tooling. It bypasses the settlement flow entirely.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
    ) -> Result<Option<Order>, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(order_id, status, &mut conn).await?;
        Ok(order)
    }

    pub async fn set_client_segment(
        &self,
        client_id: i64,
        segment: ClientSegment,
    ) -> Result<Option<Client>, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let client = clients::set_segment(client_id, segment, &mut conn).await?;
        Ok(client)
    }
}
