use crate::db_types::{Client, Order, OrderId, OrderLine, Product};

/// Read-only queries over the shop's orders, clients and products.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    type Error: std::error::Error;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, Self::Error>;

    /// Returns the lines of the order in insertion order. Unknown orders have no lines.
    async fn fetch_order_lines(&self, order_id: &OrderId) -> Result<Vec<OrderLine>, Self::Error>;

    async fn fetch_client(&self, client_id: i64) -> Result<Option<Client>, Self::Error>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, Self::Error>;
}
