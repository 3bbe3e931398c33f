use crate::{
    db_types::{OrderId, SegmentRules},
    traits::SettleOrderResult,
};

/// This trait defines the storage behaviour needed to settle paid orders.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone {
    type Error: std::error::Error;

    /// The URL of the database
    fn url(&self) -> &str;

    /// Settles the order in a single atomic transaction:
    /// * The order moves from `Pending` to `Processing`. This is a conditional update and must be the first write in
    ///   the transaction, so that concurrent calls for the same order serialize on it. Only one of them can win.
    /// * Each line's product stock is reduced by the line quantity, floored at zero.
    /// * The client's spend and order count are recomputed from all of their settled orders (this one included) and
    ///   their segment is re-evaluated with `rules`.
    ///
    /// If the order is not `Pending`, nothing is changed and `AlreadySettled` is returned with its current status.
    /// Any error rolls back the whole transaction, leaving the order `Pending`.
    async fn settle_order(&self, order_id: &OrderId, rules: &SegmentRules) -> Result<SettleOrderResult, Self::Error>;

    async fn close(&mut self) -> Result<(), Self::Error>;
}
