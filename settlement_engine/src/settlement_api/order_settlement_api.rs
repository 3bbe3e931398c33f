use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{shipping_fee, Clp, OrderId, OrderStatusType, SegmentRules},
    events::{EventProducers, OrderSettledEvent},
    settlement_api::{Settlement, SettlementError, SettlementOutcome},
    traits::{
        GatewayPayment,
        NotificationResult,
        OrderItem,
        OrderManagement,
        OrderNotifier,
        PaymentStatusLookup,
        SettleOrderResult,
        SettledOrder,
        SettlementDatabase,
        TransferInstructions,
    },
};

/// `SettlementApi` turns a payment token into a settled order.
///
/// The procedure is:
/// 1. Ask the gateway for the payment behind the token. If that fails we know nothing, so nothing is changed and
///    [`SettlementError::Indeterminate`] is returned.
/// 2. Anything other than a paid status is reported as [`SettlementOutcome::NotPaid`].
/// 3. A paid order is settled atomically by the backend (see [`SettlementDatabase::settle_order`]). Only the caller
///    that actually moves the order out of `Pending` gets [`SettlementOutcome::Settled`]; every other caller sees
///    [`SettlementOutcome::AlreadySettled`].
/// 4. After the commit, the buyer is notified and the `OrderSettled` hook subscribers are called. Neither can undo
///    the settlement.
///
/// The gateway lookup happens before the store transaction starts, so no database lock is held across the network
/// call.
pub struct SettlementApi<B, G, N> {
    db: B,
    gateway: G,
    notifier: N,
    rules: SegmentRules,
    producers: EventProducers,
}

impl<B, G, N> Debug for SettlementApi<B, G, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi ({:?})", self.rules)
    }
}

impl<B, G, N> SettlementApi<B, G, N> {
    pub fn new(db: B, gateway: G, notifier: N, rules: SegmentRules, producers: EventProducers) -> Self {
        Self { db, gateway, notifier, rules, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn rules(&self) -> &SegmentRules {
        &self.rules
    }
}

impl<B, G, N> SettlementApi<B, G, N>
where
    B: SettlementDatabase,
    G: PaymentStatusLookup,
    N: OrderNotifier,
{
    /// Resolves the token with the gateway and settles the order if it has been paid.
    pub async fn settle(&self, token: &str) -> Result<Settlement, SettlementError> {
        let payment = self.gateway.payment_status(token).await.map_err(|e| {
            warn!("💳️ Could not look up payment status. Nothing will be changed. {e}");
            SettlementError::Indeterminate(e.to_string())
        })?;
        Ok(self.settle_payment(payment).await)
    }

    /// Settles the order for a payment that has already been looked up.
    pub async fn settle_payment(&self, payment: GatewayPayment) -> Settlement {
        let order_id = payment.order_id.clone();
        if !payment.status.is_paid() {
            debug!("💳️ Payment for order {order_id} has status {}. Nothing to settle.", payment.status);
            let outcome = SettlementOutcome::NotPaid(payment.status);
            return Settlement { payment, outcome };
        }
        let outcome = match self.db.settle_order(&order_id, &self.rules).await {
            Ok(SettleOrderResult::Settled(settled)) => {
                info!("💳️ Order {order_id} has been paid and is now {}", settled.order.status);
                if payment.amount != settled.order.total {
                    warn!(
                        "💳️ Order {order_id} totals {}, but the gateway reports a payment of {}. The order was settled \
                         anyway. Please check this payment manually.",
                        settled.order.total, payment.amount
                    );
                }
                let notification = self.notify(&settled).await;
                self.call_order_settled_hook(&settled, &payment).await;
                SettlementOutcome::Settled(settled, notification)
            },
            Ok(SettleOrderResult::AlreadySettled(status)) => {
                info!("💳️ Order {order_id} was already settled and is {status}. Nothing to do.");
                SettlementOutcome::AlreadySettled(status)
            },
            Ok(SettleOrderResult::NotFound) => {
                error!(
                    "💳️ The gateway reports a payment of {} for order {order_id}, but that order does not exist. This \
                     payment needs to be reconciled manually.",
                    payment.amount
                );
                SettlementOutcome::OrderNotFound
            },
            Err(e) => {
                error!("💳️ Could not settle order {order_id}. The order is still pending. {e}");
                SettlementOutcome::StoreFailure(e.to_string())
            },
        };
        Settlement { payment, outcome }
    }

    async fn notify(&self, settled: &SettledOrder) -> NotificationResult {
        let result = self.notifier.send_order_confirmation(settled).await;
        match &result.error {
            None if result.success => debug!("💳️ Confirmation for order {} sent", settled.order.order_id),
            err => warn!(
                "💳️ Order {} is settled, but the confirmation could not be sent. {}",
                settled.order.order_id,
                err.as_deref().unwrap_or("No reason given")
            ),
        }
        result
    }

    async fn call_order_settled_hook(&self, settled: &SettledOrder, payment: &GatewayPayment) {
        if self.producers.order_settled_subscriber_count() == 0 {
            return;
        }
        debug!("💳️ Notifying order settled hook subscribers");
        let event = OrderSettledEvent::new(settled.clone(), payment.clone());
        self.producers.publish_order_settled(event).await;
    }
}

impl<B, G, N> SettlementApi<B, G, N>
where
    B: OrderManagement,
    N: OrderNotifier,
{
    /// Emails bank transfer instructions for a pending order to its buyer.
    ///
    /// `shipping` defaults to the standard fee for the order total. The order stays `Pending`; it is settled like any
    /// other once the transfer has been received.
    pub async fn send_transfer_instructions(
        &self,
        order_id: &OrderId,
        shipping: Option<Clp>,
    ) -> Result<NotificationResult, SettlementError> {
        let instructions = self.transfer_instructions(order_id, shipping).await?;
        let result = self.notifier.send_transfer_instructions(&instructions).await;
        match &result.error {
            None if result.success => {
                info!("💳️ Transfer instructions for order {order_id} sent to {}", instructions.client.email)
            },
            err => warn!(
                "💳️ Transfer instructions for order {order_id} could not be sent. {}",
                err.as_deref().unwrap_or("No reason given")
            ),
        }
        Ok(result)
    }

    async fn transfer_instructions(
        &self,
        order_id: &OrderId,
        shipping: Option<Clp>,
    ) -> Result<TransferInstructions, SettlementError> {
        let store_error = |e: B::Error| {
            warn!("💳️ Could not load order {order_id}. {e}");
            SettlementError::StoreError(e.to_string())
        };
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
        if order.status != OrderStatusType::Pending {
            return Err(SettlementError::OrderNotPending(order_id.clone(), order.status));
        }
        let client = self.db.fetch_client(order.client_id).await.map_err(store_error)?.ok_or_else(|| {
            SettlementError::StoreError(format!("Client {} of order {order_id} does not exist", order.client_id))
        })?;
        let lines = self.db.fetch_order_lines(order_id).await.map_err(store_error)?;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let product_name = match self.db.fetch_product(line.product_id).await.map_err(store_error)? {
                Some(product) => product.name,
                None => format!("Product {}", line.product_id),
            };
            items.push(OrderItem {
                product_id: line.product_id,
                product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }
        let shipping = shipping.unwrap_or_else(|| shipping_fee(order.total));
        Ok(TransferInstructions { order, client, items, shipping })
    }
}
