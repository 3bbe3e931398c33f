use mockall::mock;
use settlement_engine::{
    GatewayError,
    GatewayPayment,
    NotificationResult,
    OrderNotifier,
    PaymentStatusLookup,
    SettledOrder,
    TransferInstructions,
};

mock! {
    pub Gateway {}
    impl PaymentStatusLookup for Gateway {
        async fn payment_status(&self, token: &str) -> Result<GatewayPayment, GatewayError>;
    }
}

mock! {
    pub Notifier {}
    impl OrderNotifier for Notifier {
        async fn send_order_confirmation(&self, settled: &SettledOrder) -> NotificationResult;
        async fn send_transfer_instructions(&self, instructions: &TransferInstructions) -> NotificationResult;
    }
}
