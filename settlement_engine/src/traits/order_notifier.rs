use crate::traits::{NotificationResult, SettledOrder, TransferInstructions};

/// Sends order emails to the buyer. This is best effort: failures are reported in the result, never as an error, and
/// never affect anything that has already been committed.
#[allow(async_fn_in_trait)]
pub trait OrderNotifier {
    async fn send_order_confirmation(&self, settled: &SettledOrder) -> NotificationResult;

    /// Tells a buyer who chose to pay by bank transfer how much to transfer for their pending order.
    async fn send_transfer_instructions(&self, instructions: &TransferInstructions) -> NotificationResult;
}
