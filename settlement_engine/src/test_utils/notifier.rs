use std::sync::{Arc, Mutex};

use crate::{
    db_types::{Clp, OrderId},
    traits::{NotificationResult, OrderNotifier, SettledOrder, TransferInstructions},
};

/// Records every email it is asked to send. A failing notifier records the attempt and then reports failure.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<OrderId>>>,
    transfers: Arc<Mutex<Vec<(OrderId, Clp)>>>,
    fail_with: Option<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self { fail_with: Some(reason.to_string()), ..Default::default() }
    }

    /// The orders a confirmation was sent for.
    pub fn sent(&self) -> Vec<OrderId> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }

    /// The orders transfer instructions were sent for, with the amount due.
    pub fn transfers(&self) -> Vec<(OrderId, Clp)> {
        self.transfers.lock().expect("notifier lock poisoned").clone()
    }

    fn result(&self) -> NotificationResult {
        match &self.fail_with {
            Some(reason) => NotificationResult::failed(reason.as_str()),
            None => NotificationResult::sent(),
        }
    }
}

impl OrderNotifier for RecordingNotifier {
    async fn send_order_confirmation(&self, settled: &SettledOrder) -> NotificationResult {
        self.sent.lock().expect("notifier lock poisoned").push(settled.order.order_id.clone());
        self.result()
    }

    async fn send_transfer_instructions(&self, instructions: &TransferInstructions) -> NotificationResult {
        let entry = (instructions.order.order_id.clone(), instructions.amount_due());
        self.transfers.lock().expect("notifier lock poisoned").push(entry);
        self.result()
    }
}
