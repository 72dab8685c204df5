use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the receiving workflow after a successful commit.
/// Consumers (projections, notifications) subscribe through the channel;
/// emission never affects the outcome of the business operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ReceiptCreated {
        receipt_id: Uuid,
        receipt_number: String,
        supplier_id: Uuid,
    },
    ReceiptLineAdded {
        receipt_id: Uuid,
        line_item_id: Uuid,
        product_id: Uuid,
        received_quantity: Decimal,
    },
    ReceiptVerified {
        receipt_id: Uuid,
        discrepancy_count: usize,
    },
    ReceiptApproved {
        receipt_id: Uuid,
    },
    ReceiptAccepted {
        receipt_id: Uuid,
        receipt_number: String,
        line_count: usize,
    },
    ReceiptRejected {
        receipt_id: Uuid,
        reason: String,
    },
    ReceiptVoided {
        receipt_id: Uuid,
        reason: String,
        voided_by: Option<Uuid>,
    },
    StockIncremented {
        product_id: Uuid,
        quantity: Decimal,
        receipt_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is
    /// closed. Used after commit, where the business operation already
    /// succeeded.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("event dropped: {}", e);
        }
    }
}

/// Creates a connected sender/receiver pair with a bounded buffer.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Hosts that need real
/// projections replace this consumer with their own.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "event processed");
    }
}
