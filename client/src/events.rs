//! Workflow notifications between managers and the orchestrator

use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

/// Something another part of the client may need to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcurementEvent {
    /// An inventory request produced (or was linked to) a quotation
    IrrProceededToRpq { irr_id: Uuid, rpq_id: Uuid },
    /// A quotation was deleted; the server removed its inventory request too
    RpqDeleted { rpq_id: Uuid, irr_id: Uuid },
    /// A quotation was confirmed; the purchase order may or may not exist
    QuotationConfirmed {
        rpq_id: Uuid,
        purchase_order_id: Option<Uuid>,
    },
    /// Lines, quantities or terms of a quotation changed
    ProductUpdated { rpq_id: Uuid },
    /// The payment split of a quotation changed
    PaymentUpdated { rpq_id: Uuid },
    SessionExpired,
}

/// Broadcast channel scoped to one orchestrator
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ProcurementEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to current subscribers; dropped when nobody listens
    pub fn publish(&self, event: ProcurementEvent) {
        if self.sender.send(event).is_err() {
            trace!("No subscribers for procurement event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProcurementEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
