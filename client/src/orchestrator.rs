//! Procurement orchestrator
//!
//! Holds the active workflow stage, the loaded IRR/RPQ collections and the
//! badge counts, and keeps them in step with events published by the
//! services. Events live only as long as the orchestrator that owns the bus.

use std::future::Future;

use shared::{InventoryRequest, PurchaseOrderCounts, QuotationRequest};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::AppResult;
use crate::events::{EventBus, ProcurementEvent};
use crate::gateway::ApiClient;
use crate::services::{
    InventoryRequestService, PurchaseOrderService, QuotationService, SupplierService,
};

/// Workflow stage shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Irr,
    Rpq,
    Po,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Irr => write!(f, "Inventory requests"),
            Stage::Rpq => write!(f, "Product quotations"),
            Stage::Po => write!(f, "Purchase orders"),
        }
    }
}

/// Badge counts per stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageCounts {
    pub pending_irr: usize,
    pub open_rpq: usize,
    pub pending_orders: usize,
    pub pending_payments: usize,
}

pub struct Orchestrator {
    stage: Stage,
    inventory_requests: Vec<InventoryRequest>,
    quotations: Vec<QuotationRequest>,
    counts: StageCounts,
    login_required: bool,
    events: EventBus,
    receiver: broadcast::Receiver<ProcurementEvent>,
    irr: InventoryRequestService,
    rpq: QuotationService,
    po: PurchaseOrderService,
    suppliers: SupplierService,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(api: ApiClient, requestor: impl Into<String>, config: OrchestratorConfig) -> Self {
        let events = EventBus::default();
        let receiver = events.subscribe();
        let api = api.with_events(events.clone());

        Self {
            stage: Stage::default(),
            inventory_requests: Vec::new(),
            quotations: Vec::new(),
            counts: StageCounts::default(),
            login_required: false,
            irr: InventoryRequestService::new(api.clone(), events.clone(), requestor),
            rpq: QuotationService::new(api.clone(), events.clone()),
            po: PurchaseOrderService::new(api.clone()),
            suppliers: SupplierService::new(api),
            events,
            receiver,
            config,
        }
    }

    pub fn inventory_request_service(&self) -> &InventoryRequestService {
        &self.irr
    }

    pub fn quotation_service(&self) -> &QuotationService {
        &self.rpq
    }

    pub fn purchase_order_service(&self) -> &PurchaseOrderService {
        &self.po
    }

    pub fn supplier_service(&self) -> &SupplierService {
        &self.suppliers
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Free navigation between stages
    pub fn select_stage(&mut self, stage: Stage) {
        if self.stage != stage {
            debug!(from = %self.stage, to = %stage, "Stage selected");
            self.stage = stage;
        }
    }

    pub fn counts(&self) -> StageCounts {
        self.counts
    }

    pub fn inventory_requests(&self) -> &[InventoryRequest] {
        &self.inventory_requests
    }

    pub fn quotations(&self) -> &[QuotationRequest] {
        &self.quotations
    }

    /// Set once the session ended; cleared by the next successful reload
    pub fn login_required(&self) -> bool {
        self.login_required
    }

    /// Fetch both collections and recompute their counts
    pub async fn reload(&mut self) -> AppResult<()> {
        let (inventory_requests, quotations) = tokio::try_join!(self.irr.list(), self.rpq.list())?;

        self.counts.pending_irr = inventory_requests.iter().filter(|r| r.is_pending()).count();
        self.counts.open_rpq = quotations.iter().filter(|q| !q.is_confirmed()).count();
        self.inventory_requests = inventory_requests;
        self.quotations = quotations;
        self.login_required = false;

        debug!(
            pending_irr = self.counts.pending_irr,
            open_rpq = self.counts.open_rpq,
            "Collections reloaded"
        );
        Ok(())
    }

    pub async fn refresh_purchase_order_counts(&mut self) -> AppResult<()> {
        let PurchaseOrderCounts {
            pending_orders,
            pending_payments,
        } = self.po.counts().await?;
        self.counts.pending_orders = pending_orders;
        self.counts.pending_payments = pending_payments;
        Ok(())
    }

    pub async fn handle_event(&mut self, event: ProcurementEvent) -> AppResult<()> {
        debug!(?event, "Handling procurement event");
        match event {
            ProcurementEvent::IrrProceededToRpq { .. } => {
                self.select_stage(Stage::Rpq);
                self.reload().await
            }
            ProcurementEvent::RpqDeleted { .. } | ProcurementEvent::ProductUpdated { .. } => {
                self.reload().await
            }
            ProcurementEvent::QuotationConfirmed { .. } | ProcurementEvent::PaymentUpdated { .. } => {
                self.reload().await?;
                self.refresh_purchase_order_counts().await
            }
            ProcurementEvent::SessionExpired => {
                info!("Session expired; sign in again");
                self.inventory_requests.clear();
                self.quotations.clear();
                self.counts = StageCounts::default();
                self.login_required = true;
                Ok(())
            }
        }
    }

    /// Handle every event already queued, without waiting
    pub async fn process_pending_events(&mut self) -> AppResult<usize> {
        let mut handled = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    self.handle_event(event).await?;
                    handled += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed procurement events; reloading");
                    self.reload().await?;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(handled),
            }
        }
    }

    /// React to events until `shutdown` resolves
    ///
    /// Failures are logged and the loop keeps going. While the purchase order
    /// stage is active its counts are refreshed on an interval.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut poll = tokio::time::interval(self.config.po_poll_interval());
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                received = self.receiver.recv() => {
                    let result = match received {
                        Ok(event) => self.handle_event(event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Missed procurement events; reloading");
                            self.reload().await
                        }
                        Err(RecvError::Closed) => break,
                    };
                    if let Err(e) = result {
                        warn!("Failed to refresh after event: {}", e);
                    }
                }
                _ = poll.tick(), if self.stage == Stage::Po && !self.login_required => {
                    if let Err(e) = self.refresh_purchase_order_counts().await {
                        warn!("Failed to refresh purchase order counts: {}", e);
                    }
                }
            }
        }
        debug!("Orchestrator stopped");
    }
}
