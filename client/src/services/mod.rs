//! Workflow services over the procurement API

pub mod auth;
pub mod inventory_request;
pub mod purchase_order;
pub mod quotation;
pub mod supplier;

pub use auth::AuthService;
pub use inventory_request::{InventoryRequestInput, InventoryRequestService};
pub use purchase_order::PurchaseOrderService;
pub use quotation::{LinePrice, LineQuantity, QuotationService, QuotationUpdate};
pub use supplier::SupplierService;

/// API resource paths
pub mod paths {
    pub const LOGIN: &str = "/auth/login";
    pub const INVENTORY_REQUESTS: &str = "/inventory-requests";
    pub const INVENTORY_REQUEST_BATCH: &str = "/inventory-requests/batch";
    pub const QUOTATION_REQUESTS: &str = "/quotation-requests";
    pub const PURCHASE_ORDERS: &str = "/purchase-orders";
    pub const PURCHASE_ORDER_FROM_QUOTATION: &str = "/purchase-orders/from-quotation";
    pub const SUPPLIERS: &str = "/suppliers";
    pub const UPLOAD_IMAGE: &str = "/upload/image";
    pub const UPLOAD_DOCUMENT: &str = "/upload/document";
}

/// Current calendar year for control numbers
pub(crate) fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year()
}
