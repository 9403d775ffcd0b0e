//! In-process mock of the procurement API
//!
//! Holds its collections in memory and exposes switches for injecting
//! failures (rate limiting, rejected tokens, failed patches).

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Multipart, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use shared::{
    CreatedPurchaseOrder, DocumentSet, InventoryRequest, InventoryRequestChanges,
    InventoryRequestStatus, LineItem, NewInventoryRequest, NewQuotationRequest, PaymentMethod,
    PurchaseOrderSummary, QuotationRequest, QuotationStatus, Supplier, SupplierInput,
    SupplierType,
};
use uuid::Uuid;

use procurement_client::config::RetryConfig;
use procurement_client::gateway::{ApiClient, MemorySessionStore, NoticeBoard, StoredSession};

pub const TOKEN: &str = "test-token";

#[derive(Default)]
pub struct MockData {
    pub inventory_requests: Vec<InventoryRequest>,
    pub quotations: Vec<QuotationRequest>,
    pub suppliers: Vec<Supplier>,
    pub purchase_orders: Vec<PurchaseOrderSummary>,
    /// "METHOD /path" of every request that reached the server
    pub requests: Vec<String>,
    /// Answer this many upcoming requests with 429
    pub rate_limit_next: u32,
    pub reject_tokens: bool,
    pub fail_irr_patch: bool,
    pub fail_rpq_patch: bool,
    pub fail_po_create: bool,
    /// Hold every response for this long
    pub delay_ms: u64,
}

impl MockData {
    pub fn count(&self, prefix: &str) -> usize {
        self.requests.iter().filter(|r| r.starts_with(prefix)).count()
    }
}

#[derive(Clone, Default)]
pub struct MockState(Arc<Mutex<MockData>>);

impl MockState {
    pub fn lock(&self) -> MutexGuard<'_, MockData> {
        self.0.lock().unwrap()
    }
}

pub struct MockApi {
    pub base_url: String,
    pub state: MockState,
}

impl MockApi {
    pub async fn spawn() -> Self {
        let state = MockState::default();
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    pub fn data(&self) -> MutexGuard<'_, MockData> {
        self.state.lock()
    }

    /// Client with a live session and millisecond backoff
    pub fn client(&self) -> (ApiClient, Arc<MemorySessionStore>, Arc<NoticeBoard>) {
        let sessions = Arc::new(MemorySessionStore::with_session(StoredSession::new(TOKEN)));
        let board = Arc::new(NoticeBoard::new());
        let api = ApiClient::with_base_url(self.base_url.clone(), sessions.clone())
            .unwrap()
            .with_retry(fast_retry(3))
            .with_notifier(board.clone());
        (api, sessions, board)
    }

    pub fn add_supplier(&self, name: &str) -> Supplier {
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: name.to_string(),
            tin: None,
            supplier_type: SupplierType::Manufacturer,
            address: Some("1 Harbour Rd".into()),
            city: Some("Shenzhen".into()),
            country: Some("China".into()),
            contact_person: Some("Li Wei".into()),
            email: Some("sales@example.com".into()),
            phone: None,
            payment_method: PaymentMethod::Other,
            banking: Default::default(),
            created_at: Some(Utc::now()),
        };
        self.data().suppliers.push(supplier.clone());
        supplier
    }
}

pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        backoff_factor: 2.0,
    }
}

pub fn item(name: &str, quantity: i32) -> LineItem {
    LineItem::new(Uuid::new_v4(), name, quantity)
}

// ============================================================================
// Router
// ============================================================================

type ApiResult = Result<Response, (StatusCode, Json<Value>)>;

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "success": false, "error": message })))
}

fn not_found(what: &str) -> (StatusCode, Json<Value>) {
    error(StatusCode::NOT_FOUND, &format!("{} not found", what))
}

/// Lists come back wrapped, single entities bare
fn envelope<T: serde::Serialize>(data: T) -> ApiResult {
    Ok(Json(json!({ "success": true, "data": data })).into_response())
}

fn bare<T: serde::Serialize>(data: T) -> ApiResult {
    Ok(Json(data).into_response())
}

fn router(state: MockState) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/inventory-requests", get(list_irr))
        .route("/inventory-requests/batch", post(create_irr))
        .route(
            "/inventory-requests/:id",
            put(update_irr).patch(patch_irr).delete(delete_irr),
        )
        .route("/quotation-requests", get(list_rpq).post(create_rpq))
        .route(
            "/quotation-requests/:id",
            get(get_rpq).put(put_rpq).patch(patch_rpq).delete(delete_rpq),
        )
        .route("/purchase-orders", get(list_po))
        .route("/purchase-orders/from-quotation/:id", post(create_po))
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/suppliers/:id", put(update_supplier).delete(delete_supplier))
        .route("/upload/document", post(upload))
        .route("/upload/image", post(upload))
        .layer(middleware::from_fn_with_state(state.clone(), guard))
        .with_state(state);

    Router::new().nest("/api", api)
}

async fn guard(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().trim_start_matches("/api").to_string();
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v == format!("Bearer {}", TOKEN));

    let delay_ms = {
        let mut data = state.lock();
        data.requests.push(format!("{} {}", request.method(), path));

        if data.rate_limit_next > 0 {
            data.rate_limit_next -= 1;
            return error(StatusCode::TOO_MANY_REQUESTS, "Slow down").into_response();
        }
        if !path.starts_with("/auth/") && (!authorized || data.reject_tokens) {
            return error(StatusCode::UNAUTHORIZED, "Invalid token").into_response();
        }
        data.delay_ms
    };

    if delay_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
    }
    next.run(request).await
}

async fn login(Json(body): Json<Value>) -> ApiResult {
    if body["password"] != "secret" {
        return Err(error(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }
    bare(json!({
        "token": TOKEN,
        "user": { "id": Uuid::new_v4(), "name": "Ana Buyer", "email": body["email"] }
    }))
}

// ============================================================================
// Inventory requests
// ============================================================================

async fn list_irr(State(state): State<MockState>) -> ApiResult {
    envelope(state.lock().inventory_requests.clone())
}

async fn create_irr(State(state): State<MockState>, Json(body): Json<NewInventoryRequest>) -> ApiResult {
    let created = InventoryRequest {
        id: Uuid::new_v4(),
        control_number: body.control_number,
        requestor: body.requestor,
        supplier_id: body.supplier_id,
        items: body.items,
        remarks: body.remarks,
        status: body.status,
        created_at: Utc::now(),
    };
    state.lock().inventory_requests.push(created.clone());
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_irr(
    State(state): State<MockState>,
    Path(id): Path<Uuid>,
    Json(body): Json<InventoryRequestChanges>,
) -> ApiResult {
    let mut data = state.lock();
    let request = data
        .inventory_requests
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| not_found("Inventory request"))?;
    request.supplier_id = body.supplier_id;
    request.items = body.items;
    request.remarks = body.remarks;
    bare(request.clone())
}

async fn patch_irr(
    State(state): State<MockState>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult {
    let mut data = state.lock();
    if data.fail_irr_patch {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Status update failed"));
    }
    let request = data
        .inventory_requests
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| not_found("Inventory request"))?;
    if let Some(status) = body.get("status") {
        request.status = serde_json::from_value::<InventoryRequestStatus>(status.clone())
            .map_err(|_| error(StatusCode::BAD_REQUEST, "Unknown status"))?;
    }
    bare(request.clone())
}

async fn delete_irr(State(state): State<MockState>, Path(id): Path<Uuid>) -> ApiResult {
    let mut data = state.lock();
    let before = data.inventory_requests.len();
    data.inventory_requests.retain(|r| r.id != id);
    if data.inventory_requests.len() == before {
        return Err(not_found("Inventory request"));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ============================================================================
// Quotations
// ============================================================================

async fn list_rpq(State(state): State<MockState>) -> ApiResult {
    envelope(state.lock().quotations.clone())
}

async fn create_rpq(State(state): State<MockState>, Json(body): Json<NewQuotationRequest>) -> ApiResult {
    let created = QuotationRequest {
        id: Uuid::new_v4(),
        control_number: body.control_number,
        inventory_request_id: body.inventory_request_id,
        requestor: body.requestor,
        supplier_id: body.supplier_id,
        supplier: body.supplier,
        items: body.items,
        minimum_order_quantity: None,
        initial_payment_percent: None,
        final_payment_percent: None,
        initial_payment_amount: None,
        final_payment_amount: None,
        production_lead_time_days: None,
        production_remarks: None,
        documents: DocumentSet::default(),
        status: body.status,
        created_at: Utc::now(),
    };
    state.lock().quotations.push(created.clone());
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn get_rpq(State(state): State<MockState>, Path(id): Path<Uuid>) -> ApiResult {
    let data = state.lock();
    let quotation = data
        .quotations
        .iter()
        .find(|q| q.id == id)
        .ok_or_else(|| not_found("Quotation"))?;
    envelope(quotation.clone())
}

async fn put_rpq(
    State(state): State<MockState>,
    Path(id): Path<Uuid>,
    Json(body): Json<QuotationRequest>,
) -> ApiResult {
    let mut data = state.lock();
    let quotation = data
        .quotations
        .iter_mut()
        .find(|q| q.id == id)
        .ok_or_else(|| not_found("Quotation"))?;
    *quotation = body;
    bare(quotation.clone())
}

async fn patch_rpq(
    State(state): State<MockState>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ApiResult {
    let mut data = state.lock();
    if data.fail_rpq_patch {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Could not save quotation"));
    }
    let quotation = data
        .quotations
        .iter_mut()
        .find(|q| q.id == id)
        .ok_or_else(|| not_found("Quotation"))?;
    if let Some(status) = body.get("status") {
        quotation.status = serde_json::from_value::<QuotationStatus>(status.clone())
            .map_err(|_| error(StatusCode::BAD_REQUEST, "Unknown status"))?;
    }
    if let Some(documents) = body.get("documents") {
        quotation.documents = serde_json::from_value(documents.clone())
            .map_err(|_| error(StatusCode::BAD_REQUEST, "Bad documents"))?;
    }
    bare(quotation.clone())
}

/// Removing a quotation removes the inventory request it came from
async fn delete_rpq(State(state): State<MockState>, Path(id): Path<Uuid>) -> ApiResult {
    let mut data = state.lock();
    let irr_id = data
        .quotations
        .iter()
        .find(|q| q.id == id)
        .map(|q| q.inventory_request_id)
        .ok_or_else(|| not_found("Quotation"))?;
    data.quotations.retain(|q| q.id != id);
    data.inventory_requests.retain(|r| r.id != irr_id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ============================================================================
// Purchase orders
// ============================================================================

async fn list_po(State(state): State<MockState>) -> ApiResult {
    envelope(state.lock().purchase_orders.clone())
}

async fn create_po(State(state): State<MockState>, Path(id): Path<Uuid>) -> ApiResult {
    let mut data = state.lock();
    if data.fail_po_create {
        return Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Purchase order service unavailable"));
    }
    if !data.quotations.iter().any(|q| q.id == id && q.is_confirmed()) {
        return Err(error(StatusCode::CONFLICT, "Quotation is not confirmed"));
    }
    let number = format!("PO-{:04}", data.purchase_orders.len() + 1);
    let order = PurchaseOrderSummary {
        id: Uuid::new_v4(),
        po_number: Some(number.clone()),
        quotation_request_id: Some(id),
        status: "PENDING".into(),
        payment_status: Some("UNPAID".into()),
    };
    data.purchase_orders.push(order.clone());
    Ok((
        StatusCode::CREATED,
        Json(CreatedPurchaseOrder {
            id: order.id,
            po_number: Some(number),
        }),
    )
        .into_response())
}

// ============================================================================
// Suppliers and uploads
// ============================================================================

async fn list_suppliers(State(state): State<MockState>) -> ApiResult {
    envelope(state.lock().suppliers.clone())
}

fn supplier_from_input(id: Uuid, input: SupplierInput) -> Supplier {
    Supplier {
        id,
        name: input.name,
        tin: input.tin,
        supplier_type: input.supplier_type,
        address: input.address,
        city: input.city,
        country: input.country,
        contact_person: input.contact_person,
        email: input.email,
        phone: input.phone,
        payment_method: input.payment_method,
        banking: input.banking,
        created_at: Some(Utc::now()),
    }
}

async fn create_supplier(State(state): State<MockState>, Json(input): Json<SupplierInput>) -> ApiResult {
    let supplier = supplier_from_input(Uuid::new_v4(), input);
    state.lock().suppliers.push(supplier.clone());
    Ok((StatusCode::CREATED, Json(supplier)).into_response())
}

async fn update_supplier(
    State(state): State<MockState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SupplierInput>,
) -> ApiResult {
    let mut data = state.lock();
    let supplier = data
        .suppliers
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| not_found("Supplier"))?;
    *supplier = supplier_from_input(id, input);
    bare(supplier.clone())
}

async fn delete_supplier(State(state): State<MockState>, Path(id): Path<Uuid>) -> ApiResult {
    state.lock().suppliers.retain(|s| s.id != id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn upload(mut multipart: Multipart) -> ApiResult {
    let mut file_name = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_string);
            let _ = field.bytes().await;
        }
    }
    let file_name = file_name.ok_or_else(|| error(StatusCode::BAD_REQUEST, "Missing file"))?;
    bare(json!({ "url": format!("https://files.test/{}/{}", Uuid::new_v4(), file_name) }))
}
