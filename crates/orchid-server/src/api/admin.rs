//! Authenticated admin order-management endpoints.

use std::collections::HashMap;
use std::time::SystemTime;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orchid_core::OrderStatus;
use orchid_db::OrderItemRow;
use orchid_shipping::codegen::{self, TrackingFormat};
use orchid_shipping::Carrier;

use super::{map_db_error, ApiError, AppState, OrderSummary};

// ---------------------------------------------------------------------------
// GET /admin/orders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct OrdersPageParams {
    page: Option<i64>,
    #[serde(rename = "perPage")]
    per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AdminOrder {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub payment_id: Option<String>,
    /// "card" / "promptpay" / "cash", when the payment lookup resolves one.
    pub payment_method: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrdersPageResponse {
    pub page: i64,
    pub per_page: i64,
    pub orders: Vec<AdminOrder>,
}

pub(super) async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrdersPageParams>,
) -> Result<Json<OrdersPageResponse>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);

    let rows = orchid_db::list_orders(&state.pool, per_page, (page - 1) * per_page)
        .await
        .map_err(|e| map_db_error(&e))?;

    let order_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut items_by_order: HashMap<i64, Vec<OrderItemRow>> = HashMap::new();
    for item in orchid_db::list_order_items_for(&state.pool, &order_ids)
        .await
        .map_err(|e| map_db_error(&e))?
    {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    // Payment enrichment fans out concurrently; each lookup settles on its
    // own, so one failure never blocks or fails the page.
    let payment_methods: Vec<Option<&'static str>> =
        futures::future::join_all(rows.iter().map(|row| {
            let payments = state.payments.clone();
            let payment_id = row.payment_id.clone();
            async move {
                match payment_id {
                    Some(id) => payments.payment_method(&id).await,
                    None => None,
                }
            }
        }))
        .await;

    let orders = rows
        .into_iter()
        .zip(payment_methods)
        .map(|(row, payment_method)| {
            let payment_id = row.payment_id.clone();
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            AdminOrder {
                summary: OrderSummary::from_row(row, items),
                payment_id,
                payment_method,
            }
        })
        .collect();

    Ok(Json(OrdersPageResponse {
        page,
        per_page,
        orders,
    }))
}

// ---------------------------------------------------------------------------
// PUT /admin/order-status
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ChangeStatusRequest {
    #[serde(rename = "orderId")]
    order_id: Option<i64>,
    #[serde(rename = "orderStatus")]
    order_status: Option<String>,
}

pub(super) async fn change_order_status(
    State(state): State<AppState>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<OrderSummary>, ApiError> {
    let order_id = request
        .order_id
        .ok_or_else(|| ApiError::bad_request("orderId is required"))?;
    let status = request
        .order_status
        .as_deref()
        .and_then(OrderStatus::parse)
        .ok_or_else(|| ApiError::bad_request("สถานะไม่ถูกต้อง"))?;

    let row = orchid_db::update_order_status(&state.pool, order_id, status.as_str())
        .await
        .map_err(|e| map_db_error(&e))?;
    let items = orchid_db::list_order_items(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(OrderSummary::from_row(row, items)))
}

// ---------------------------------------------------------------------------
// PUT /admin/order-shipping
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct UpdateShippingRequest {
    #[serde(rename = "orderId")]
    order_id: Option<i64>,
    carrier: Option<String>,
    tracking: Option<String>,
    // Older storefront builds submit these spellings.
    #[serde(rename = "trackingCarrier")]
    tracking_carrier: Option<String>,
    #[serde(rename = "trackingCode")]
    tracking_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct UpdateShippingResponse {
    pub message: &'static str,
    pub order: OrderSummary,
}

pub(super) async fn update_order_shipping(
    State(state): State<AppState>,
    Json(request): Json<UpdateShippingRequest>,
) -> Result<Json<UpdateShippingResponse>, ApiError> {
    let order_id = request
        .order_id
        .ok_or_else(|| ApiError::bad_request("orderId ไม่ถูกต้อง"))?;

    let carrier_value = request.carrier.or(request.tracking_carrier);
    let tracking_value = request.tracking.or(request.tracking_code);

    // Validate against the storefront's accepted spellings and persist the
    // canonical label.
    let carrier_label = match carrier_value.as_deref() {
        Some(value) => Some(
            Carrier::from_storefront_label(value)
                .map(Carrier::label)
                .ok_or_else(|| ApiError::bad_request("carrier ไม่ถูกต้อง"))?,
        ),
        None => None,
    };

    let row = orchid_db::update_order_shipping(
        &state.pool,
        order_id,
        carrier_label,
        tracking_value.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(&e))?;
    let items = orchid_db::list_order_items(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(UpdateShippingResponse {
        message: "บันทึกข้อมูลการจัดส่งสำเร็จ",
        order: OrderSummary::from_row(row, items),
    }))
}

// ---------------------------------------------------------------------------
// DELETE /admin/order/{id}
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct MessageResponse {
    pub message: &'static str,
}

pub(super) async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    orchid_db::delete_order(&state.pool, order_id)
        .await
        .map_err(|e| match e {
            orchid_db::DbError::NotFound => ApiError::not_found("ไม่พบคำสั่งซื้อ"),
            other => map_db_error(&other),
        })?;

    Ok(Json(MessageResponse {
        message: "ลบคำสั่งซื้อสำเร็จ",
    }))
}

// ---------------------------------------------------------------------------
// GET /admin/sales-summary
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SalesSummaryResponse {
    pub total_sales: Decimal,
    pub total_orders: i64,
    pub total_customers: i64,
}

pub(super) async fn sales_summary(
    State(state): State<AppState>,
) -> Result<Json<SalesSummaryResponse>, ApiError> {
    let total_sales = orchid_db::total_sales(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;
    let total_orders = orchid_db::count_orders(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;
    let total_customers = orchid_db::count_customers(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok(Json(SalesSummaryResponse {
        total_sales,
        total_orders,
        total_customers,
    }))
}

// ---------------------------------------------------------------------------
// POST /admin/generate-tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct GenerateTrackingRequest {
    format: Option<String>,
    branch: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct GenerateTrackingResponse {
    pub ok: bool,
    pub code: String,
    pub key: String,
    pub counter: i64,
}

pub(super) async fn generate_tracking_code(
    State(state): State<AppState>,
    Json(request): Json<GenerateTrackingRequest>,
) -> Result<Json<GenerateTrackingResponse>, ApiError> {
    let format = request
        .format
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("format is required"))?;
    let format =
        TrackingFormat::parse(format).ok_or_else(|| ApiError::bad_request("unsupported format"))?;

    let branch = request.branch.as_deref();
    let today = Local::now().date_naive();
    let key = codegen::sequence_key(format, branch, today);

    // The happy path is the atomic store increment. If the store is down the
    // endpoint stays available on a degraded epoch-derived counter, which
    // trades the uniqueness guarantee for availability.
    let counter = match orchid_db::next_sequence(&state.pool, &key).await {
        Ok(counter) => counter,
        Err(err) => {
            let counter = codegen::fallback_counter(SystemTime::now());
            tracing::warn!(
                key,
                counter,
                degraded = true,
                error = %err,
                "tracking sequence store unavailable; using epoch fallback counter"
            );
            counter
        }
    };

    let code = codegen::format_code(format, today, counter, branch);

    Ok(Json(GenerateTrackingResponse {
        ok: true,
        code,
        key,
        counter,
    }))
}
