mod admin;
mod shipping;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use orchid_core::OrderStatus;
use orchid_db::{DbError, OrderItemRow, OrderRow};
use orchid_shipping::{ShippingError, Tracker};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState,
};
use crate::payments::PaymentLookup;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tracker: Arc<Tracker>,
    pub payments: Arc<PaymentLookup>,
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

/// Flat JSON error body: `{message}` plus an optional `carrier` (unsupported
/// carrier) or `error` (provider failure detail) field, with the status
/// derived from the error kind.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                message: message.into(),
                carrier: None,
                error: None,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn from_shipping(err: ShippingError) -> Self {
        match err {
            ShippingError::UnsupportedCarrier(carrier) => Self {
                status: StatusCode::BAD_REQUEST,
                body: ErrorBody {
                    message: "unsupported carrier".to_string(),
                    carrier: Some(carrier),
                    error: None,
                },
            },
            ShippingError::NotImplemented(_) => Self::new(
                StatusCode::NOT_IMPLEMENTED,
                "provider integration not implemented",
            ),
            ShippingError::ProviderFailed { carrier, message } => Self {
                status: StatusCode::BAD_GATEWAY,
                body: ErrorBody {
                    message: format!("{carrier} provider request failed"),
                    carrier: None,
                    error: Some(message),
                },
            },
            ShippingError::Http(err) => {
                tracing::error!(error = %err, "outbound HTTP client failure");
                Self::internal("internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub(super) fn map_db_error(error: &DbError) -> ApiError {
    if matches!(error, DbError::NotFound) {
        return ApiError::not_found("record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::internal("database query failed")
}

// ---------------------------------------------------------------------------
// Shared order projection
// ---------------------------------------------------------------------------

/// Read-only order projection exposed by lookup and admin responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderSummary {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub cart_total: Decimal,
    pub currency: String,
    pub tracking_carrier: Option<String>,
    pub tracking_code: Option<String>,
    pub order_status: String,
    pub order_status_text: &'static str,
    pub address: Option<String>,
    pub customer: Option<CustomerView>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CustomerView {
    pub name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderItemView {
    pub id: i64,
    pub title: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderSummary {
    pub(super) fn from_row(row: OrderRow, items: Vec<OrderItemRow>) -> Self {
        let order_status_text = OrderStatus::parse(&row.order_status)
            .map_or("ไม่ทราบสถานะ", OrderStatus::thai_label);

        let customer = if row.customer_name.is_none()
            && row.customer_email.is_none()
            && row.telephone.is_none()
        {
            None
        } else {
            Some(CustomerView {
                name: row.customer_name,
                email: row.customer_email,
                telephone: row.telephone,
            })
        };

        Self {
            id: row.id,
            created_at: row.created_at,
            cart_total: row.cart_total,
            currency: row.currency,
            tracking_carrier: row.tracking_carrier,
            tracking_code: row.tracking_code,
            order_status: row.order_status,
            order_status_text,
            address: row.address,
            customer,
            items: items
                .into_iter()
                .map(|item| OrderItemView {
                    id: item.id,
                    title: item.title,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
        }
    }

    /// Fill `trackingCarrier` from a heuristic guess, but only when the
    /// order stores none — the stored value is never overwritten.
    pub(super) fn with_carrier_hint(mut self, hint: Option<&str>) -> Self {
        if self.tracking_carrier.is_none() {
            self.tracking_carrier = hint.map(str::to_string);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Router assembly
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn admin_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/admin/orders", get(admin::list_orders))
        .route("/admin/order-status", put(admin::change_order_status))
        .route("/admin/order-shipping", put(admin::update_order_shipping))
        .route("/admin/order/{id}", delete(admin::delete_order))
        .route("/admin/sales-summary", get(admin::sales_summary))
        .route(
            "/admin/generate-tracking",
            post(admin::generate_tracking_code),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/shipping/track", post(shipping::track))
        .route("/shipping/lookup", get(shipping::lookup));

    Router::new()
        .merge(public_routes)
        .merge(admin_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match orchid_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthData {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
