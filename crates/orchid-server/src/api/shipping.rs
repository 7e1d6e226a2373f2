//! Public shipment-tracking endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use orchid_shipping::{Carrier, TrackingEvent, TrackOutcome};

use super::{map_db_error, ApiError, AppState, OrderSummary};

// ---------------------------------------------------------------------------
// POST /shipping/track
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct TrackRequest {
    carrier: Option<String>,
    tracking: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct TrackResponse {
    pub provider: String,
    pub tracking: String,
    pub events: Option<Vec<TrackingEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<TrackOutcome> for TrackResponse {
    fn from(outcome: TrackOutcome) -> Self {
        Self {
            provider: outcome.provider.to_string(),
            tracking: outcome.tracking,
            events: outcome.events,
            warning: outcome.warning,
        }
    }
}

pub(super) async fn track(
    State(state): State<AppState>,
    Json(request): Json<TrackRequest>,
) -> Result<Json<TrackResponse>, ApiError> {
    let carrier = request
        .carrier
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let tracking = request
        .tracking
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (Some(carrier), Some(tracking)) = (carrier, tracking) else {
        return Err(ApiError::bad_request("carrier and tracking are required"));
    };

    let outcome = state
        .tracker
        .track(carrier, tracking)
        .await
        .map_err(ApiError::from_shipping)?;

    Ok(Json(outcome.into()))
}

// ---------------------------------------------------------------------------
// GET /shipping/lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct LookupParams {
    tracking: Option<String>,
    #[serde(rename = "trackingNumber")]
    tracking_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LookupResponse {
    pub ok: bool,
    pub order: OrderSummary,
    pub events: Option<Vec<TrackingEvent>>,
}

pub(super) async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResponse>, ApiError> {
    let tracking = params
        .tracking
        .or(params.tracking_number)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("tracking query required"))?;

    let order = orchid_db::find_order_by_tracking(&state.pool, &tracking)
        .await
        .map_err(|e| map_db_error(&e))?
        .ok_or_else(|| ApiError::not_found("ไม่พบคำสั่งซื้อสำหรับรหัสติดตามนี้"))?;

    let items = orchid_db::list_order_items(&state.pool, order.id)
        .await
        .map_err(|e| map_db_error(&e))?;

    // Prefer the carrier stored on the order; fall back to a pattern guess.
    // The guess only ever fills the response field when the order has none.
    let stored = order.tracking_carrier.as_deref().and_then(Carrier::from_alias);
    let guess = if stored.is_none() {
        Carrier::guess_from_tracking(&tracking)
    } else {
        None
    };

    let events = match stored.or(guess) {
        Some(carrier) => state.tracker.fetch_events(carrier, &tracking).await,
        None => None,
    };

    let order = OrderSummary::from_row(order, items)
        .with_carrier_hint(guess.map(Carrier::label));

    Ok(Json(LookupResponse {
        ok: true,
        order,
        events,
    }))
}
