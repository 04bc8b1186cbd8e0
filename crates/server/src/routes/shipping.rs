//! Shipping quote and tracking route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::db::cart::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::CartSummary;
use crate::services::rajaongkir::{ShippingService, TrackingInfo};
use crate::state::AppState;

/// Shipping quote request body.
#[derive(Debug, Deserialize)]
pub struct CostRequest {
    /// Aggregator city id to ship to.
    pub destination_city: String,
    /// Courier code (`jne`, `tiki`, `pos`).
    pub courier: String,
}

/// Shipping quote response payload.
#[derive(Debug, Serialize)]
pub struct CostResponse {
    pub services: Vec<ShippingService>,
    /// The shipment weight the quote was computed for.
    pub weight_grams: i64,
}

/// Tracking query parameters.
#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    /// Air waybill number.
    pub awb: String,
    pub courier: String,
}

/// POST /api/shipping/cost
///
/// Quote courier services for the customer's current cart weight.
///
/// # Errors
///
/// Returns 400 for an empty cart or unsupported courier, 502 when the
/// aggregator is unavailable.
pub async fn cost(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<CostRequest>,
) -> Result<Json<CostResponse>> {
    if body.destination_city.trim().is_empty() {
        return Err(AppError::BadRequest(
            "destination_city is required".to_owned(),
        ));
    }

    let items = CartRepository::new(state.pool()).list(customer.id).await?;
    let summary = CartSummary::from_items(items);
    if summary.items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let services = state
        .rajaongkir()
        .cost(
            body.destination_city.trim(),
            summary.total_weight_grams,
            &body.courier,
        )
        .await?;

    Ok(Json(CostResponse {
        services,
        weight_grams: summary.total_weight_grams,
    }))
}

/// GET /api/shipping/track?awb=&courier=
///
/// # Errors
///
/// Returns 400 for a missing waybill or unsupported courier, 502 when the
/// aggregator is unavailable.
pub async fn track(
    State(state): State<AppState>,
    Query(params): Query<TrackQuery>,
) -> Result<Json<TrackingInfo>> {
    if params.awb.trim().is_empty() {
        return Err(AppError::BadRequest("awb is required".to_owned()));
    }

    let info = state
        .rajaongkir()
        .track(params.awb.trim(), &params.courier)
        .await?;

    Ok(Json(info))
}

#[cfg(test)]
mod tests {
    use axum::http::Uri;

    use super::*;

    #[test]
    fn test_track_params_parse_from_query_string() {
        let uri: Uri = "/api/shipping/track?awb=JNE123456789&courier=jne"
            .parse()
            .unwrap();
        let Query(params) = Query::<TrackQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(params.awb, "JNE123456789");
        assert_eq!(params.courier, "jne");
    }

    #[test]
    fn test_track_params_reject_missing_awb() {
        let uri: Uri = "/api/shipping/track?courier=jne".parse().unwrap();

        assert!(Query::<TrackQuery>::try_from_uri(&uri).is_err());
    }
}
