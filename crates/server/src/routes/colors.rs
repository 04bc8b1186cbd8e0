//! Nearest-color paint matching route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::product::{ColorMatch, is_valid_hex_color};
use crate::state::AppState;

/// How many nearest paints to return when the caller doesn't ask.
const DEFAULT_MATCH_LIMIT: i64 = 5;
/// Upper bound on the requested match count.
const MAX_MATCH_LIMIT: i64 = 20;

/// Color match request body.
#[derive(Debug, Deserialize)]
pub struct ColorMatchRequest {
    /// Target color as `#RRGGBB`.
    pub hex: String,
    /// How many matches to return; clamped to 1..=20.
    pub limit: Option<i64>,
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_MATCH_LIMIT)
        .clamp(1, MAX_MATCH_LIMIT)
}

/// Color match response payload.
#[derive(Debug, Serialize)]
pub struct ColorMatchResponse {
    pub matches: Vec<ColorMatch>,
}

/// POST /api/colors/match
///
/// Find the catalog paints closest to a target color. The distance metric
/// lives in the `find_closest_colors` procedure.
///
/// # Errors
///
/// Returns 400 if the hex code is malformed.
pub async fn match_colors(
    State(state): State<AppState>,
    Json(body): Json<ColorMatchRequest>,
) -> Result<Json<ColorMatchResponse>> {
    let hex = body.hex.trim();
    if !is_valid_hex_color(hex) {
        return Err(AppError::BadRequest(
            "hex must be a #RRGGBB color".to_owned(),
        ));
    }

    let matches = ProductRepository::new(state.pool())
        .match_colors(hex, clamp_limit(body.limit))
        .await?;

    Ok(Json(ColorMatchResponse { matches }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None), 5);
        assert_eq!(clamp_limit(Some(3)), 3);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), 20);
    }

    #[test]
    fn test_request_limit_is_optional() {
        let body: ColorMatchRequest = serde_json::from_str(r##"{"hex": "#1A2B3C"}"##).unwrap();

        assert_eq!(body.hex, "#1A2B3C");
        assert!(body.limit.is_none());
    }
}
