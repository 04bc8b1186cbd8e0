//! `RajaOngkir` API client for shipping rates and waybill tracking.
//!
//! Quotes are cached in-process for a short TTL keyed on
//! (origin, destination, weight, courier) since the aggregator's rate card
//! changes rarely and its API is slow and metered.

use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warna_moto_core::Rupiah;

use crate::config::RajaOngkirConfig;

/// How long a shipping quote stays cached.
const QUOTE_CACHE_TTL: Duration = Duration::from_secs(600);

/// Maximum cached quotes before eviction.
const QUOTE_CACHE_CAPACITY: u64 = 1_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Couriers the storefront offers.
pub const SUPPORTED_COURIERS: &[&str] = &["jne", "tiki", "pos"];

/// Errors that can occur when talking to the shipping aggregator.
#[derive(Debug, Error)]
pub enum RajaOngkirError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Courier is not one the store ships with.
    #[error("unsupported courier: {0}")]
    UnsupportedCourier(String),
}

/// One courier service option with its cost and delivery estimate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShippingService {
    /// Service code, e.g. `REG`, `YES`, `OKE`.
    pub service: String,
    pub description: String,
    pub cost: Rupiah,
    /// Estimated delivery time in days, as reported by the courier.
    pub etd: String,
}

/// Tracking status for a shipped order.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingInfo {
    pub waybill: String,
    pub courier: String,
    pub status: String,
    pub manifest: Vec<TrackingEvent>,
}

/// One scan event in a waybill's history.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingEvent {
    pub description: String,
    pub city: Option<String>,
    pub date: String,
    pub time: String,
}

#[derive(Hash, PartialEq, Eq)]
struct QuoteKey {
    destination: String,
    weight_grams: i64,
    courier: String,
}

/// `RajaOngkir` API client.
#[derive(Clone)]
pub struct RajaOngkirClient {
    client: reqwest::Client,
    base_url: String,
    origin_city: String,
    quote_cache: Cache<QuoteKey, Vec<ShippingService>>,
}

impl RajaOngkirClient {
    /// Create a new shipping aggregator client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &RajaOngkirConfig) -> Result<Self, RajaOngkirError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| RajaOngkirError::Parse(format!("Invalid API key format: {e}")))?;
        key.set_sensitive(true);
        headers.insert("key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            origin_city: config.origin_city.clone(),
            quote_cache: Cache::builder()
                .max_capacity(QUOTE_CACHE_CAPACITY)
                .time_to_live(QUOTE_CACHE_TTL)
                .build(),
        })
    }

    /// Quote shipping costs from the store's origin city to a destination.
    ///
    /// `weight_grams` is clamped to a minimum of 1 gram since the aggregator
    /// rejects zero weights.
    ///
    /// # Errors
    ///
    /// Returns error if the courier is unsupported, the request fails, or
    /// the response cannot be parsed.
    pub async fn cost(
        &self,
        destination_city: &str,
        weight_grams: i64,
        courier: &str,
    ) -> Result<Vec<ShippingService>, RajaOngkirError> {
        let courier = courier.to_lowercase();
        if !SUPPORTED_COURIERS.contains(&courier.as_str()) {
            return Err(RajaOngkirError::UnsupportedCourier(courier));
        }

        let weight_grams = weight_grams.max(1);
        let key = QuoteKey {
            destination: destination_city.to_owned(),
            weight_grams,
            courier: courier.clone(),
        };
        if let Some(cached) = self.quote_cache.get(&key).await {
            return Ok(cached);
        }

        let url = format!("{}/cost", self.base_url);
        let body = [
            ("origin", self.origin_city.as_str()),
            ("destination", destination_city),
            ("weight", &weight_grams.to_string()),
            ("courier", &courier),
        ];

        let response = self.client.post(&url).form(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RajaOngkirError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CostResponse = response
            .json()
            .await
            .map_err(|e| RajaOngkirError::Parse(e.to_string()))?;

        let services = flatten_cost_response(parsed)?;
        self.quote_cache.insert(key, services.clone()).await;

        Ok(services)
    }

    /// Track a waybill with its courier.
    ///
    /// # Errors
    ///
    /// Returns error if the courier is unsupported, the request fails, or
    /// the response cannot be parsed.
    pub async fn track(
        &self,
        waybill: &str,
        courier: &str,
    ) -> Result<TrackingInfo, RajaOngkirError> {
        let courier = courier.to_lowercase();
        if !SUPPORTED_COURIERS.contains(&courier.as_str()) {
            return Err(RajaOngkirError::UnsupportedCourier(courier));
        }

        let url = format!("{}/waybill", self.base_url);
        let body = [("waybill", waybill), ("courier", courier.as_str())];

        let response = self.client.post(&url).form(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RajaOngkirError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: WaybillResponse = response
            .json()
            .await
            .map_err(|e| RajaOngkirError::Parse(e.to_string()))?;

        let result = parsed.rajaongkir.result;
        Ok(TrackingInfo {
            waybill: waybill.to_owned(),
            courier,
            status: result.delivery_status.status,
            manifest: result
                .manifest
                .into_iter()
                .map(|m| TrackingEvent {
                    description: m.manifest_description,
                    city: m.city_name,
                    date: m.manifest_date,
                    time: m.manifest_time,
                })
                .collect(),
        })
    }
}

fn flatten_cost_response(response: CostResponse) -> Result<Vec<ShippingService>, RajaOngkirError> {
    let results = response.rajaongkir.results;
    let services = results
        .into_iter()
        .flat_map(|r| r.costs)
        .filter_map(|c| {
            let detail = c.cost.into_iter().next()?;
            Some(ShippingService {
                service: c.service,
                description: c.description,
                cost: Rupiah::from_whole(detail.value),
                etd: detail.etd,
            })
        })
        .collect::<Vec<_>>();

    if services.is_empty() {
        return Err(RajaOngkirError::Parse(
            "aggregator returned no services for route".to_owned(),
        ));
    }

    Ok(services)
}

// =============================================================================
// Wire types (aggregator response envelopes)
// =============================================================================

#[derive(Deserialize)]
struct CostResponse {
    rajaongkir: CostEnvelope,
}

#[derive(Deserialize)]
struct CostEnvelope {
    #[serde(default)]
    results: Vec<CourierResult>,
}

#[derive(Deserialize)]
struct CourierResult {
    #[serde(default)]
    costs: Vec<ServiceCost>,
}

#[derive(Deserialize)]
struct ServiceCost {
    service: String,
    description: String,
    cost: Vec<CostDetail>,
}

#[derive(Deserialize)]
struct CostDetail {
    value: i64,
    etd: String,
}

#[derive(Deserialize)]
struct WaybillResponse {
    rajaongkir: WaybillEnvelope,
}

#[derive(Deserialize)]
struct WaybillEnvelope {
    result: WaybillResult,
}

#[derive(Deserialize)]
struct WaybillResult {
    delivery_status: DeliveryStatus,
    #[serde(default)]
    manifest: Vec<ManifestEntry>,
}

#[derive(Deserialize)]
struct DeliveryStatus {
    status: String,
}

#[derive(Deserialize)]
struct ManifestEntry {
    manifest_description: String,
    city_name: Option<String>,
    manifest_date: String,
    manifest_time: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_cost_response() {
        let json = r#"{
            "rajaongkir": {
                "results": [{
                    "code": "jne",
                    "name": "Jalur Nugraha Ekakurir (JNE)",
                    "costs": [
                        {
                            "service": "OKE",
                            "description": "Ongkos Kirim Ekonomis",
                            "cost": [{"value": 38000, "etd": "3-6", "note": ""}]
                        },
                        {
                            "service": "REG",
                            "description": "Layanan Reguler",
                            "cost": [{"value": 44000, "etd": "2-3", "note": ""}]
                        }
                    ]
                }]
            }
        }"#;

        let parsed: CostResponse = serde_json::from_str(json).unwrap();
        let services = flatten_cost_response(parsed).unwrap();

        assert_eq!(services.len(), 2);
        assert_eq!(services[0].service, "OKE");
        assert_eq!(services[0].cost, Rupiah::from_whole(38_000));
        assert_eq!(services[1].etd, "2-3");
    }

    #[test]
    fn test_flatten_cost_response_empty_is_error() {
        let json = r#"{"rajaongkir": {"results": []}}"#;
        let parsed: CostResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            flatten_cost_response(parsed),
            Err(RajaOngkirError::Parse(_))
        ));
    }

    #[test]
    fn test_waybill_response_parses() {
        let json = r#"{
            "rajaongkir": {
                "result": {
                    "delivery_status": {"status": "DELIVERED"},
                    "manifest": [{
                        "manifest_description": "Received at sorting center",
                        "city_name": "BANDUNG",
                        "manifest_date": "2025-06-01",
                        "manifest_time": "08:15"
                    }]
                }
            }
        }"#;

        let parsed: WaybillResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.rajaongkir.result.delivery_status.status, "DELIVERED");
        assert_eq!(parsed.rajaongkir.result.manifest.len(), 1);
    }
}
