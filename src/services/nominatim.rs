use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{BoundingBox, Coordinates, PlaceResult};
use crate::services::geocoding::Geocoder;
use crate::services::place_search::PlaceSearch;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Nominatim client for place search and (reverse) geocoding.
/// The public instance requires an identifying User-Agent and rate-limits
/// aggressively, so every request goes through the retry loop.
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl NominatimClient {
    pub fn new(base_url: String, user_agent: String) -> Self {
        NominatimClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
        }
    }

    fn search_url(&self, query: &str, viewbox: Option<&BoundingBox>, limit: usize) -> String {
        let mut url = format!(
            "{}/search?q={}&format=jsonv2&limit={}",
            self.base_url,
            urlencoding::encode(query),
            limit
        );
        if let Some(bbox) = viewbox {
            url.push_str(&format!(
                "&viewbox={}&bounded=1",
                urlencoding::encode(&bbox.to_viewbox())
            ));
        }
        url
    }

    fn reverse_url(&self, point: &Coordinates) -> String {
        format!(
            "{}/reverse?lat={}&lon={}&format=jsonv2",
            self.base_url, point.lat, point.lng
        )
    }

    /// GET with exponential backoff on transport errors, 429 and 5xx.
    /// `to_error` picks the error variant for the calling operation.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        to_error: fn(String) -> AppError,
    ) -> Result<T> {
        let mut retry_count = 0;

        loop {
            let response_result = self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, &self.user_agent)
                .timeout(Duration::from_secs(NOMINATIM_REQUEST_TIMEOUT_SECONDS))
                .send()
                .await;

            let error_msg = match response_result {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| to_error(format!("Failed to parse response: {}", e)));
                }
                Ok(response) => {
                    let status = response.status();
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    if !is_retryable(status) {
                        return Err(to_error(format!("HTTP {}: {}", status, error_text)));
                    }
                    format!("HTTP {}", status)
                }
                Err(e) if e.is_timeout() => "Request timed out".to_string(),
                Err(e) => format!("Request failed: {}", e),
            };

            if retry_count >= PLACE_SEARCH_MAX_RETRIES {
                return Err(to_error(format!(
                    "{} after {} attempts",
                    error_msg,
                    retry_count + 1
                )));
            }

            retry_count += 1;
            let backoff_ms = backoff_delay_ms(retry_count);
            tracing::warn!(
                retry = retry_count,
                backoff_ms,
                "Nominatim {}, retrying in {}ms (attempt {}/{})",
                error_msg,
                backoff_ms,
                retry_count + 1,
                PLACE_SEARCH_MAX_RETRIES + 1
            );
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff_delay_ms(retry: usize) -> u64 {
    PLACE_SEARCH_BACKOFF_BASE_MS * 2_u64.pow(retry as u32 - 1)
}

/// Parsed results inside `bbox`. `bounded=1` is a hint the server does not
/// always honour for large features.
fn within_viewbox(places: Vec<NominatimPlace>, bbox: &BoundingBox) -> Vec<PlaceResult> {
    places
        .into_iter()
        .filter_map(NominatimPlace::into_place_result)
        .filter(|place| bbox.contains(&place.location))
        .collect()
}

#[async_trait]
impl PlaceSearch for NominatimClient {
    async fn search(
        &self,
        query: &str,
        center: &Coordinates,
        radius_m: f64,
    ) -> Result<Vec<PlaceResult>> {
        let bbox = BoundingBox::from_center_radius(center, radius_m);
        let url = self.search_url(query, Some(&bbox), PLACE_SEARCH_RESULT_LIMIT);

        let places: Vec<NominatimPlace> = self.fetch_json(&url, AppError::Search).await?;
        let results = within_viewbox(places, &bbox);

        tracing::debug!(
            query = query,
            results = results.len(),
            "Place search '{}' returned {} results",
            query,
            results.len()
        );

        Ok(results)
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, address: &str) -> Result<Coordinates> {
        let url = self.search_url(address, None, 1);
        let places: Vec<NominatimPlace> = self.fetch_json(&url, AppError::Geocoding).await?;

        places
            .into_iter()
            .find_map(NominatimPlace::into_place_result)
            .map(|place| place.location)
            .ok_or_else(|| AppError::NotFound(format!("No location found for '{}'", address)))
    }

    async fn reverse_geocode(&self, point: &Coordinates) -> Result<String> {
        let url = self.reverse_url(point);
        let reverse: NominatimReverse = self.fetch_json(&url, AppError::Geocoding).await?;

        match (reverse.display_name, reverse.error) {
            (Some(name), _) => Ok(name),
            (None, Some(error)) => Err(AppError::NotFound(error)),
            (None, None) => Err(AppError::NotFound(format!(
                "No address found for ({}, {})",
                point.lat, point.lng
            ))),
        }
    }
}

// Nominatim API response types (format=jsonv2)

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, rename = "type")]
    place_type: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
}

impl NominatimPlace {
    /// Drops results whose coordinates do not parse or are out of range.
    fn into_place_result(self) -> Option<PlaceResult> {
        let lat = self.lat.parse().ok()?;
        let lng = self.lon.parse().ok()?;
        let location = Coordinates::new(lat, lng).ok()?;

        let category = match (self.category, self.place_type) {
            (Some(class), Some(kind)) => format!("{}:{}", class, kind),
            (Some(class), None) => class,
            (None, Some(kind)) => kind,
            (None, None) => String::new(),
        };

        Some(PlaceResult {
            location,
            display_name: self.display_name,
            category,
            importance: self.importance,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
