//! OpenRouteService directions client.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use loop_core::{Coordinate, RouteClient, RouteError, RouteRequest, RouteResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ORS_BASE_URL: &str = "https://api.openrouteservice.org";

/// HTTP client for the ORS `/v2/directions/{profile}/geojson` endpoint.
#[derive(Clone)]
pub struct OrsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct DirectionsBody<'a> {
    coordinates: Vec<[f64; 2]>,
    preference: &'a str,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<LineString>,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct LineString {
    // Positions may carry a third (elevation) value.
    #[serde(default)]
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
    summary: Option<Summary>,
    #[serde(default)]
    segments: Vec<Summary>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Summary {
    distance: Option<f64>,
    duration: Option<f64>,
}

impl OrsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into().trim().to_string(),
        })
    }

    fn directions_url(&self, request: &RouteRequest) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.base_url,
            request.profile.as_str()
        )
    }

    async fn fetch(&self, request: &RouteRequest) -> Result<Option<RouteResult>> {
        let body = DirectionsBody {
            coordinates: request
                .coordinates()
                .iter()
                .map(|point| point.to_lon_lat())
                .collect(),
            preference: request.preference.as_str(),
        };

        let response = self
            .client
            .post(self.directions_url(request))
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach routing engine")?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // ORS answers 404 when a waypoint cannot be snapped to a routable way.
            tracing::debug!("Routing engine found no route");
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Routing engine returned {}: {}", status, text);
        }

        let value: Value = response
            .json()
            .await
            .context("Failed to decode routing engine response")?;
        parse_directions(value)
    }
}

#[async_trait]
impl RouteClient for OrsClient {
    async fn route(&self, request: &RouteRequest) -> Result<Option<RouteResult>, RouteError> {
        match self.fetch(request).await {
            Ok(route) => Ok(route),
            Err(err) if is_timeout(&err) => {
                // A stalled engine counts as "no route", same as the fitter's own timer.
                tracing::warn!("Routing engine timed out: {:#}", err);
                Ok(None)
            }
            Err(err) => Err(RouteError::NetworkFailure(format!("{err:#}"))),
        }
    }
}

fn is_timeout(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_timeout)
    })
}

/// Turn a GeoJSON directions response into a route.
///
/// The path comes from the first feature. Distance and duration come from the
/// route summary, then the first segment, and finally from the path itself.
pub fn parse_directions(value: Value) -> Result<Option<RouteResult>> {
    let collection: FeatureCollection =
        serde_json::from_value(value).context("Unexpected directions payload")?;

    let Some(feature) = collection.features.into_iter().next() else {
        return Ok(None);
    };

    let path: Vec<Coordinate> = feature
        .geometry
        .map(|geometry| geometry.coordinates)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|position| match position.as_slice() {
            [lon, lat, ..] => Some(Coordinate::new(*lon, *lat)),
            _ => None,
        })
        .filter(Coordinate::is_finite)
        .collect();
    if path.len() < 2 {
        return Ok(None);
    }

    let summary = feature
        .properties
        .summary
        .filter(has_distance)
        .or_else(|| feature.properties.segments.first().copied().filter(has_distance));

    let route = match summary {
        Some(Summary {
            distance: Some(distance_m),
            duration,
        }) => RouteResult {
            duration_s: duration
                .filter(|value| value.is_finite() && *value >= 0.0)
                .unwrap_or_else(|| fallback_duration_s(distance_m)),
            distance_m,
            path,
        },
        _ => {
            tracing::warn!("Route summary missing, estimating stats from the path");
            RouteResult::from_path(path)
        }
    };
    Ok(Some(route))
}

fn has_distance(summary: &Summary) -> bool {
    summary
        .distance
        .is_some_and(|distance| distance.is_finite() && distance > 0.0)
}

fn fallback_duration_s(distance_m: f64) -> f64 {
    distance_m / loop_core::models::FALLBACK_PACE_M_PER_MIN * 60.0
}
