//! Natural-language shape planning.
//!
//! The planner itself is an external model; this module only defines the narrow
//! contract and turns whatever comes back into usable shape parameters. Nothing
//! here can block route generation: bad or missing output falls back to a square
//! with a random bearing.

use crate::error::RouteError;
use crate::geometry::normalize_bearing;
use crate::models::Sides;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const FALLBACK_DESCRIPTION: &str = "A loop around your starting point";

/// Returns the model's raw reply text for a user request.
#[async_trait]
pub trait ShapePlanner: Send + Sync {
    async fn suggest(&self, request: &str) -> Result<String, RouteError>;
}

#[async_trait]
impl<T: ShapePlanner + ?Sized> ShapePlanner for Arc<T> {
    async fn suggest(&self, request: &str) -> Result<String, RouteError> {
        (**self).suggest(request).await
    }
}

/// Shape parameters extracted from a planner reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSuggestion {
    pub sides: Sides,
    pub bearing_deg: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// True when nothing usable came back and defaults were applied.
    pub fallback: bool,
}

impl ShapeSuggestion {
    pub fn fallback(bearing_deg: f64) -> Self {
        Self {
            sides: Sides::Square,
            bearing_deg: normalize_bearing(bearing_deg),
            description: FALLBACK_DESCRIPTION.to_string(),
            distance_km: None,
            destination: None,
            fallback: true,
        }
    }
}

pub fn random_bearing<R: Rng>(rng: &mut R) -> f64 {
    rng.random_range(0.0..360.0)
}

/// Prompt sent to the model. Asks for JSON only.
pub fn build_prompt(request: &str) -> String {
    format!(
        "You plan closed-loop running and walking routes. Reply with JSON only, using the keys \
         \"sides\" (3, 4 or 5), \"bearing\" (degrees 0-359 for the first leg), \
         \"description\" (one short sentence), and optionally \"distance_km\" and \
         \"destination\".\nRequest: {request}"
    )
}

/// Interpret a raw reply, field by field, filling defaults for anything missing
/// or out of range. `fallback_bearing_deg` is used when no bearing is given.
pub fn interpret_reply(raw: &str, fallback_bearing_deg: f64) -> ShapeSuggestion {
    let Some(object) = extract_json_object(raw) else {
        tracing::warn!("Planner reply was not JSON; using default shape");
        return ShapeSuggestion::fallback(fallback_bearing_deg);
    };

    let sides = object
        .get("sides")
        .and_then(number)
        .filter(|value| value.fract() == 0.0 && (3.0..=5.0).contains(value))
        .and_then(|value| Sides::try_from(value as u8).ok());
    let bearing = object
        .get("bearing")
        .and_then(number)
        .filter(|value| value.is_finite())
        .map(normalize_bearing);
    let description = object
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    let distance_km = object
        .get("distance_km")
        .and_then(number)
        .filter(|value| value.is_finite() && *value > 0.0);
    let destination = object
        .get("destination")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    let fallback = sides.is_none() && bearing.is_none() && description.is_none();
    ShapeSuggestion {
        sides: sides.unwrap_or_default(),
        bearing_deg: bearing.unwrap_or_else(|| normalize_bearing(fallback_bearing_deg)),
        description: description.unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string()),
        distance_km,
        destination,
        fallback,
    }
}

/// Ask the planner and interpret its reply; any failure degrades to defaults.
pub async fn plan_shape<P>(planner: &P, request: &str, fallback_bearing_deg: f64) -> ShapeSuggestion
where
    P: ShapePlanner + ?Sized,
{
    match planner.suggest(request).await {
        Ok(raw) => interpret_reply(&raw, fallback_bearing_deg),
        Err(err) => {
            tracing::warn!("Planner unavailable, using default shape: {}", err);
            ShapeSuggestion::fallback(fallback_bearing_deg)
        }
    }
}

/// Models sometimes wrap the JSON in prose or code fences, or encode it twice.
fn extract_json_object(raw: &str) -> Option<serde_json::Map<String, Value>> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match value {
            Value::Object(map) => return Some(map),
            Value::String(inner) => return extract_json_object(&inner),
            _ => {}
        }
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end]).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

// Numbers may arrive as strings ("4").
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
