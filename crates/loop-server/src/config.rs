//! Server configuration from environment.

use loop_core::{FitterConfig, RoutePreference, TravelProfile};
use loop_services::ollama::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL};
use loop_services::ors::DEFAULT_ORS_BASE_URL;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub ors_base_url: String,
    pub ors_api_key: String,
    pub ors_profile: TravelProfile,
    pub ors_preference: RoutePreference,
    pub ollama_url: String,
    pub ollama_model: String,
    /// Per-request budget for routing and planner calls.
    pub route_timeout_s: u64,
    pub distance_tolerance: f64,
    pub route_cache_max_entries: usize,
    pub route_cache_ttl_s: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3001,
            ors_base_url: DEFAULT_ORS_BASE_URL.to_string(),
            ors_api_key: String::new(),
            ors_profile: TravelProfile::default(),
            ors_preference: RoutePreference::default(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            route_timeout_s: 20,
            distance_tolerance: 0.15,
            route_cache_max_entries: 256,
            route_cache_ttl_s: 600,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("LOOP_PORT", defaults.server_port),
            ors_base_url: env::var("ORS_BASE_URL").unwrap_or(defaults.ors_base_url),
            ors_api_key: env::var("ORS_API_KEY").unwrap_or_default(),
            ors_profile: parse_var("ORS_PROFILE", defaults.ors_profile),
            ors_preference: parse_var("ORS_PREFERENCE", defaults.ors_preference),
            ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            route_timeout_s: parse_var("ROUTE_TIMEOUT_S", defaults.route_timeout_s).max(1),
            distance_tolerance: parse_var("DISTANCE_TOLERANCE", defaults.distance_tolerance),
            route_cache_max_entries: parse_var(
                "ROUTE_CACHE_MAX_ENTRIES",
                defaults.route_cache_max_entries,
            ),
            route_cache_ttl_s: parse_var("ROUTE_CACHE_TTL_S", defaults.route_cache_ttl_s),
        }
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_secs(self.route_timeout_s)
    }

    pub fn fitter_config(&self) -> FitterConfig {
        let tolerance = if self.distance_tolerance.is_finite() && self.distance_tolerance > 0.0 {
            self.distance_tolerance
        } else {
            FitterConfig::default().tolerance
        };
        FitterConfig {
            tolerance,
            request_timeout: self.route_timeout(),
            profile: self.ors_profile,
            preference: self.ors_preference,
            ..FitterConfig::default()
        }
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitter_config_follows_server_config() {
        let config = Config {
            distance_tolerance: 0.1,
            route_timeout_s: 5,
            ors_profile: TravelProfile::FootWalking,
            ..Config::default()
        };
        let fitter = config.fitter_config();
        assert_eq!(fitter.tolerance, 0.1);
        assert_eq!(fitter.request_timeout, Duration::from_secs(5));
        assert_eq!(fitter.profile, TravelProfile::FootWalking);
        assert_eq!(fitter.max_no_route_attempts, 4);
    }

    #[test]
    fn nonsense_tolerance_uses_default() {
        let config = Config {
            distance_tolerance: -1.0,
            ..Config::default()
        };
        assert_eq!(config.fitter_config().tolerance, 0.15);
    }
}
