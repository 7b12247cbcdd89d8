//! Shared application state: the one route session plus the service clients.

use crate::config::Config;
use anyhow::Result;
use chrono::{DateTime, Utc};
use loop_core::{
    Applied, FitOutcome, FitTicket, PendingFit, RouteClient, RouteError, RouteFitter,
    RouteSession, SessionSnapshot, ShapePlanner,
};
use loop_services::{CachedRouteClient, OllamaPlanner, OrsClient};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct SessionSlot {
    session: RouteSession,
    updated_at: Option<DateTime<Utc>>,
}

/// Session view returned by `GET /v1/routes/current`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Application state. The session lock is only ever held for synchronous edits;
/// fits run with it released.
pub struct AppState {
    slot: Mutex<SessionSlot>,
    fitter: RouteFitter<Arc<dyn RouteClient>>,
    planner: Arc<dyn ShapePlanner>,
}

impl AppState {
    pub fn new(
        config: &Config,
        client: Arc<dyn RouteClient>,
        planner: Arc<dyn ShapePlanner>,
    ) -> Self {
        Self {
            slot: Mutex::new(SessionSlot::default()),
            fitter: RouteFitter::new(client, config.fitter_config()),
            planner,
        }
    }

    /// Wire the OpenRouteService client (behind the response cache) and the
    /// Ollama planner from configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        if config.ors_api_key.trim().is_empty() {
            tracing::warn!("ORS_API_KEY is not set; routing requests will be rejected upstream");
        }
        let ors = OrsClient::new(
            config.ors_base_url.clone(),
            config.ors_api_key.clone(),
            config.route_timeout(),
        )?;
        let client: Arc<dyn RouteClient> = Arc::new(CachedRouteClient::new(
            ors,
            config.route_cache_max_entries,
            Duration::from_secs(config.route_cache_ttl_s),
        ));
        let planner: Arc<dyn ShapePlanner> = Arc::new(OllamaPlanner::new(
            config.ollama_url.clone(),
            config.ollama_model.clone(),
            config.route_timeout(),
        )?);
        Ok(Self::new(&config, client, planner))
    }

    pub fn fitter(&self) -> &RouteFitter<Arc<dyn RouteClient>> {
        &self.fitter
    }

    pub fn planner(&self) -> &dyn ShapePlanner {
        self.planner.as_ref()
    }

    fn slot(&self) -> MutexGuard<'_, SessionSlot> {
        // A panic mid-edit leaves the session usable; recover the guard.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin_generation(&self) -> FitTicket {
        self.slot().session.begin_generation()
    }

    /// Run a synchronous edit against the session.
    pub fn edit<T>(
        &self,
        apply: impl FnOnce(&mut RouteSession) -> Result<T, RouteError>,
    ) -> Result<T, RouteError> {
        apply(&mut self.slot().session)
    }

    /// Record a finished fit; stale tickets leave the session untouched.
    pub fn complete(&self, ticket: FitTicket, outcome: &FitOutcome) -> Applied {
        let mut slot = self.slot();
        let applied = slot.session.complete(ticket, outcome);
        if applied == Applied::Current {
            slot.updated_at = Some(Utc::now());
        }
        applied
    }

    /// Fit an edited waypoint list and record the result.
    pub async fn refit(&self, pending: PendingFit) -> (FitOutcome, Applied) {
        let outcome = self.fitter.fit_waypoints(pending.waypoints).await;
        let applied = self.complete(pending.ticket, &outcome);
        (outcome, applied)
    }

    pub fn ghost(&self, pointer: loop_core::Coordinate) -> Option<loop_core::Coordinate> {
        self.slot().session.ghost(pointer)
    }

    pub fn view(&self) -> SessionView {
        let slot = self.slot();
        SessionView {
            snapshot: slot.session.snapshot(),
            updated_at: slot.updated_at,
        }
    }
}
