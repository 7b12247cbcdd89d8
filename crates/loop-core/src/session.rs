//! The single in-memory route session.
//!
//! Every generation or edit takes a ticket carrying a sequence number. Fits run
//! without holding the session, and their outcomes are applied only when the
//! ticket is still the latest one issued, so a slow response can never overwrite
//! a newer route.

use crate::editor::{ghost_point, WaypointEditor};
use crate::error::RouteError;
use crate::models::{Coordinate, FitOutcome, FittedRoute, RouteStats};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitKind {
    /// New polygon from shape parameters; replaces the waypoint list on success.
    Generation,
    /// Re-fit of the edited waypoint list.
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitTicket {
    pub seq: u64,
    pub kind: FitKind,
}

/// An edit that has been applied and now needs a re-fit.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFit {
    pub ticket: FitTicket,
    pub waypoints: Vec<Coordinate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Applied {
    Current,
    /// A newer request was issued; the outcome was discarded.
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FitStatus {
    #[default]
    Idle,
    Pending { seq: u64 },
    Fitted,
    Failed { message: String },
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub seq: u64,
    pub waypoints: Vec<Coordinate>,
    pub route: Option<FittedRoute>,
    pub stats: Option<RouteStats>,
    pub status: FitStatus,
}

#[derive(Debug, Default)]
pub struct RouteSession {
    editor: WaypointEditor,
    current: Option<FittedRoute>,
    status: FitStatus,
    latest_seq: u64,
}

impl RouteSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waypoints(&self) -> &[Coordinate] {
        self.editor.waypoints()
    }

    pub fn current(&self) -> Option<&FittedRoute> {
        self.current.as_ref()
    }

    pub fn status(&self) -> &FitStatus {
        &self.status
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    fn issue(&mut self, kind: FitKind) -> FitTicket {
        self.latest_seq += 1;
        self.status = FitStatus::Pending {
            seq: self.latest_seq,
        };
        FitTicket {
            seq: self.latest_seq,
            kind,
        }
    }

    fn pending_edit(&mut self) -> PendingFit {
        PendingFit {
            ticket: self.issue(FitKind::Edit),
            waypoints: self.editor.waypoints().to_vec(),
        }
    }

    /// Start a new generation. Any fit still in flight becomes stale.
    pub fn begin_generation(&mut self) -> FitTicket {
        self.issue(FitKind::Generation)
    }

    pub fn insert(&mut self, point: Coordinate) -> Result<(usize, PendingFit), RouteError> {
        let index = self.editor.insert(point)?;
        Ok((index, self.pending_edit()))
    }

    pub fn move_waypoint(
        &mut self,
        index: usize,
        point: Coordinate,
    ) -> Result<PendingFit, RouteError> {
        self.editor.move_to(index, point)?;
        Ok(self.pending_edit())
    }

    pub fn delete_waypoint(&mut self, index: usize) -> Result<PendingFit, RouteError> {
        self.editor.delete(index)?;
        Ok(self.pending_edit())
    }

    /// Provisional insertion point on the currently rendered path.
    pub fn ghost(&self, pointer: Coordinate) -> Option<Coordinate> {
        let path = self.current.as_ref().map(|fitted| fitted.route.path.as_slice())?;
        ghost_point(path, pointer)
    }

    /// Apply a finished fit if its ticket is still the latest.
    pub fn complete(&mut self, ticket: FitTicket, outcome: &FitOutcome) -> Applied {
        if ticket.seq != self.latest_seq {
            tracing::warn!(
                "Discarding stale fit #{} (latest is #{})",
                ticket.seq,
                self.latest_seq
            );
            return Applied::Stale;
        }

        match outcome {
            FitOutcome::Fitted(fitted) => {
                self.adopt(ticket.kind, fitted.clone());
                self.status = FitStatus::Fitted;
            }
            FitOutcome::Failed { error, best_effort } => {
                if let Some(best) = best_effort {
                    self.adopt(ticket.kind, best.clone());
                }
                self.status = FitStatus::Failed {
                    message: error.to_string(),
                };
            }
        }
        Applied::Current
    }

    fn adopt(&mut self, kind: FitKind, fitted: FittedRoute) {
        if kind == FitKind::Generation {
            self.editor.replace(fitted.waypoints.clone());
        }
        self.current = Some(fitted);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            seq: self.latest_seq,
            waypoints: self.editor.waypoints().to_vec(),
            route: self.current.clone(),
            stats: self.current.as_ref().map(|fitted| fitted.route.stats()),
            status: self.status.clone(),
        }
    }
}
