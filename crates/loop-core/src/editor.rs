//! Interactive waypoint editing.
//!
//! The editor only mutates the list. Re-fitting after an edit is the caller's job
//! (see `RouteSession`), and always uses the edited list verbatim.

use crate::error::RouteError;
use crate::geometry::{haversine_km, nearest_point_on_path};
use crate::models::Coordinate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointEditor {
    waypoints: Vec<Coordinate>,
}

impl WaypointEditor {
    pub fn new(waypoints: Vec<Coordinate>) -> Self {
        Self { waypoints }
    }

    pub fn waypoints(&self) -> &[Coordinate] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Replace the whole list (new generation).
    pub fn replace(&mut self, waypoints: Vec<Coordinate>) {
        self.waypoints = waypoints;
    }

    pub fn is_closed(&self) -> bool {
        self.waypoints.len() >= 2 && self.waypoints.first() == self.waypoints.last()
    }

    /// Insert `point` into the segment with the cheapest detour.
    ///
    /// For each consecutive pair `(A, B)` the detour cost is
    /// `dist(A, point) + dist(point, B)`; the point goes between the pair with the
    /// lowest cost (first one on ties). Returns the index of the inserted point.
    /// A list without a segment yet rejects the point unchanged.
    pub fn insert(&mut self, point: Coordinate) -> Result<usize, RouteError> {
        let len = self.waypoints.len();
        if !point.is_finite() {
            return Err(RouteError::invalid_edit(len, "coordinate must be finite"));
        }
        if len < 2 {
            return Err(RouteError::invalid_edit(
                len,
                format!("need a segment to insert into, have {len} waypoint(s)"),
            ));
        }

        let best_pair = self
            .waypoints
            .windows(2)
            .enumerate()
            .map(|(idx, pair)| (idx, haversine_km(pair[0], point) + haversine_km(point, pair[1])))
            .fold(None::<(usize, f64)>, |best, (idx, cost)| match best {
                Some((_, best_cost)) if best_cost <= cost => best,
                _ => Some((idx, cost)),
            });

        let Some((segment, _)) = best_pair else {
            return Err(RouteError::invalid_edit(len, "no segment to insert into"));
        };
        let index = segment + 1;
        self.waypoints.insert(index, point);
        Ok(index)
    }

    /// Move the waypoint at `index` to `point`.
    ///
    /// The closing duplicate of a loop cannot be moved on its own; moving the start
    /// of a closed loop moves the closing point with it.
    pub fn move_to(&mut self, index: usize, point: Coordinate) -> Result<(), RouteError> {
        if !point.is_finite() {
            return Err(RouteError::invalid_edit(index, "coordinate must be finite"));
        }
        let len = self.waypoints.len();
        if index >= len {
            return Err(RouteError::invalid_edit(
                index,
                format!("index out of range for {len} waypoints"),
            ));
        }
        let closed = self.is_closed();
        if closed && index == len - 1 {
            return Err(RouteError::invalid_edit(
                index,
                "the closing waypoint follows the start of the loop",
            ));
        }

        self.waypoints[index] = point;
        if closed && index == 0 {
            self.waypoints[len - 1] = point;
        }
        Ok(())
    }

    /// Remove the waypoint at `index`. The first and last waypoints anchor the loop
    /// and cannot be deleted. Returns the removed coordinate.
    pub fn delete(&mut self, index: usize) -> Result<Coordinate, RouteError> {
        let len = self.waypoints.len();
        if index >= len {
            return Err(RouteError::invalid_edit(
                index,
                format!("index out of range for {len} waypoints"),
            ));
        }
        if index == 0 || index == len - 1 {
            return Err(RouteError::invalid_edit(
                index,
                "start and end waypoints anchor the loop",
            ));
        }
        Ok(self.waypoints.remove(index))
    }
}

/// Provisional insertion point on the rendered path closest to `pointer`.
///
/// The ghost is not part of the waypoint list until committed with
/// [`WaypointEditor::insert`].
pub fn ghost_point(path: &[Coordinate], pointer: Coordinate) -> Option<Coordinate> {
    nearest_point_on_path(path, pointer).map(|(point, _)| point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat)
    }

    fn closed_loop() -> WaypointEditor {
        WaypointEditor::new(vec![
            c(10.0, 54.0),
            c(10.0, 54.01),
            c(10.01, 54.01),
            c(10.01, 54.0),
            c(10.0, 54.0),
        ])
    }

    #[test]
    fn insert_goes_into_nearest_segment() {
        let mut editor = WaypointEditor::new(vec![c(0.0, 0.0), c(0.0, 1.0), c(0.0, 2.0)]);
        let new = c(0.05, 0.4);
        let index = editor.insert(new).unwrap();
        assert_eq!(index, 1);
        assert_eq!(
            editor.waypoints(),
            &[c(0.0, 0.0), new, c(0.0, 1.0), c(0.0, 2.0)]
        );
    }

    #[test]
    fn insert_picks_later_segment_when_closer() {
        let mut editor = closed_loop();
        // Just east of the eastern side (between waypoints 2 and 3).
        let index = editor.insert(c(10.0105, 54.005)).unwrap();
        assert_eq!(index, 3);
        assert_eq!(editor.len(), 6);
        assert!(editor.is_closed());
    }

    #[test]
    fn insert_ties_resolve_to_first_segment() {
        let mut editor = WaypointEditor::new(vec![c(0.0, 0.0), c(0.0, 1.0), c(0.0, 0.0)]);
        let index = editor.insert(c(0.1, 0.5)).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn insert_without_segment_is_rejected() {
        let mut editor = WaypointEditor::default();
        assert!(matches!(
            editor.insert(c(1.0, 1.0)),
            Err(RouteError::InvalidEdit { index: 0, .. })
        ));
        assert!(editor.is_empty());

        let mut editor = WaypointEditor::new(vec![c(1.0, 1.0)]);
        assert!(editor.insert(c(2.0, 2.0)).is_err());
        assert_eq!(editor.waypoints(), &[c(1.0, 1.0)]);
    }

    #[test]
    fn delete_rejects_anchors() {
        let mut editor = closed_loop();
        let before = editor.clone();

        for index in [0, 4] {
            assert!(matches!(
                editor.delete(index),
                Err(RouteError::InvalidEdit { index: i, .. }) if i == index
            ));
            assert_eq!(editor, before);
        }
        assert!(editor.delete(5).is_err());
        assert_eq!(editor, before);
    }

    #[test]
    fn delete_interior_keeps_anchors() {
        for index in 1..4 {
            let mut editor = closed_loop();
            let removed = editor.delete(index).unwrap();
            assert_eq!(removed, closed_loop().waypoints()[index]);
            assert_eq!(editor.len(), 4);
            assert_eq!(editor.waypoints()[0], c(10.0, 54.0));
            assert_eq!(editor.waypoints()[3], c(10.0, 54.0));
        }
    }

    #[test]
    fn move_replaces_in_place() {
        let mut editor = closed_loop();
        editor.move_to(2, c(10.02, 54.02)).unwrap();
        assert_eq!(editor.waypoints()[2], c(10.02, 54.02));
        assert_eq!(editor.len(), 5);
    }

    #[test]
    fn move_rejects_closing_duplicate() {
        let mut editor = closed_loop();
        let before = editor.clone();
        assert!(editor.move_to(4, c(11.0, 55.0)).is_err());
        assert!(editor.move_to(9, c(11.0, 55.0)).is_err());
        assert!(editor.move_to(1, c(f64::NAN, 55.0)).is_err());
        assert_eq!(editor, before);
    }

    #[test]
    fn move_start_keeps_loop_closed() {
        let mut editor = closed_loop();
        editor.move_to(0, c(9.99, 53.99)).unwrap();
        assert!(editor.is_closed());
        assert_eq!(editor.waypoints()[4], c(9.99, 53.99));
    }

    #[test]
    fn ghost_tracks_rendered_path() {
        let path = vec![c(0.0, 0.0), c(0.0, 0.01), c(0.01, 0.01)];
        let ghost = ghost_point(&path, c(0.002, 0.004)).unwrap();
        assert!(ghost.lon.abs() < 1e-12);
        assert!((ghost.lat - 0.004).abs() < 1e-9);
        assert!(ghost_point(&[], c(0.0, 0.0)).is_none());
    }
}
