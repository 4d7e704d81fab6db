use crate::error::TcxError;
use crate::model::{Waypoint, WaypointKind};

/// One derived lap: a contiguous run of exportable trackpoints plus the
/// aggregates TCX requires per lap.
#[derive(Debug)]
pub struct TcxLap<'a> {
    /// Waypoint the lap opened on; its timestamp becomes the lap `StartTime`.
    pub start: &'a Waypoint,
    /// Calories burned over the previous lap. Raw delta between cumulative
    /// counters, so a counter reset yields a negative value.
    pub calories: f64,
    pub total_time_seconds: f64,
    pub distance_meters: f64,
    pub trackpoints: Vec<&'a Waypoint>,
}

impl<'a> TcxLap<'a> {
    fn open(start: &'a Waypoint, calories: Option<f64>) -> Self {
        Self {
            start,
            calories: calories.unwrap_or(0.0),
            total_time_seconds: 0.0,
            distance_meters: 0.0,
            trackpoints: Vec::new(),
        }
    }

    fn finish<F>(&mut self, end: &Waypoint, distance: &F)
    where
        F: Fn(&Waypoint, &Waypoint) -> f64,
    {
        self.total_time_seconds =
            (end.timestamp - self.start.timestamp).num_milliseconds() as f64 / 1000.0;
        self.distance_meters = distance(self.start, end);
    }
}

/// Re-partition a flat waypoint sequence into laps.
///
/// Single forward pass with two pieces of state: the lap being built and an
/// `in_pause` flag. A new lap starts when pause is released on a non-pause
/// waypoint, or on any waypoint explicitly marked `Lap`; the boundary
/// waypoint becomes the first trackpoint of the new lap. Waypoints without
/// a coordinate pair are dropped from the track without touching lap state,
/// and consecutive `Pause` waypoints after the first are dropped as
/// duplicate signals.
///
/// `distance` supplies the per-lap distance between the lap's first and
/// last boundary waypoints.
pub fn partition<'a, F>(
    waypoints: &'a [Waypoint],
    distance: &F,
) -> Result<Vec<TcxLap<'a>>, TcxError>
where
    F: Fn(&Waypoint, &Waypoint) -> f64,
{
    let (Some(first), Some(last)) = (waypoints.first(), waypoints.last()) else {
        return Err(TcxError::NoWaypoints);
    };

    let mut laps = Vec::new();
    let mut current = TcxLap::open(first, None);
    let mut in_pause = false;

    for wp in waypoints {
        if !wp.has_coordinates() {
            tracing::debug!("dropping waypoint without coordinates at {}", wp.timestamp);
            continue;
        }
        if wp.kind == WaypointKind::Pause {
            if in_pause {
                continue;
            }
            in_pause = true;
        }
        if (in_pause && wp.kind != WaypointKind::Pause) || wp.kind == WaypointKind::Lap {
            in_pause = false;
            let calories = wp
                .calories
                .zip(current.start.calories)
                .map(|(current_total, previous_total)| current_total - previous_total);
            current.finish(wp, distance);
            laps.push(current);
            current = TcxLap::open(wp, calories);
        }
        current.trackpoints.push(wp);
    }

    // The loop never closes the trailing lap; close it on the sequence's
    // final waypoint even when that waypoint was dropped from the track.
    current.finish(last, distance);
    laps.push(current);

    Ok(laps)
}
