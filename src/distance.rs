use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::model::{Activity, Waypoint};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two waypoints.
///
/// Waypoints without a coordinate pair contribute zero distance.
pub fn haversine_distance(from: &Waypoint, to: &Waypoint) -> f64 {
    let (Some(a), Some(b)) = (from.location, to.location) else {
        return 0.0;
    };
    let (Some(lat1), Some(lon1)) = (a.latitude, a.longitude) else {
        return 0.0;
    };
    let (Some(lat2), Some(lon2)) = (b.latitude, b.longitude) else {
        return 0.0;
    };

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Total path distance of an activity in meters.
///
/// Sums the haversine distance between consecutive coordinate-bearing
/// waypoints. Returns `None` when fewer than two waypoints carry
/// coordinates.
pub fn calculate_distance(activity: &Activity) -> Option<f64> {
    let mut total = 0.0;
    let mut segments = 0usize;
    let mut prev: Option<&Waypoint> = None;

    for wp in activity.waypoints.iter().filter(|wp| wp.has_coordinates()) {
        if let Some(prev) = prev {
            total += haversine_distance(prev, wp);
            segments += 1;
        }
        prev = Some(wp);
    }

    (segments > 0).then_some(total)
}

/// Stable identifier for an activity.
///
/// SHA-256 hex digest of the UTC start time truncated to whole seconds,
/// so re-decoding the same file always yields the same identifier even
/// when sub-second precision is lost on the wire. `None` without a start
/// time.
pub fn calculate_uid(activity: &Activity) -> Option<String> {
    let start = activity.start_time?;
    let rounded = start
        .with_timezone(&Utc)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let mut hasher = Sha256::new();
    hasher.update(rounded.as_bytes());
    Some(hex::encode(hasher.finalize()))
}
