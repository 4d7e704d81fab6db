use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Sport category of an activity.
///
/// TCX only distinguishes biking and running; everything else is exported
/// as `"Other"`. Decoding leaves the sport unset for unrecognized values so
/// a caller-supplied default can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Cycling,
    Running,
    Other,
}

/// Boundary marker carried by a waypoint.
///
/// Markers drive lap partitioning independent of raw timestamps: the first
/// waypoint of an activity is `Start`, the first waypoint of every later lap
/// is `Lap`, the final waypoint is `End`, and `Pause` flags samples taken
/// while the device detected no motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointKind {
    #[default]
    Regular,
    Start,
    Lap,
    Pause,
    End,
}

/// Geographic position of a waypoint.
///
/// Latitude and longitude come in pairs; a location with only an altitude
/// occurs when a trackpoint carries `AltitudeMeters` but no `Position`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            altitude: None,
        }
    }

    /// Whether this location has a usable coordinate pair.
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// One timestamped sample in an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub kind: WaypointKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Heart rate in beats per minute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u32>,
    /// Cadence in revolutions (or strides) per minute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<u32>,
    /// Instantaneous power in watts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    /// Cumulative calories burned up to this sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
}

impl Waypoint {
    pub fn new(timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            timestamp,
            kind: WaypointKind::Regular,
            location: None,
            heart_rate: None,
            cadence: None,
            power: None,
            calories: None,
        }
    }

    /// Whether this waypoint carries a usable coordinate pair.
    pub fn has_coordinates(&self) -> bool {
        self.location.is_some_and(|loc| loc.has_coordinates())
    }
}

/// A recorded activity: an ordered sequence of waypoints plus metadata.
///
/// After a successful decode the waypoint sequence is non-empty and ordered
/// by timestamp, the first waypoint is marked `Start` and the last `End`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Stable identifier derived from the activity content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<Sport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,
    /// UTC offset of the recording device, taken from the first waypoint.
    /// Not serialized; `FixedOffset` has no serde representation and the
    /// offset is recoverable from the waypoint timestamps.
    #[serde(skip)]
    pub timezone: Option<FixedOffset>,
    /// Total distance in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub waypoints: Vec<Waypoint>,
}

impl Activity {
    /// Overlay caller-known metadata on top of a decoded activity.
    ///
    /// Metadata set on `template` wins; waypoints, timing bounds and the
    /// recomputed distance always come from the decoded side. This replaces
    /// in-place mutation of a caller-supplied activity with a pure merge.
    pub fn merged_with(mut self, template: &Activity) -> Activity {
        if template.sport.is_some() {
            self.sport = template.sport;
        }
        if template.name.is_some() {
            self.name = template.name.clone();
        }
        if template.uid.is_some() {
            self.uid = template.uid.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_altitude_only_location_has_no_coordinates() {
        let loc = Location {
            latitude: None,
            longitude: None,
            altitude: Some(120.0),
        };
        assert!(!loc.has_coordinates());
        assert!(Location::new(45.0, -73.5).has_coordinates());
    }

    #[test]
    fn test_merge_template_wins_for_metadata() {
        let mut decoded = Activity::default();
        decoded.sport = Some(Sport::Running);
        decoded.name = Some("from file".to_string());
        decoded.distance = Some(1234.5);
        decoded.waypoints.push(Waypoint::new(ts("2024-05-01T10:00:00Z")));

        let template = Activity {
            sport: Some(Sport::Cycling),
            uid: Some("abc".to_string()),
            ..Activity::default()
        };

        let merged = decoded.merged_with(&template);
        assert_eq!(merged.sport, Some(Sport::Cycling));
        assert_eq!(merged.uid.as_deref(), Some("abc"));
        // Unset template fields keep decoded values.
        assert_eq!(merged.name.as_deref(), Some("from file"));
        assert_eq!(merged.distance, Some(1234.5));
        assert_eq!(merged.waypoints.len(), 1);
    }
}
