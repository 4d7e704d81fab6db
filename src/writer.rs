use std::io::Write;

use chrono::{DateTime, FixedOffset, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::distance::haversine_distance;
use crate::error::TcxError;
use crate::laps::{self, TcxLap};
use crate::model::{Activity, Sport, Waypoint};

type Result<T> = std::result::Result<T, TcxError>;

const NS_TCX: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
const NS_USER_PROFILE: &str = "http://www.garmin.com/xmlschemas/UserProfile/v2";
const NS_ACTIVITY_EXTENSION: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";
const NS_PROFILE_EXTENSION: &str = "http://www.garmin.com/xmlschemas/ProfileExtension/v1";
const NS_ACTIVITY_GOALS: &str = "http://www.garmin.com/xmlschemas/ActivityGoals/v1";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";

/// Encode an activity as a TCX document, using haversine distance for the
/// per-lap distance aggregates.
pub fn write_tcx(activity: &Activity) -> Result<String> {
    write_tcx_with(activity, haversine_distance)
}

/// Encode an activity as a TCX document with a caller-supplied distance
/// function for the per-lap aggregates.
///
/// The flat waypoint sequence is re-partitioned into laps from its boundary
/// markers (see [`laps::partition`]), then serialized with an XML
/// declaration and two-space indentation.
pub fn write_tcx_with<F>(activity: &Activity, distance: F) -> Result<String>
where
    F: Fn(&Waypoint, &Waypoint) -> f64,
{
    let laps = laps::partition(&activity.waypoints, &distance)?;

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("TrainingCenterDatabase");
    root.push_attribute(("xmlns", NS_TCX));
    root.push_attribute(("xmlns:ns2", NS_USER_PROFILE));
    root.push_attribute(("xmlns:tpx", NS_ACTIVITY_EXTENSION));
    root.push_attribute(("xmlns:ns4", NS_PROFILE_EXTENSION));
    root.push_attribute(("xmlns:ns5", NS_ACTIVITY_GOALS));
    root.push_attribute(("xmlns:xsi", NS_XSI));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("Activities")))?;
    write_activity(&mut writer, activity, &laps)?;
    writer.write_event(Event::End(BytesEnd::new("Activities")))?;

    write_author(&mut writer)?;

    writer.write_event(Event::End(BytesEnd::new("TrainingCenterDatabase")))?;

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_activity<W: Write>(
    writer: &mut Writer<W>,
    activity: &Activity,
    laps: &[TcxLap<'_>],
) -> Result<()> {
    let mut act = BytesStart::new("Activity");
    act.push_attribute(("Sport", sport_name(activity.sport)));
    writer.write_event(Event::Start(act))?;

    // partition() guarantees at least one lap for a non-empty sequence.
    let start_time = activity.start_time.unwrap_or(laps[0].start.timestamp);
    write_text_element(writer, "Id", &format_utc(start_time))?;

    for lap in laps {
        write_lap(writer, lap)?;
    }

    if let Some(name) = &activity.name {
        write_text_element(writer, "Notes", name)?;
    }

    writer.write_event(Event::End(BytesEnd::new("Activity")))?;
    Ok(())
}

fn write_lap<W: Write>(writer: &mut Writer<W>, lap: &TcxLap<'_>) -> Result<()> {
    let mut lap_el = BytesStart::new("Lap");
    lap_el.push_attribute(("StartTime", format_utc(lap.start.timestamp).as_str()));
    writer.write_event(Event::Start(lap_el))?;

    write_text_element(writer, "TotalTimeSeconds", &lap.total_time_seconds.to_string())?;
    write_text_element(writer, "DistanceMeters", &lap.distance_meters.to_string())?;
    write_text_element(writer, "Calories", &lap.calories.to_string())?;
    write_text_element(writer, "Intensity", "Active")?;
    write_text_element(writer, "TriggerMethod", "Manual")?;

    writer.write_event(Event::Start(BytesStart::new("Track")))?;
    for wp in &lap.trackpoints {
        write_trackpoint(writer, wp)?;
    }
    writer.write_event(Event::End(BytesEnd::new("Track")))?;

    writer.write_event(Event::End(BytesEnd::new("Lap")))?;
    Ok(())
}

fn write_trackpoint<W: Write>(writer: &mut Writer<W>, wp: &Waypoint) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Trackpoint")))?;
    write_text_element(writer, "Time", &format_utc(wp.timestamp))?;

    if let Some(loc) = wp.location {
        if let (Some(lat), Some(lon)) = (loc.latitude, loc.longitude) {
            writer.write_event(Event::Start(BytesStart::new("Position")))?;
            write_text_element(writer, "LatitudeDegrees", &lat.to_string())?;
            write_text_element(writer, "LongitudeDegrees", &lon.to_string())?;
            writer.write_event(Event::End(BytesEnd::new("Position")))?;
        }
        if let Some(altitude) = loc.altitude {
            write_text_element(writer, "AltitudeMeters", &altitude.to_string())?;
        }
    }

    if let Some(hr) = wp.heart_rate {
        let mut hr_el = BytesStart::new("HeartRateBpm");
        hr_el.push_attribute(("xsi:type", "HeartRateInBeatsPerMinute_t"));
        writer.write_event(Event::Start(hr_el))?;
        write_text_element(writer, "Value", &hr.to_string())?;
        writer.write_event(Event::End(BytesEnd::new("HeartRateBpm")))?;
    }

    if let Some(cadence) = wp.cadence {
        write_text_element(writer, "Cadence", &cadence.to_string())?;
    }

    if let Some(power) = wp.power {
        writer.write_event(Event::Start(BytesStart::new("Extensions")))?;
        let mut tpx = BytesStart::new("TPX");
        tpx.push_attribute(("xmlns", NS_ACTIVITY_EXTENSION));
        writer.write_event(Event::Start(tpx))?;
        write_text_element(writer, "Watts", &(power as i64).to_string())?;
        writer.write_event(Event::End(BytesEnd::new("TPX")))?;
        writer.write_event(Event::End(BytesEnd::new("Extensions")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Trackpoint")))?;
    Ok(())
}

/// Fixed application block; TCX requires an author but the content does not
/// derive from activity data.
fn write_author<W: Write>(writer: &mut Writer<W>) -> Result<()> {
    let mut author = BytesStart::new("Author");
    author.push_attribute(("xsi:type", "Application_t"));
    writer.write_event(Event::Start(author))?;

    write_text_element(writer, "Name", "tcx-codec")?;

    writer.write_event(Event::Start(BytesStart::new("Build")))?;
    writer.write_event(Event::Start(BytesStart::new("Version")))?;
    write_text_element(writer, "VersionMajor", "0")?;
    write_text_element(writer, "VersionMinor", "0")?;
    write_text_element(writer, "BuildMajor", "0")?;
    write_text_element(writer, "BuildMinor", "0")?;
    writer.write_event(Event::End(BytesEnd::new("Version")))?;
    writer.write_event(Event::End(BytesEnd::new("Build")))?;

    write_text_element(writer, "LangID", "en")?;
    write_text_element(writer, "PartNumber", "000-00000-00")?;

    writer.write_event(Event::End(BytesEnd::new("Author")))?;
    Ok(())
}

fn sport_name(sport: Option<Sport>) -> &'static str {
    match sport {
        Some(Sport::Cycling) => "Biking",
        Some(Sport::Running) => "Running",
        Some(Sport::Other) | None => "Other",
    }
}

fn format_utc(timestamp: DateTime<FixedOffset>) -> String {
    timestamp.with_timezone(&Utc).format(DATE_FORMAT).to_string()
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
