use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::distance::{calculate_distance, calculate_uid};
use crate::error::TcxError;
use crate::model::{Activity, Location, Sport, Waypoint, WaypointKind};

type Result<T> = std::result::Result<T, TcxError>;

/// How strictly the XML syntax is checked.
///
/// Real devices emit malformed TCX often enough that a strict parse failure
/// is retried in `Lenient` mode, which tolerates mismatched and unmatched
/// closing tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    Lenient,
}

/// Decode a TCX document into an [`Activity`].
///
/// The first `Activity` element of the document is decoded; anything after
/// it is ignored. A strict parse is attempted first; on an XML syntax error
/// (not a structural one) the document is re-parsed leniently before the
/// failure is surfaced.
pub fn parse_tcx(xml: &str) -> Result<Activity> {
    match parse_document(xml, ParseMode::Strict) {
        Err(TcxError::XmlParse(err)) => {
            tracing::debug!("strict TCX parse failed ({err}), retrying in lenient mode");
            parse_document(xml, ParseMode::Lenient)
        }
        other => other,
    }
}

/// Decode a TCX document, then overlay caller-known metadata on the result.
///
/// See [`Activity::merged_with`] for the overlay rules.
pub fn parse_tcx_merged(xml: &str, template: &Activity) -> Result<Activity> {
    Ok(parse_tcx(xml)?.merged_with(template))
}

fn parse_document(xml: &str, mode: ParseMode) -> Result<Activity> {
    let mut reader = Reader::from_str(xml);
    if mode == ParseMode::Lenient {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"Activities" => {
                return parse_activities(&mut reader);
            }
            Event::Eof => return Err(TcxError::MissingElement("Activities")),
            _ => {}
        }
    }
}

/// Parse the children of `<Activities>`, decoding the first `<Activity>`.
fn parse_activities(reader: &mut Reader<&[u8]>) -> Result<Activity> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"Activity" {
                    return parse_activity(reader, &e);
                }
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"Activities" => {
                return Err(TcxError::MissingElement("Activity"));
            }
            Event::Eof => return Err(TcxError::MissingElement("Activity")),
            _ => {}
        }
    }
}

fn parse_activity(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Activity> {
    let mut activity = Activity {
        sport: sport_attribute(start)?,
        ..Activity::default()
    };

    // Armed at the start of every lap, cleared by the lap's first trackpoint.
    let mut pending_lap_marker = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Lap" => {
                    pending_lap_marker = true;
                    parse_lap(reader, &mut activity, &mut pending_lap_marker)?;
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"Activity" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    // End always wins on the final sample, even over Start or Lap.
    let Some(last) = activity.waypoints.last_mut() else {
        return Err(TcxError::NoWaypoints);
    };
    last.kind = WaypointKind::End;
    activity.timezone = Some(*activity.waypoints[0].timestamp.offset());
    activity.start_time = activity.waypoints.iter().map(|wp| wp.timestamp).min();
    activity.end_time = activity.waypoints.iter().map(|wp| wp.timestamp).max();
    activity.distance = calculate_distance(&activity);
    activity.uid = calculate_uid(&activity);

    Ok(activity)
}

fn sport_attribute(start: &BytesStart<'_>) -> Result<Option<Sport>> {
    for attr_result in start.attributes() {
        let attr = attr_result.map_err(|e| TcxError::XmlParse(e.into()))?;
        if attr.key.local_name().as_ref() == b"Sport" {
            return Ok(match attr.value.as_ref() {
                b"Biking" => Some(Sport::Cycling),
                b"Running" => Some(Sport::Running),
                // Unknown sports stay unset so a caller default can apply.
                _ => None,
            });
        }
    }
    Err(TcxError::MissingAttribute {
        element: "Activity",
        attribute: "Sport",
    })
}

/// Parse a `<Lap>`. Only the first `<Track>` child is read; a lap without
/// a track is skipped silently since some producers emit empty laps.
fn parse_lap(
    reader: &mut Reader<&[u8]>,
    activity: &mut Activity,
    pending_lap_marker: &mut bool,
) -> Result<()> {
    let mut saw_track = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Track" if !saw_track => {
                    saw_track = true;
                    parse_track(reader, activity, pending_lap_marker)?;
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"Lap" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

fn parse_track(
    reader: &mut Reader<&[u8]>,
    activity: &mut Activity,
    pending_lap_marker: &mut bool,
) -> Result<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Trackpoint" => {
                    let mut wp = parse_trackpoint(reader)?;
                    if activity.waypoints.is_empty() {
                        wp.kind = WaypointKind::Start;
                    } else if *pending_lap_marker {
                        wp.kind = WaypointKind::Lap;
                    }
                    *pending_lap_marker = false;
                    activity.waypoints.push(wp);
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) if e.local_name().as_ref() == b"Trackpoint" => {
                return Err(TcxError::MissingElement("Time"));
            }
            Event::End(e) if e.local_name().as_ref() == b"Track" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

fn parse_trackpoint(reader: &mut Reader<&[u8]>) -> Result<Waypoint> {
    let mut timestamp: Option<DateTime<FixedOffset>> = None;
    let mut coordinates: Option<(f64, f64)> = None;
    let mut altitude: Option<f64> = None;
    let mut heart_rate: Option<u32> = None;
    let mut cadence: Option<u32> = None;
    let mut power: Option<f64> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Time" => {
                    let text = read_text_owned(reader, &e)?;
                    timestamp = Some(parse_time(&text)?);
                }
                b"Position" => {
                    coordinates = Some(parse_position(reader)?);
                }
                b"AltitudeMeters" => {
                    let text = read_text_owned(reader, &e)?;
                    altitude = Some(parse_number("AltitudeMeters", &text)?);
                }
                b"HeartRateBpm" => {
                    heart_rate = Some(parse_heart_rate(reader)?);
                }
                b"Cadence" => {
                    let text = read_text_owned(reader, &e)?;
                    cadence = Some(parse_number("Cadence", &text)?);
                }
                b"Extensions" => {
                    if let Some(watts) = parse_extensions(reader)? {
                        power = Some(watts);
                    }
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                // Present-but-empty required or numeric elements are hard
                // errors, not silently dropped data.
                b"Time" => {
                    return Err(TcxError::InvalidValue {
                        element: "Time",
                        value: String::new(),
                    });
                }
                b"Position" => return Err(TcxError::MissingElement("LatitudeDegrees")),
                b"AltitudeMeters" => {
                    return Err(TcxError::InvalidValue {
                        element: "AltitudeMeters",
                        value: String::new(),
                    });
                }
                b"Cadence" => {
                    return Err(TcxError::InvalidValue {
                        element: "Cadence",
                        value: String::new(),
                    });
                }
                b"HeartRateBpm" => return Err(TcxError::MissingElement("Value")),
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"Trackpoint" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    let mut wp = Waypoint::new(timestamp.ok_or(TcxError::MissingElement("Time"))?);
    if let Some((lat, lon)) = coordinates {
        wp.location = Some(Location::new(lat, lon));
    }
    if let Some(altitude) = altitude {
        // Altitude without a position still produces a location.
        wp.location.get_or_insert_with(Location::default).altitude = Some(altitude);
    }
    wp.heart_rate = heart_rate;
    wp.cadence = cadence;
    wp.power = power;

    Ok(wp)
}

/// Parse `<Position>`: both degree children are required once the element
/// is present.
fn parse_position(reader: &mut Reader<&[u8]>) -> Result<(f64, f64)> {
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"LatitudeDegrees" => {
                    let text = read_text_owned(reader, &e)?;
                    latitude = Some(parse_number("LatitudeDegrees", &text)?);
                }
                b"LongitudeDegrees" => {
                    let text = read_text_owned(reader, &e)?;
                    longitude = Some(parse_number("LongitudeDegrees", &text)?);
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"Position" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    let latitude = latitude.ok_or(TcxError::MissingElement("LatitudeDegrees"))?;
    let longitude = longitude.ok_or(TcxError::MissingElement("LongitudeDegrees"))?;
    Ok((latitude, longitude))
}

fn parse_heart_rate(reader: &mut Reader<&[u8]>) -> Result<u32> {
    let mut value: Option<u32> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Value" => {
                    let text = read_text_owned(reader, &e)?;
                    value = Some(parse_number("Value", &text)?);
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"HeartRateBpm" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    value.ok_or(TcxError::MissingElement("Value"))
}

/// Parse `<Extensions>`, extracting `TPX/Watts` when the whole chain is
/// present. Any other extension content is skipped.
fn parse_extensions(reader: &mut Reader<&[u8]>) -> Result<Option<f64>> {
    let mut watts: Option<f64> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"TPX" => {
                    watts = parse_tpx(reader)?;
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"Extensions" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(watts)
}

fn parse_tpx(reader: &mut Reader<&[u8]>) -> Result<Option<f64>> {
    let mut watts: Option<f64> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Watts" => {
                    let text = read_text_owned(reader, &e)?;
                    watts = Some(parse_number("Watts", &text)?);
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(e) if e.local_name().as_ref() == b"TPX" => break,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(watts)
}

/// Parse a trackpoint `<Time>`: RFC 3339, or a naive date-time normalized
/// to UTC when no offset is present.
fn parse_time(text: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|_| TcxError::InvalidValue {
            element: "Time",
            value: trimmed.to_string(),
        })
}

fn parse_number<T: FromStr>(element: &'static str, text: &str) -> Result<T> {
    let trimmed = text.trim();
    trimmed.parse().map_err(|_| TcxError::InvalidValue {
        element,
        value: trimmed.to_string(),
    })
}

/// Read text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references.
fn read_text_owned(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(raw);
            }
            Event::CData(e) => {
                let s = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(s);
            }
            Event::GeneralRef(e) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match name {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Event::End(e) if e.name().0 == end_name.as_slice() => break,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2">
{body}
</TrainingCenterDatabase>"#
        )
    }

    fn trackpoint(time: &str, lat: f64, lon: f64) -> String {
        format!(
            "<Trackpoint><Time>{time}</Time><Position>\
             <LatitudeDegrees>{lat}</LatitudeDegrees>\
             <LongitudeDegrees>{lon}</LongitudeDegrees>\
             </Position></Trackpoint>"
        )
    }

    fn three_point_ride() -> String {
        doc(&format!(
            r#"<Activities><Activity Sport="Biking"><Lap StartTime="2024-05-01T10:00:00Z"><Track>
{}{}{}
</Track></Lap></Activity></Activities>"#,
            trackpoint("2024-05-01T10:00:00Z", 48.8566, 2.3522),
            trackpoint("2024-05-01T10:00:05Z", 48.8570, 2.3530),
            trackpoint("2024-05-01T10:00:10Z", 48.8575, 2.3540),
        ))
    }

    #[test]
    fn test_biking_single_lap() {
        let activity = parse_tcx(&three_point_ride()).unwrap();
        assert_eq!(activity.sport, Some(Sport::Cycling));
        assert_eq!(activity.waypoints.len(), 3);
        assert_eq!(activity.waypoints[0].kind, WaypointKind::Start);
        assert_eq!(activity.waypoints[1].kind, WaypointKind::Regular);
        assert_eq!(activity.waypoints[2].kind, WaypointKind::End);

        let expected = crate::distance::calculate_distance(&activity).unwrap();
        assert_eq!(activity.distance, Some(expected));
        assert!(activity.uid.is_some());
    }

    #[test]
    fn test_time_bounds_cover_all_waypoints() {
        let activity = parse_tcx(&three_point_ride()).unwrap();
        let start = activity.start_time.unwrap();
        let end = activity.end_time.unwrap();
        for wp in &activity.waypoints {
            assert!(start <= wp.timestamp && wp.timestamp <= end);
        }
    }

    #[test]
    fn test_second_lap_marks_lap_waypoint() {
        let xml = doc(&format!(
            r#"<Activities><Activity Sport="Running">
<Lap><Track>{}{}</Track></Lap>
<Lap><Track>{}{}</Track></Lap>
</Activity></Activities>"#,
            trackpoint("2024-05-01T10:00:00Z", 48.0, 2.0),
            trackpoint("2024-05-01T10:00:05Z", 48.001, 2.0),
            trackpoint("2024-05-01T10:00:10Z", 48.002, 2.0),
            trackpoint("2024-05-01T10:00:15Z", 48.003, 2.0),
        ));
        let activity = parse_tcx(&xml).unwrap();
        assert_eq!(activity.sport, Some(Sport::Running));
        let kinds: Vec<_> = activity.waypoints.iter().map(|wp| wp.kind).collect();
        assert_eq!(
            kinds,
            vec![
                WaypointKind::Start,
                WaypointKind::Regular,
                WaypointKind::Lap,
                WaypointKind::End,
            ]
        );
    }

    #[test]
    fn test_empty_lap_defers_marker_to_next_lap() {
        let xml = doc(&format!(
            r#"<Activities><Activity Sport="Biking">
<Lap><Track>{}{}</Track></Lap>
<Lap></Lap>
<Lap><Track>{}{}</Track></Lap>
</Activity></Activities>"#,
            trackpoint("2024-05-01T10:00:00Z", 48.0, 2.0),
            trackpoint("2024-05-01T10:00:05Z", 48.001, 2.0),
            trackpoint("2024-05-01T10:00:10Z", 48.002, 2.0),
            trackpoint("2024-05-01T10:00:15Z", 48.003, 2.0),
        ));
        let activity = parse_tcx(&xml).unwrap();
        assert_eq!(activity.waypoints.len(), 4);
        assert_eq!(activity.waypoints[2].kind, WaypointKind::Lap);
    }

    #[test]
    fn test_single_trackpoint_end_wins_over_start() {
        let xml = doc(&format!(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>{}</Track></Lap></Activity></Activities>"#,
            trackpoint("2024-05-01T10:00:00Z", 48.0, 2.0),
        ));
        let activity = parse_tcx(&xml).unwrap();
        assert_eq!(activity.waypoints.len(), 1);
        assert_eq!(activity.waypoints[0].kind, WaypointKind::End);
    }

    #[test]
    fn test_missing_activities_fails() {
        let xml = doc("");
        assert!(matches!(
            parse_tcx(&xml),
            Err(TcxError::MissingElement("Activities"))
        ));
    }

    #[test]
    fn test_missing_activity_fails() {
        let xml = doc("<Activities></Activities>");
        assert!(matches!(
            parse_tcx(&xml),
            Err(TcxError::MissingElement("Activity"))
        ));
    }

    #[test]
    fn test_no_waypoints_fails() {
        let xml = doc(r#"<Activities><Activity Sport="Biking"><Lap></Lap></Activity></Activities>"#);
        assert!(matches!(parse_tcx(&xml), Err(TcxError::NoWaypoints)));
    }

    #[test]
    fn test_missing_sport_attribute_fails() {
        let xml = doc(&format!(
            r#"<Activities><Activity><Lap><Track>{}</Track></Lap></Activity></Activities>"#,
            trackpoint("2024-05-01T10:00:00Z", 48.0, 2.0),
        ));
        assert!(matches!(
            parse_tcx(&xml),
            Err(TcxError::MissingAttribute {
                element: "Activity",
                attribute: "Sport",
            })
        ));
    }

    #[test]
    fn test_unknown_sport_left_unset() {
        let xml = doc(&format!(
            r#"<Activities><Activity Sport="Hiking"><Lap><Track>{}</Track></Lap></Activity></Activities>"#,
            trackpoint("2024-05-01T10:00:00Z", 48.0, 2.0),
        ));
        let activity = parse_tcx(&xml).unwrap();
        assert_eq!(activity.sport, None);
    }

    #[test]
    fn test_template_sport_wins_over_derived() {
        let template = Activity {
            sport: Some(Sport::Other),
            ..Activity::default()
        };
        let activity = parse_tcx_merged(&three_point_ride(), &template).unwrap();
        assert_eq!(activity.sport, Some(Sport::Other));
    }

    #[test]
    fn test_optional_fields_parsed() {
        let xml = doc(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>
<Trackpoint>
  <Time>2024-05-01T10:00:00Z</Time>
  <Position><LatitudeDegrees>48.0</LatitudeDegrees><LongitudeDegrees>2.0</LongitudeDegrees></Position>
  <AltitudeMeters>120.5</AltitudeMeters>
  <HeartRateBpm><Value>142</Value></HeartRateBpm>
  <Cadence>85</Cadence>
  <Extensions><TPX><Watts>250</Watts></TPX></Extensions>
</Trackpoint>
</Track></Lap></Activity></Activities>"#,
        );
        let activity = parse_tcx(&xml).unwrap();
        let wp = &activity.waypoints[0];
        assert_eq!(wp.location.unwrap().altitude, Some(120.5));
        assert_eq!(wp.heart_rate, Some(142));
        assert_eq!(wp.cadence, Some(85));
        assert_eq!(wp.power, Some(250.0));
    }

    #[test]
    fn test_altitude_without_position_creates_location() {
        let xml = doc(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>
<Trackpoint><Time>2024-05-01T10:00:00Z</Time><AltitudeMeters>42.0</AltitudeMeters></Trackpoint>
</Track></Lap></Activity></Activities>"#,
        );
        let activity = parse_tcx(&xml).unwrap();
        let loc = activity.waypoints[0].location.unwrap();
        assert_eq!(loc.altitude, Some(42.0));
        assert!(loc.latitude.is_none());
        assert!(loc.longitude.is_none());
        assert!(!loc.has_coordinates());
    }

    #[test]
    fn test_naive_time_normalized_to_utc() {
        let xml = doc(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>
<Trackpoint><Time>2024-05-01T10:00:00</Time></Trackpoint>
</Track></Lap></Activity></Activities>"#,
        );
        let activity = parse_tcx(&xml).unwrap();
        let wp = &activity.waypoints[0];
        assert_eq!(wp.timestamp.offset().local_minus_utc(), 0);
        assert_eq!(activity.timezone.unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_timezone_taken_from_first_waypoint() {
        let xml = doc(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>
<Trackpoint><Time>2024-05-01T10:00:00+02:00</Time></Trackpoint>
<Trackpoint><Time>2024-05-01T10:00:05+02:00</Time></Trackpoint>
</Track></Lap></Activity></Activities>"#,
        );
        let activity = parse_tcx(&xml).unwrap();
        assert_eq!(activity.timezone.unwrap().local_minus_utc(), 7200);
    }

    #[test]
    fn test_malformed_time_fails() {
        let xml = doc(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>
<Trackpoint><Time>yesterday</Time></Trackpoint>
</Track></Lap></Activity></Activities>"#,
        );
        assert!(matches!(
            parse_tcx(&xml),
            Err(TcxError::InvalidValue { element: "Time", .. })
        ));
    }

    #[test]
    fn test_missing_time_fails() {
        let xml = doc(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>
<Trackpoint><Cadence>85</Cadence></Trackpoint>
</Track></Lap></Activity></Activities>"#,
        );
        assert!(matches!(
            parse_tcx(&xml),
            Err(TcxError::MissingElement("Time"))
        ));
    }

    #[test]
    fn test_position_missing_longitude_fails() {
        let xml = doc(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>
<Trackpoint><Time>2024-05-01T10:00:00Z</Time>
<Position><LatitudeDegrees>48.0</LatitudeDegrees></Position></Trackpoint>
</Track></Lap></Activity></Activities>"#,
        );
        assert!(matches!(
            parse_tcx(&xml),
            Err(TcxError::MissingElement("LongitudeDegrees"))
        ));
    }

    #[test]
    fn test_malformed_optional_field_fails() {
        let xml = doc(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>
<Trackpoint><Time>2024-05-01T10:00:00Z</Time><Cadence>fast</Cadence></Trackpoint>
</Track></Lap></Activity></Activities>"#,
        );
        assert!(matches!(
            parse_tcx(&xml),
            Err(TcxError::InvalidValue { element: "Cadence", .. })
        ));
    }

    #[test]
    fn test_lenient_retry_recovers_mismatched_end_tag() {
        // </track> does not match <Track>; the strict pass rejects it.
        let xml = doc(&format!(
            r#"<Activities><Activity Sport="Biking"><Lap><Track>{}</track></Lap></Activity></Activities>"#,
            trackpoint("2024-05-01T10:00:00Z", 48.0, 2.0),
        ));
        let activity = parse_tcx(&xml).unwrap();
        assert_eq!(activity.waypoints.len(), 1);
    }

    #[test]
    fn test_only_first_activity_decoded() {
        let xml = doc(&format!(
            r#"<Activities>
<Activity Sport="Biking"><Lap><Track>{}</Track></Lap></Activity>
<Activity Sport="Running"><Lap><Track>{}</Track></Lap></Activity>
</Activities>"#,
            trackpoint("2024-05-01T10:00:00Z", 48.0, 2.0),
            trackpoint("2024-06-01T10:00:00Z", 50.0, 3.0),
        ));
        let activity = parse_tcx(&xml).unwrap();
        assert_eq!(activity.sport, Some(Sport::Cycling));
        assert_eq!(activity.waypoints.len(), 1);
    }
}
