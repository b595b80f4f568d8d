use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, RouteError};
use crate::gpx_types::*;
use crate::route::Route;

/// Parse GPX text into a route.
///
/// The route name is empty when the document names nothing; callers pick
/// their own fallback (file name, counter).
pub fn parse_route(xml: &str) -> Result<Route> {
    Ok(parse_gpx(xml)?.into_route())
}

/// Parse a GPX XML string into GpxData.
pub fn parse_gpx(xml: &str) -> Result<GpxData> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;
    let mut data = GpxData::default();
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"gpx" {
                    saw_root = true;
                    parse_document(&mut reader, &mut data)?;
                } else {
                    reader.read_to_end(e.name())?;
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"gpx" {
                    saw_root = true;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    if !saw_root {
        return Err(RouteError::MalformedDocument(
            "missing <gpx> root element".to_string(),
        ));
    }

    Ok(data)
}

fn truncated(element: &str) -> RouteError {
    RouteError::MalformedDocument(format!("document ends inside <{element}>"))
}

/// Parse the children of <gpx>.
fn parse_document<'a>(reader: &mut Reader<&'a [u8]>, data: &mut GpxData) -> Result<()> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => {
                    let name = read_text_owned(reader, &e)?;
                    data.document_name.get_or_insert(name);
                }
                b"rte" => parse_rte(reader, data)?,
                b"trk" => parse_track(reader, data)?,
                _ => {
                    // metadata, wpt, extensions
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"gpx" => break,
            Ok(Event::Eof) => return Err(truncated("gpx")),
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(())
}

/// Parse lat/lon attributes from a point element's start tag.
///
/// Missing or non-numeric coordinates yield `None`; broken attribute
/// syntax is a document error.
fn parse_lat_lon(e: &BytesStart<'_>) -> Result<Option<(f64, f64)>> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(quick_xml::Error::from)?;
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match attr.key.local_name().as_ref() {
            b"lat" => lat = val.trim().parse::<f64>().ok(),
            b"lon" => lon = val.trim().parse::<f64>().ok(),
            _ => {}
        }
    }

    match (lat, lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Ok(Some((lat, lon))),
        _ => {
            tracing::warn!(
                element = %String::from_utf8_lossy(e.local_name().as_ref()),
                "skipping point without usable lat/lon"
            );
            Ok(None)
        }
    }
}

/// Parse a point element (rtept, trkpt) and its children.
/// Called after receiving Event::Start for the point element.
fn parse_point<'a>(
    start: &BytesStart<'a>,
    reader: &mut Reader<&'a [u8]>,
) -> Result<Option<GpxPoint>> {
    let Some((lat, lon)) = parse_lat_lon(start)? else {
        reader.read_to_end(start.name())?;
        return Ok(None);
    };

    let mut point = GpxPoint::new(lat, lon);
    let end_name = start.name().0.to_vec();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => point.name = Some(read_text_owned(reader, &e)?),
                _ => {
                    // ele, time, sym, extensions: not part of a route
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(truncated("point")),
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(Some(point))
}

/// Parse a point written as an empty element, e.g. `<trkpt lat=".." lon=".."/>`.
fn parse_empty_point(e: &BytesStart<'_>) -> Result<Option<GpxPoint>> {
    Ok(parse_lat_lon(e)?.map(|(lat, lon)| GpxPoint::new(lat, lon)))
}

/// Parse a <rte> element.
fn parse_rte<'a>(reader: &mut Reader<&'a [u8]>, data: &mut GpxData) -> Result<()> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => {
                    let name = read_text_owned(reader, &e)?;
                    data.route_name.get_or_insert(name);
                }
                b"rtept" => {
                    if let Some(pt) = parse_point(&e, reader)? {
                        data.route_points.push(pt);
                    }
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"rtept" {
                    if let Some(pt) = parse_empty_point(&e)? {
                        data.route_points.push(pt);
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"rte" => break,
            Ok(Event::Eof) => return Err(truncated("rte")),
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(())
}

/// Parse a <trk> element.
fn parse_track<'a>(reader: &mut Reader<&'a [u8]>, data: &mut GpxData) -> Result<()> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => {
                    let name = read_text_owned(reader, &e)?;
                    data.track_name.get_or_insert(name);
                }
                b"trkseg" => parse_segment(reader, data)?,
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trk" => break,
            Ok(Event::Eof) => return Err(truncated("trk")),
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(())
}

/// Parse a <trkseg> element.
fn parse_segment<'a>(reader: &mut Reader<&'a [u8]>, data: &mut GpxData) -> Result<()> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    if let Some(pt) = parse_point(&e, reader)? {
                        data.track_points.push(pt);
                    }
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    if let Some(pt) = parse_empty_point(&e)? {
                        data.track_points.push(pt);
                    }
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => return Err(truncated("trkseg")),
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(())
}

/// Read text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references (Event::GeneralRef).
fn read_text_owned<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        other => {
                            tracing::debug!(entity = other, "dropping unknown entity");
                        }
                    }
                }
            }
            Ok(Event::Start(e)) => {
                // Markup inside a name has no meaning for us.
                reader.read_to_end(e.name())?;
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(truncated("name")),
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_points_with_names() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <rte>
    <name>Harbour Run</name>
    <rtept lat="46.0" lon="-6.0"><name>Start</name></rtept>
    <rtept lat="46.05" lon="-5.9"/>
    <rtept lat="46.1" lon="-5.8"><ele>3</ele><name>Buoy</name></rtept>
  </rte>
</gpx>"#;
        let route = parse_route(xml).unwrap();
        assert_eq!(route.name, "Harbour Run");
        assert_eq!(route.len(), 3);
        assert_eq!(route.names(), vec!["Start", "", "Buoy"]);
        assert!((route.coords()[1].lon + 5.9).abs() < 1e-12);
        assert!((route.coords()[1].lat - 46.05).abs() < 1e-12);
    }

    #[test]
    fn test_route_points_take_priority_over_track() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <rte><rtept lat="1.0" lon="2.0"><name>R</name></rtept></rte>
  <trk><trkseg>
    <trkpt lat="10.0" lon="20.0"/>
    <trkpt lat="11.0" lon="21.0"/>
  </trkseg></trk>
</gpx>"#;
        let route = parse_route(xml).unwrap();
        assert_eq!(route.len(), 1);
        assert_eq!(route.names(), vec!["R"]);
    }

    #[test]
    fn test_track_fallback_has_no_names() {
        let xml = r#"<?xml version="1.0"?>
<gpx version="1.1">
  <trk>
    <name>Crossing</name>
    <trkseg>
      <trkpt lat="48.0" lon="16.0"><name>ignored</name></trkpt>
      <trkpt lat="48.1" lon="16.1"/>
    </trkseg>
    <trkseg>
      <trkpt lat="48.2" lon="16.2"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let route = parse_route(xml).unwrap();
        assert_eq!(route.name, "Crossing");
        assert_eq!(route.len(), 3);
        assert!(route.names().iter().all(|n| n.is_empty()));
    }

    #[test]
    fn test_name_priority() {
        let xml = r#"<gpx><name>Doc</name><trk><name>Track</name></trk><rte><name>Rte</name></rte></gpx>"#;
        assert_eq!(parse_gpx(xml).unwrap().name(), "Rte");

        let xml = r#"<gpx><name>Doc</name><trk><name>Track</name></trk></gpx>"#;
        assert_eq!(parse_gpx(xml).unwrap().name(), "Track");

        let xml = r#"<gpx><name>Doc</name></gpx>"#;
        assert_eq!(parse_gpx(xml).unwrap().name(), "Doc");
    }

    #[test]
    fn test_metadata_name_is_not_document_name() {
        let xml = r#"<gpx><metadata><name>Meta</name></metadata></gpx>"#;
        assert_eq!(parse_gpx(xml).unwrap().name(), "");
    }

    #[test]
    fn test_point_name_is_not_route_name() {
        let xml = r#"<gpx><rte><rtept lat="1" lon="2"><name>WP</name></rtept></rte></gpx>"#;
        let route = parse_route(xml).unwrap();
        assert_eq!(route.name, "");
        assert_eq!(route.names(), vec!["WP"]);
    }

    #[test]
    fn test_empty_gpx_is_empty_route() {
        let route = parse_route(r#"<?xml version="1.0"?><gpx version="1.1"></gpx>"#).unwrap();
        assert!(route.is_empty());
        assert_eq!(route.name, "");

        assert!(parse_route("<gpx/>").unwrap().is_empty());
    }

    #[test]
    fn test_escaped_names() {
        let xml = r#"<gpx><rte><name>Fish &amp; Chips &lt;3</name>
<rtept lat="1" lon="2"><name>&quot;A&apos; &#65;</name></rtept></rte></gpx>"#;
        let route = parse_route(xml).unwrap();
        assert_eq!(route.name, "Fish & Chips <3");
        assert_eq!(route.names(), vec!["\"A' A"]);
    }

    #[test]
    fn test_cdata_name() {
        let xml = r#"<gpx><rte><rtept lat="1" lon="2"><name><![CDATA[Rock & Roll]]></name></rtept></rte></gpx>"#;
        assert_eq!(parse_route(xml).unwrap().names(), vec!["Rock & Roll"]);
    }

    #[test]
    fn test_namespaced_document() {
        let xml = r#"<?xml version="1.0"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1">
  <metadata><time>2025-01-01T00:00:00Z</time></metadata>
  <rte><rtept lat="35.0" lon="139.0"/></rte>
</gpx>"#;
        assert_eq!(parse_route(xml).unwrap().len(), 1);
    }

    #[test]
    fn test_points_without_coords_skipped() {
        let xml = r#"<gpx><rte>
  <rtept lat="1" lon="2"><name>Good</name></rtept>
  <rtept lon="2"><name>No lat</name></rtept>
  <rtept lat="abc" lon="2"/>
  <rtept lat="3" lon="4"><name>Also good</name></rtept>
</rte></gpx>"#;
        let route = parse_route(xml).unwrap();
        assert_eq!(route.names(), vec!["Good", "Also good"]);
    }

    #[test]
    fn test_waypoints_and_extensions_ignored() {
        let xml = r#"<gpx>
  <wpt lat="5" lon="5"><name>Lighthouse</name></wpt>
  <trk><trkseg><trkpt lat="1" lon="1"><extensions><x:hr xmlns:x="urn:x">1</x:hr></extensions></trkpt></trkseg></trk>
</gpx>"#;
        let route = parse_route(xml).unwrap();
        assert_eq!(route.len(), 1);
        assert_eq!(route.names(), vec![""]);
    }

    #[test]
    fn test_not_xml_is_malformed() {
        assert!(matches!(
            parse_route("not xml at all"),
            Err(RouteError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let xml = r#"<gpx><rte><rtept lat="1" lon="2"></rte></gpx>"#;
        assert!(matches!(parse_route(xml), Err(RouteError::MalformedDocument(_))));
    }

    #[test]
    fn test_truncated_document_is_malformed() {
        let xml = r#"<gpx><trk><trkseg><trkpt lat="1" lon="2"/>"#;
        assert!(matches!(parse_route(xml), Err(RouteError::MalformedDocument(_))));
    }
}
