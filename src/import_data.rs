use crate::geometry::{Coord, Geometry, Rgba, Shape, TimedPoint, Track};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use geojson::{GeoJson, Value};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::{fs, fs::File, io::BufReader, path::Path};

/// Loads a GPX file into a [`Track`], preserving document order of the
/// `trkpt` elements. A file with zero track points yields an empty track.
pub fn load_gpx(path: &Path) -> Result<Track> {
    let xml = fs::read_to_string(path)
        .with_context(|| format!("failed to read track file {}", path.display()))?;
    parse_gpx(&xml).with_context(|| format!("malformed track file {}", path.display()))
}

fn parse_gpx(xml: &str) -> Result<Track> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut points = Vec::new();
    // The point currently open. `time` elements elsewhere in the document
    // (e.g. GPX metadata) are ignored because nothing is pending.
    let mut pending: Option<TimedPoint> = None;
    // quick-xml does not treat a premature EOF with open elements as an
    // error, so element depth is tracked to reject truncated documents.
    let mut depth: u32 = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                if e.name().as_ref() == b"trkpt" {
                    pending = Some(point_from_attributes(&e)?);
                } else if e.name().as_ref() == b"time" && pending.is_some() {
                    // read_text consumes the matching end tag
                    let raw = reader.read_text(e.name())?;
                    depth -= 1;
                    if let Some(point) = pending.as_mut() {
                        point.time = Some(parse_point_time(&raw)?);
                    }
                }
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"trkpt" => {
                points.push(point_from_attributes(&e)?);
            }
            Ok(Event::End(e)) => {
                // stray end tags are rejected by quick-xml itself
                depth = depth.saturating_sub(1);
                if e.name().as_ref() == b"trkpt" {
                    if let Some(point) = pending.take() {
                        points.push(point);
                    }
                }
            }
            Ok(Event::Eof) => {
                if depth != 0 || pending.is_some() {
                    bail!("unexpected end of document, {depth} element(s) left unclosed");
                }
                break;
            }
            Ok(_) => {}
            Err(e) => bail!("XML parse error: {e:?}"),
        }
        buf.clear();
    }

    Ok(Track { points })
}

fn point_from_attributes(e: &BytesStart) -> Result<TimedPoint> {
    let required = |name: &str| -> Result<f64> {
        let attr = e
            .try_get_attribute(name)?
            .ok_or_else(|| anyhow!("trkpt is missing required attribute {name:?}"))?;
        let value = attr.unescape_value()?;
        value
            .parse::<f64>()
            .with_context(|| format!("invalid {name} value {value:?}"))
    };
    Ok(TimedPoint {
        latitude: required("lat")?,
        longitude: required("lon")?,
        time: None,
    })
}

/// Parses an ISO-8601 instant. A trailing `Z` zone suffix is normalized
/// to `+00:00` first.
fn parse_point_time(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_owned(),
    };
    let time = DateTime::parse_from_rfc3339(&normalized)
        .with_context(|| format!("invalid timestamp {raw:?}"))?;
    Ok(time.with_timezone(&Utc))
}

/// Loads a GeoJSON FeatureCollection into styled shapes, in feature
/// order. LineString, Polygon and MultiPolygon geometries are converted;
/// any other geometry type is skipped so unrelated features in a shared
/// file do not abort the overlay. Missing override colors fall back to
/// the translucent defaults.
pub fn load_geojson(path: &Path, fill: Option<Rgba>, line: Option<Rgba>) -> Result<Vec<Shape>> {
    let file = File::open(path)
        .with_context(|| format!("failed to read overlay file {}", path.display()))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("malformed overlay file {}", path.display()))?;
    let collection = match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        _ => bail!("overlay file {} is not a FeatureCollection", path.display()),
    };

    let fill = fill.unwrap_or(Rgba::DEFAULT_FILL);
    let line = line.unwrap_or(Rgba::DEFAULT_LINE);

    let mut shapes = Vec::new();
    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };
        let geometry = match geometry.value {
            Value::LineString(positions) => Geometry::LineString(ring_coords(&positions)?),
            Value::Polygon(rings) => Geometry::Polygon(polygon_coords(&rings)?),
            Value::MultiPolygon(polygons) => Geometry::MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| polygon_coords(rings))
                    .collect::<Result<_>>()?,
            ),
            _ => {
                debug!("skipping unsupported geometry type in {}", path.display());
                continue;
            }
        };
        shapes.push(Shape {
            geometry,
            fill,
            line,
        });
    }
    Ok(shapes)
}

fn polygon_coords(rings: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<Coord>>> {
    rings.iter().map(|ring| ring_coords(ring)).collect()
}

// GeoJSON positions are already in (lon, lat) order, no axis swap here.
fn ring_coords(positions: &[Vec<f64>]) -> Result<Vec<Coord>> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(Coord {
                lon: *lon,
                lat: *lat,
            }),
            _ => bail!("coordinate position with fewer than 2 values"),
        })
        .collect()
}
