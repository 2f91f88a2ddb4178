use anyhow::Result;
use chrono::{DateTime, Utc};

/// A single recorded GPS fix. `time` is `None` when the source point had
/// no timestamp; that absence propagates, it is never defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub time: Option<DateTime<Utc>>,
}

/// One parsed recording, in document order. May be empty.
#[derive(Debug, PartialEq, Default)]
pub struct Track {
    pub points: Vec<TimedPoint>,
}

/// A planar coordinate in plotting order. GPX carries (lat, lon)
/// attributes while GeoJSON and the renderer use (lon, lat) pairs; the
/// named fields keep the axis order explicit at every boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    LineString(Vec<Coord>),
    /// Ordered rings, first is the outer boundary. Holes are carried as
    /// additional rings and drawn as-is, never subtracted.
    Polygon(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
}

/// RGBA color with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Default overlay fill, `#00000044`.
    pub const DEFAULT_FILL: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0x44 as f32 / 255.0,
    };
    /// Default overlay line, `#00000088`.
    pub const DEFAULT_LINE: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0x88 as f32 / 255.0,
    };
    pub const BLACK: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Parses a CSS color: named colors or `#RRGGBB`/`#RRGGBBAA` hex.
    pub fn parse(s: &str) -> Result<Rgba> {
        let color =
            csscolorparser::parse(s).map_err(|e| anyhow!("invalid color {s:?}: {e}"))?;
        let [r, g, b, a] = color.to_array();
        Ok(Rgba { r, g, b, a })
    }
}

/// The staged drawing unit: geometry plus its style. Alpha is a
/// first-class part of both colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub geometry: Geometry,
    pub fill: Rgba,
    pub line: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn lon_range(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn lat_range(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_with_alpha() {
        let c = Rgba::parse("#00000044").unwrap();
        assert_eq!(c, Rgba::DEFAULT_FILL);
        let c = Rgba::parse("#ff0000").unwrap();
        assert_eq!(
            c,
            Rgba {
                r: 1.0,
                g: 0.0,
                b: 0.0,
                a: 1.0
            }
        );
    }

    #[test]
    fn parse_named() {
        let c = Rgba::parse("blue").unwrap();
        assert_eq!(
            c,
            Rgba {
                r: 0.0,
                g: 0.0,
                b: 1.0,
                a: 1.0
            }
        );
    }

    #[test]
    fn parse_garbage_fails() {
        assert!(Rgba::parse("not-a-color").is_err());
        assert!(Rgba::parse("#12").is_err());
    }
}
