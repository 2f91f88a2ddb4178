use crate::frame::Frame;
use crate::geometry::{BoundingBox, Coord, Geometry, Rgba, Shape};
use anyhow::Result;
use std::path::PathBuf;
use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

/// The rendering collaborator. The pipeline calls it exactly once per
/// run, after all staging is complete; any failure is fatal to the run.
pub trait RenderSink {
    fn render(&mut self, frame: &Frame, shapes: &[Shape]) -> Result<()>;
}

/// Rasterizes the staged scene to a PNG file with `tiny-skia`.
///
/// The visible coordinate window is the frame's clip box when present,
/// otherwise the staged data extent with a small margin. Geometry
/// outside the window is still drawn and cropped by the pixmap bounds.
pub struct MapRenderer {
    output_path: PathBuf,
}

// Margin applied around the data extent when no clip box restricts the
// window, mirroring a plotting library's default autoscale padding.
const EXTENT_MARGIN: f64 = 0.05;

impl MapRenderer {
    pub fn new(output_path: PathBuf) -> Self {
        MapRenderer { output_path }
    }
}

impl RenderSink for MapRenderer {
    fn render(&mut self, frame: &Frame, shapes: &[Shape]) -> Result<()> {
        let mut pixmap = Pixmap::new(frame.width, frame.height)
            .ok_or_else(|| anyhow!("invalid frame dimensions {}x{}", frame.width, frame.height))?;
        pixmap.fill(Color::WHITE);

        let window = frame.clip.unwrap_or_else(|| data_extent(shapes));
        let viewport = Viewport::new(window, frame.width, frame.height);

        for shape in shapes {
            match &shape.geometry {
                Geometry::LineString(points) => {
                    stroke(&mut pixmap, &viewport, points, false, shape.line);
                }
                Geometry::Polygon(rings) => {
                    draw_rings(&mut pixmap, &viewport, rings, shape);
                }
                Geometry::MultiPolygon(polygons) => {
                    for rings in polygons {
                        draw_rings(&mut pixmap, &viewport, rings, shape);
                    }
                }
            }
        }

        pixmap
            .save_png(&self.output_path)
            .map_err(|e| anyhow!("failed to write {}: {e}", self.output_path.display()))?;
        info!(
            "wrote {} ({}x{})",
            self.output_path.display(),
            frame.width,
            frame.height
        );
        Ok(())
    }
}

struct Viewport {
    window: BoundingBox,
    width: f64,
    height: f64,
}

impl Viewport {
    fn new(window: BoundingBox, width: u32, height: u32) -> Self {
        Viewport {
            window,
            width: width as f64,
            height: height as f64,
        }
    }

    // Longitude grows left to right, latitude top to bottom inverted so
    // the window's max_lat lands at y = 0.
    fn project(&self, c: Coord) -> (f32, f32) {
        let x = (c.lon - self.window.min_lon) / self.window.lon_range() * self.width;
        let y = (self.window.max_lat - c.lat) / self.window.lat_range() * self.height;
        (x as f32, y as f32)
    }
}

/// Extent of all staged coordinates, padded so geometry does not touch
/// the image border. Falls back to the whole world for an empty scene,
/// and pads out degenerate (single point, single line) extents.
fn data_extent(shapes: &[Shape]) -> BoundingBox {
    let mut extent: Option<BoundingBox> = None;
    for shape in shapes {
        for c in shape.geometry_coords() {
            extent = Some(match extent {
                None => BoundingBox {
                    min_lon: c.lon,
                    max_lon: c.lon,
                    min_lat: c.lat,
                    max_lat: c.lat,
                },
                Some(b) => BoundingBox {
                    min_lon: b.min_lon.min(c.lon),
                    max_lon: b.max_lon.max(c.lon),
                    min_lat: b.min_lat.min(c.lat),
                    max_lat: b.max_lat.max(c.lat),
                },
            });
        }
    }
    let Some(mut b) = extent else {
        return BoundingBox {
            min_lon: -180.0,
            max_lon: 180.0,
            min_lat: -90.0,
            max_lat: 90.0,
        };
    };
    let lon_pad = if b.lon_range() == 0.0 {
        0.5
    } else {
        b.lon_range() * EXTENT_MARGIN
    };
    let lat_pad = if b.lat_range() == 0.0 {
        0.5
    } else {
        b.lat_range() * EXTENT_MARGIN
    };
    b.min_lon -= lon_pad;
    b.max_lon += lon_pad;
    b.min_lat -= lat_pad;
    b.max_lat += lat_pad;
    b
}

impl Shape {
    fn geometry_coords(&self) -> Box<dyn Iterator<Item = &Coord> + '_> {
        match &self.geometry {
            Geometry::LineString(points) => Box::new(points.iter()),
            Geometry::Polygon(rings) => Box::new(rings.iter().flatten()),
            Geometry::MultiPolygon(polygons) => {
                Box::new(polygons.iter().flatten().flatten())
            }
        }
    }
}

fn to_skia_color(c: Rgba) -> Color {
    Color::from_rgba(
        c.r.clamp(0.0, 1.0),
        c.g.clamp(0.0, 1.0),
        c.b.clamp(0.0, 1.0),
        c.a.clamp(0.0, 1.0),
    )
    .unwrap_or(Color::BLACK)
}

fn build_path(viewport: &Viewport, points: &[Coord], close: bool) -> Option<Path> {
    if points.len() < 2 {
        // A zero or one point sequence has nothing to draw.
        return None;
    }
    let mut pb = PathBuilder::new();
    let (x, y) = viewport.project(points[0]);
    pb.move_to(x, y);
    for point in &points[1..] {
        let (x, y) = viewport.project(*point);
        pb.line_to(x, y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

fn stroke(pixmap: &mut Pixmap, viewport: &Viewport, points: &[Coord], close: bool, color: Rgba) {
    let Some(path) = build_path(viewport, points, close) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(to_skia_color(color));
    paint.anti_alias = true;
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

// Each ring is filled and outlined on its own; hole rings are not
// subtracted from the outer boundary.
fn draw_rings(pixmap: &mut Pixmap, viewport: &Viewport, rings: &[Vec<Coord>], shape: &Shape) {
    for ring in rings {
        if let Some(path) = build_path(viewport, ring, true) {
            let mut paint = Paint::default();
            paint.set_color(to_skia_color(shape.fill));
            paint.anti_alias = true;
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
        stroke(pixmap, viewport, ring, true, shape.line);
    }
}
