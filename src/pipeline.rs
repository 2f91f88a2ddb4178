use crate::frame::{plan_frame, Resolution};
use crate::geometry::{BoundingBox, Coord, Geometry, Rgba, Shape, Track};
use crate::import_data;
use crate::map_renderer::RenderSink;
use crate::speed_filter;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const TRACK_FILE_EXTENSION: &str = ".gpx";

/// One requested overlay. Request order is z-order: earlier overlays are
/// drawn first and end up underneath later ones and all tracks.
#[derive(Debug, Clone)]
pub struct OverlaySpec {
    pub path: PathBuf,
    pub fill: Option<Rgba>,
    pub line: Option<Rgba>,
}

#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub track_dir: PathBuf,
    pub overlays: Vec<OverlaySpec>,
    pub bbox: Option<BoundingBox>,
    pub resolution: Resolution,
    pub max_speed_kmh: Option<f64>,
}

/// Runs one composition: resolve the frame, stage overlays, then tracks,
/// then the clip outline, and hand the scene to the renderer.
///
/// Overlay and frame failures are fatal (static map configuration must
/// be correct); a track file that fails to parse or exceeds the speed
/// limit is logged and skipped, the run continues.
pub fn compose(options: &ComposeOptions, renderer: &mut dyn RenderSink) -> Result<()> {
    let frame = plan_frame(options.resolution, options.bbox)?;

    let mut staged: Vec<Shape> = Vec::new();
    for overlay in &options.overlays {
        let shapes = import_data::load_geojson(&overlay.path, overlay.fill, overlay.line)?;
        debug!(
            "staged {} shape(s) from overlay {}",
            shapes.len(),
            overlay.path.display()
        );
        staged.extend(shapes);
    }

    for path in track_files(&options.track_dir)? {
        let track = match import_data::load_gpx(&path) {
            Ok(track) => track,
            Err(e) => {
                warn!("skipping {}: {e:#}", path.display());
                continue;
            }
        };
        if let Some(max_speed_kmh) = options.max_speed_kmh {
            if speed_filter::exceeds_speed_limit(&track, max_speed_kmh) {
                warn!(
                    "skipping {}: speed exceeds {max_speed_kmh} km/h",
                    path.display()
                );
                continue;
            }
        }
        debug!("staged {} point(s) from {}", track.points.len(), path.display());
        staged.push(track_shape(&track));
    }

    if let Some(clip) = frame.clip {
        staged.push(clip_outline(&clip));
    }

    info!(
        "rendering {} shape(s) at {}x{}",
        staged.len(),
        frame.width,
        frame.height
    );
    renderer.render(&frame, &staged)
}

/// Entries of `dir` whose name ends in the track extension, name sorted.
/// No recursion into subdirectories.
fn track_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list track directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_track = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(TRACK_FILE_EXTENSION));
        if is_track && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// Tracks are drawn as plain opaque black lines above all overlays.
fn track_shape(track: &Track) -> Shape {
    let points = track
        .points
        .iter()
        .map(|p| Coord {
            lon: p.longitude,
            lat: p.latitude,
        })
        .collect();
    Shape {
        geometry: Geometry::LineString(points),
        fill: Rgba::TRANSPARENT,
        line: Rgba::BLACK,
    }
}

/// The clip box is drawn as a frame border on top of everything else. It
/// does not clip geometry; the renderer's viewport does the cropping.
fn clip_outline(clip: &BoundingBox) -> Shape {
    let corners = vec![
        Coord {
            lon: clip.min_lon,
            lat: clip.min_lat,
        },
        Coord {
            lon: clip.max_lon,
            lat: clip.min_lat,
        },
        Coord {
            lon: clip.max_lon,
            lat: clip.max_lat,
        },
        Coord {
            lon: clip.min_lon,
            lat: clip.max_lat,
        },
        Coord {
            lon: clip.min_lon,
            lat: clip.min_lat,
        },
    ];
    Shape {
        geometry: Geometry::LineString(corners),
        fill: Rgba::TRANSPARENT,
        line: Rgba::BLACK,
    }
}
