use crate::geometry::BoundingBox;
use anyhow::Result;

/// The resolved output pixel dimensions plus the optional visible
/// coordinate window. Derived once per run, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub clip: Option<BoundingBox>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Explicit { width: u32, height: u32 },
    /// Derive the width from a bounding box's latitude-corrected aspect
    /// ratio. Requires a bounding box.
    Autoscale { target_height: u32 },
}

/// Resolves the output frame. In autoscale mode the width is
/// `round(target_height * aspect)` where
/// `aspect = (lon_range * cos(mid_lat)) / lat_range`, so a degree of
/// longitude shrinks with distance from the equator and the image keeps
/// approximate real-world proportions.
pub fn plan_frame(resolution: Resolution, bbox: Option<BoundingBox>) -> Result<Frame> {
    match resolution {
        Resolution::Explicit { width, height } => Ok(Frame {
            width,
            height,
            clip: bbox,
        }),
        Resolution::Autoscale { target_height } => {
            let bbox = bbox
                .ok_or_else(|| anyhow!("autoscale requires a bounding box, but none was given"))?;
            let lat_range = bbox.lat_range();
            if lat_range == 0.0 {
                bail!("autoscale requires a bounding box with a non-zero latitude span");
            }
            let mid_lat = (bbox.min_lat + bbox.max_lat) / 2.0;
            let latitude_correction = mid_lat.to_radians().cos();
            let aspect_ratio = (bbox.lon_range() * latitude_correction) / lat_range;
            let width = (target_height as f64 * aspect_ratio).round() as u32;
            Ok(Frame {
                width,
                height: target_height,
                clip: Some(bbox),
            })
        }
    }
}
