use crate::geometry::{TimedPoint, Track};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometers.
pub fn haversine_distance_km(from: &TimedPoint, to: &TimedPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Whether any adjacent segment of the track moves faster than
/// `max_speed_kmh`. Segments where either point lacks a timestamp, or
/// where the elapsed time is exactly zero, carry no speed information
/// and are skipped rather than flagged. Short-circuits on the first
/// violation; tracks with fewer than two points are never excluded.
pub fn exceeds_speed_limit(track: &Track, max_speed_kmh: f64) -> bool {
    for pair in track.points.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let (Some(prev_time), Some(curr_time)) = (prev.time, curr.time) else {
            continue;
        };
        let delta = curr_time - prev_time;
        // num_microseconds only overflows for deltas of ~292k years
        let elapsed_sec = delta
            .num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
            .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1000.0);
        if elapsed_sec == 0.0 {
            continue;
        }
        let distance_km = haversine_distance_km(prev, curr);
        let speed_kmh = (distance_km / (elapsed_sec / 3600.0)).abs();
        if speed_kmh > max_speed_kmh {
            debug!("segment speed {speed_kmh:.1} km/h exceeds limit {max_speed_kmh:.1} km/h");
            return true;
        }
    }
    false
}
