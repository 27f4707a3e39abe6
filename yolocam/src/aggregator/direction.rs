//! Direction and speed estimation from a plate's top-left-corner track
//! (§4.3 step 3–4), resolved against the original implementation's exact
//! sector/hysteresis scheme.

use crate::decision::Direction;

#[derive(Debug, Clone, Copy)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sector {
    Up,
    Down,
    Left,
    Right,
}

fn sector(dx: f64, dy: f64) -> Sector {
    // atan2(dx, dy) mapped into 45-degree sectors centered on the axes.
    let angle = dx.atan2(dy).to_degrees();
    if (-45.0..45.0).contains(&angle) {
        Sector::Down
    } else if (45.0..135.0).contains(&angle) {
        Sector::Right
    } else if (-135.0..-45.0).contains(&angle) {
        Sector::Left
    } else {
        Sector::Up
    }
}

/// Majority-vote sector winner across consecutive samples, then
/// disambiguated against `direction_threshold` (percent hysteresis between
/// |Δx| and |Δy| totals) into the final six-way direction.
pub fn direction_lookup(points: &[TrackPoint], direction_threshold: f64) -> Direction {
    if points.len() < 2 {
        return Direction::Unknown;
    }

    let mut up = 0u32;
    let mut down = 0u32;
    let mut left = 0u32;
    let mut right = 0u32;
    let mut total_dx = 0.0f64;
    let mut total_dy = 0.0f64;

    for pair in points.windows(2) {
        let dx = pair[1].x - pair[0].x;
        let dy = pair[1].y - pair[0].y;
        total_dx += dx.abs();
        total_dy += dy.abs();
        match sector(dx, dy) {
            Sector::Up => up += 1,
            Sector::Down => down += 1,
            Sector::Left => left += 1,
            Sector::Right => right += 1,
        }
    }

    let winner = [
        (Sector::Up, up),
        (Sector::Down, down),
        (Sector::Left, left),
        (Sector::Right, right),
    ]
    .into_iter()
    .max_by_key(|(_, count)| *count)
    .map(|(s, _)| s)
    .unwrap_or(Sector::Up);

    match winner {
        Sector::Up => Direction::Rear,
        Sector::Down => Direction::Front,
        Sector::Left | Sector::Right => {
            let total = total_dx + total_dy;
            if total <= 0.0 {
                return Direction::Unknown;
            }
            let dx_share = total_dx / total * 100.0;
            if dx_share >= direction_threshold {
                if winner == Sector::Left {
                    Direction::Left
                } else {
                    Direction::Right
                }
            } else {
                Direction::Both
            }
        }
    }
}

/// Average km/h across consecutive samples, using a constant cm-per-pixel
/// mapping derived from `frame_height_cm / resolution_height_px`. Returns
/// `0.0` when either mapping is zero or fewer than two samples exist.
pub fn calculate_speed(points: &[TrackPoint], frame_height_cm: f64, resolution_height_px: f64) -> f64 {
    if points.len() < 2 || frame_height_cm <= 0.0 || resolution_height_px <= 0.0 {
        return 0.0;
    }
    let cm_per_px = frame_height_cm / resolution_height_px;

    let mut speeds = Vec::new();
    for pair in points.windows(2) {
        let dt = pair[1].t - pair[0].t;
        if dt <= 0.0 {
            continue;
        }
        let dy_cm = (pair[1].y - pair[0].y).abs() * cm_per_px;
        let cm_per_s = dy_cm / dt;
        let km_per_h = cm_per_s * 0.036;
        speeds.push(km_per_h);
    }

    if speeds.is_empty() {
        0.0
    } else {
        speeds.iter().sum::<f64>() / speeds.len() as f64
    }
}

/// Drop samples older than `max_age_s` relative to `now`.
pub fn prune_stale(points: &mut Vec<TrackPoint>, now: f64, max_age_s: f64) {
    points.retain(|p| now - p.t <= max_age_s);
}

/// Remove consecutive duplicate (x, y) samples (§4.3 step 1).
pub fn dedupe(points: &mut Vec<TrackPoint>) {
    points.dedup_by(|a, b| a.x == b.x && a.y == b.y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_direction_top_to_bottom() {
        let points = vec![
            TrackPoint { x: 100.0, y: 0.0, t: 0.0 },
            TrackPoint { x: 100.0, y: 100.0, t: 0.1 },
            TrackPoint { x: 100.0, y: 200.0, t: 0.2 },
            TrackPoint { x: 100.0, y: 300.0, t: 0.3 },
        ];
        assert_eq!(direction_lookup(&points, 20.0), Direction::Front);
        let speed = calculate_speed(&points, 200.0, 1000.0);
        assert!((speed - 7.2).abs() < 1e-6, "speed was {speed}");
    }

    #[test]
    fn rear_direction_bottom_to_top() {
        let points = vec![
            TrackPoint { x: 100.0, y: 300.0, t: 0.0 },
            TrackPoint { x: 100.0, y: 200.0, t: 0.1 },
            TrackPoint { x: 100.0, y: 100.0, t: 0.2 },
        ];
        assert_eq!(direction_lookup(&points, 20.0), Direction::Rear);
    }

    #[test]
    fn unknown_with_single_sample() {
        let points = vec![TrackPoint { x: 0.0, y: 0.0, t: 0.0 }];
        assert_eq!(direction_lookup(&points, 20.0), Direction::Unknown);
        assert_eq!(calculate_speed(&points, 200.0, 1000.0), 0.0);
    }

    #[test]
    fn reversing_sequence_swaps_front_and_rear() {
        let forward = vec![
            TrackPoint { x: 100.0, y: 0.0, t: 0.0 },
            TrackPoint { x: 100.0, y: 100.0, t: 0.1 },
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        for (i, p) in reversed.iter_mut().enumerate() {
            p.t = i as f64 * 0.1;
        }
        assert_eq!(direction_lookup(&forward, 20.0), Direction::Front);
        assert_eq!(direction_lookup(&reversed, 20.0), Direction::Rear);
    }
}
