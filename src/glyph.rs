//! Pie-glyph sector geometry.
//!
//! A glyph mark is a pie split into one equal angular sector per tracked
//! hyperparameter. A sector's radius encodes the ordinal position of the
//! record's value within that parameter's allowed levels, so a full-radius
//! sector means "top level" and a short one "bottom level".

use eframe::egui::{pos2, Pos2};
use std::f32::consts::TAU;

/// Ordinal position of `value` within `levels`, or None if the value is not
/// an allowed level.
pub fn level_index(levels: &[f64], value: f64) -> Option<usize> {
    levels.iter().position(|&l| l == value)
}

/// Sector radius for level `level_idx` of `num_levels`:
/// `(level_idx + 1) × outer_radius / num_levels`.
pub fn sector_radius(outer_radius: f32, num_levels: usize, level_idx: usize) -> f32 {
    (level_idx + 1) as f32 * outer_radius / num_levels.max(1) as f32
}

/// Angular span of sector `i` of `n`, measured from 12 o'clock, clockwise.
pub fn sector_angles(i: usize, n: usize) -> (f32, f32) {
    let sweep = TAU / n.max(1) as f32;
    (sweep * i as f32, sweep * (i + 1) as f32)
}

/// Tessellate a filled sector into a polygon fan around `center`.
///
/// Screen coordinates (y grows downward): angle 0 points up, angles grow
/// clockwise. The fan stays convex for sweeps up to a half turn, which holds
/// for any glyph with at least two parameters.
pub fn sector_path(center: Pos2, radius: f32, start_angle: f32, end_angle: f32) -> Vec<Pos2> {
    let sweep = end_angle - start_angle;
    let steps = ((sweep / 0.2).ceil() as usize).max(2);

    let mut pts = Vec::with_capacity(steps + 2);
    pts.push(center);
    for s in 0..=steps {
        let a = start_angle + sweep * s as f32 / steps as f32;
        pts.push(pos2(center.x + radius * a.sin(), center.y - radius * a.cos()));
    }
    pts
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_index() {
        let levels = [0.01, 0.1, 1.0, 10.0];
        assert_eq!(level_index(&levels, 0.01), Some(0));
        assert_eq!(level_index(&levels, 1.0), Some(2));
        assert_eq!(level_index(&levels, 10.0), Some(3));
        assert_eq!(level_index(&levels, 42.0), None);
    }

    #[test]
    fn test_sector_radius_proportions() {
        // Value 1 in [0.01, 0.1, 1, 10] sits at index 2 of 4, so its sector
        // spans 3/4 of the outer radius.
        let levels = [0.01, 0.1, 1.0, 10.0];
        let idx = level_index(&levels, 1.0).unwrap();
        assert_eq!(sector_radius(16.0, levels.len(), idx), 12.0);

        assert_eq!(sector_radius(16.0, 4, 0), 4.0);
        assert_eq!(sector_radius(16.0, 4, 3), 16.0);
    }

    #[test]
    fn test_sector_angles_partition_the_circle() {
        let n = 3;
        let (s0, _) = sector_angles(0, n);
        assert_eq!(s0, 0.0);
        for i in 0..n {
            let (start, end) = sector_angles(i, n);
            let (next_start, _) = sector_angles((i + 1) % n, n);
            assert!((end - start - TAU / n as f32).abs() < 1e-6);
            if i + 1 < n {
                assert!((end - next_start).abs() < 1e-6);
            }
        }
        let (_, last_end) = sector_angles(n - 1, n);
        assert!((last_end - TAU).abs() < 1e-6);
    }

    #[test]
    fn test_sector_path_fan() {
        let center = pos2(100.0, 100.0);
        let (a0, a1) = sector_angles(0, 3);
        let path = sector_path(center, 12.0, a0, a1);

        // Fan starts at the center; first arc point is straight up.
        assert_eq!(path[0], center);
        let first = path[1];
        assert!((first.x - center.x).abs() < 1e-4);
        assert!((first.y - (center.y - 12.0)).abs() < 1e-4);

        // Every arc point lies on the radius.
        for p in &path[1..] {
            let d = ((p.x - center.x).powi(2) + (p.y - center.y).powi(2)).sqrt();
            assert!((d - 12.0).abs() < 1e-3);
        }
    }
}
