//! The ordered bounds-check sieve applied to every engine result before it
//! is allowed to contribute toward a decision (§4.2).

use crate::config::camera::{LprOptions, Size};
use crate::reading::PlateResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsFailure {
    PlateSizeMax,
    PlateSizeMin,
    TextScoreLow,
    PlateScoreLow,
    MarginLeft,
    MarginTop,
    MarginRight,
    MarginBottom,
}

/// Resolution as seen by the bounds check: swapped for 90/270-degree
/// mounting so margins are evaluated against the as-displayed frame.
fn effective_resolution(resolution: Size, angle: u16) -> Size {
    match angle {
        90 | 270 => Size {
            width: resolution.height,
            height: resolution.width,
        },
        _ => resolution,
    }
}

/// Run the ordered sieve, returning the first failing reason or `Ok(())`.
pub fn check_bounds(
    result: &PlateResult,
    lpr: &LprOptions,
    resolution: Size,
    angle: u16,
) -> Result<(), BoundsFailure> {
    let w = result.box_.width();
    let h = result.box_.height();
    let size = w.max(h) as u32;

    if size > lpr.plateSizeMax {
        return Err(BoundsFailure::PlateSizeMax);
    }
    if size < lpr.plateSizeMin {
        return Err(BoundsFailure::PlateSizeMin);
    }
    // `score` is the text-recognition confidence; `dscore` the detector's.
    if result.score < lpr.textScoreMin {
        return Err(BoundsFailure::TextScoreLow);
    }
    if result.dscore < lpr.plateScoreMin {
        return Err(BoundsFailure::PlateScoreLow);
    }

    let res = effective_resolution(resolution, angle);
    if (result.box_.xmin as u32) < lpr.margin.left {
        return Err(BoundsFailure::MarginLeft);
    }
    if (result.box_.ymin as u32) < lpr.margin.top {
        return Err(BoundsFailure::MarginTop);
    }
    if result.box_.xmax as u32 > res.width.saturating_sub(lpr.margin.right) {
        return Err(BoundsFailure::MarginRight);
    }
    if result.box_.ymax as u32 > res.height.saturating_sub(lpr.margin.bottom) {
        return Err(BoundsFailure::MarginBottom);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{BBox, Region};

    fn result(xmin: i32, ymin: i32, xmax: i32, ymax: i32, score: f64, dscore: f64) -> PlateResult {
        PlateResult {
            plate: "ABC123".into(),
            score,
            dscore,
            box_: BBox { xmin, ymin, xmax, ymax },
            region: Region::default(),
            vehicle: None,
            candidates: vec![],
            loops: 0,
            expire: 0.0,
            passed: false,
        }
    }

    #[test]
    fn passes_within_bounds() {
        let lpr = LprOptions::default();
        let resolution = Size { width: 1920, height: 1080 };
        let r = result(100, 100, 200, 150, 0.9, 0.9);
        assert_eq!(check_bounds(&r, &lpr, resolution, 0), Ok(()));
    }

    #[test]
    fn fails_margin_left() {
        let mut lpr = LprOptions::default();
        lpr.margin.left = 50;
        let resolution = Size { width: 1920, height: 1080 };
        let r = result(10, 100, 120, 150, 0.9, 0.9);
        assert_eq!(check_bounds(&r, &lpr, resolution, 0), Err(BoundsFailure::MarginLeft));
    }

    #[test]
    fn margins_swap_for_rotated_mount() {
        let mut lpr = LprOptions::default();
        lpr.margin.right = 0;
        lpr.margin.bottom = 0;
        // resolution 1080x1920 raw, effectively 1920x1080 when rotated 90.
        let resolution = Size { width: 1080, height: 1920 };
        let r = result(1800, 100, 1900, 150, 0.9, 0.9);
        assert_eq!(check_bounds(&r, &lpr, resolution, 90), Ok(()));
    }
}
