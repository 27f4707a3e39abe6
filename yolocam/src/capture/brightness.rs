//! Auto-brightness (§4.1): samples mean greyscale brightness once per
//! second, maps it into a 33-step lookup (-64..+64), and only reprograms the
//! camera once the mapped step has held stable for `STABLE_HOLD` consecutive
//! samples and differs from the last applied value.

const STABLE_HOLD: u32 = 10;
const STEP_COUNT: i32 = 33;
const STEP_RANGE: i32 = 64;

/// Map a 0..255 mean brightness sample into the -64..+64 step lattice.
fn map_to_step(mean_brightness: f64) -> i32 {
    let clamped = mean_brightness.clamp(0.0, 255.0);
    let fraction = clamped / 255.0;
    let step_index = (fraction * (STEP_COUNT - 1) as f64).round() as i32;
    -STEP_RANGE + step_index * (2 * STEP_RANGE) / (STEP_COUNT - 1)
}

fn mean_brightness_of_jpeg(jpeg: &[u8]) -> f64 {
    match image::load_from_memory(jpeg) {
        Ok(img) => {
            let grey = img.to_luma8();
            if grey.is_empty() {
                128.0
            } else {
                let sum: u64 = grey.pixels().map(|p| p.0[0] as u64).sum();
                sum as f64 / grey.len() as f64
            }
        }
        Err(_) => 128.0,
    }
}

/// Returns `Some(step)` when the newly-applied brightness should change,
/// else `None`. Mutates `stable_count` in place; callers own
/// `last_applied_step`.
pub fn sample_and_maybe_apply(raw_jpeg: &[u8], last_applied_step: i32, stable_count: &mut u32) -> Option<i32> {
    let mean = mean_brightness_of_jpeg(raw_jpeg);
    let step = map_to_step(mean);

    if step == last_applied_step {
        *stable_count = 0;
        return None;
    }

    *stable_count += 1;
    if *stable_count >= STABLE_HOLD {
        *stable_count = 0;
        Some(step)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_to_step_is_monotonic_and_bounded() {
        assert_eq!(map_to_step(0.0), -64);
        assert_eq!(map_to_step(255.0), 64);
        assert!(map_to_step(128.0).abs() <= 2);
    }

    #[test]
    fn does_not_apply_until_stable() {
        let mut stable = 0u32;
        for _ in 0..STABLE_HOLD - 1 {
            // A flat grey JPEG is easiest to construct deterministically for
            // the test; use a tiny in-memory buffer instead and rely on the
            // decode-failure fallback path (mean 128.0, step != 0 for a
            // last_applied_step far from center).
            assert!(sample_and_maybe_apply(&[], -64, &mut stable).is_none());
        }
        assert!(sample_and_maybe_apply(&[], -64, &mut stable).is_some());
    }
}
