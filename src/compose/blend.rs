//! Blend primitives on unit-range channels

/// Source-over with opacity: `dst + (src - dst) * alpha`
pub fn over(dst: [f32; 3], src: [f32; 3], alpha: f32) -> [f32; 3] {
    let alpha = alpha.clamp(0.0, 1.0);
    [
        dst[0] + (src[0] - dst[0]) * alpha,
        dst[1] + (src[1] - dst[1]) * alpha,
        dst[2] + (src[2] - dst[2]) * alpha,
    ]
}

/// Soft-light of `source` onto `backdrop`, single channel
///
/// Same formula as the CSS compositing `soft-light` mode. A mid-grey source
/// leaves the backdrop unchanged; darker sources darken, lighter ones lighten.
pub fn soft_light(backdrop: f32, source: f32) -> f32 {
    let cb = backdrop;
    let cs = source;
    if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        let d = if cb <= 0.25 {
            ((16.0 * cb - 12.0) * cb + 4.0) * cb
        } else {
            cb.sqrt()
        };
        cb + (2.0 * source - 1.0) * (d - cb)
    }
}

/// Soft-light per channel
pub fn soft_light_rgb(backdrop: [f32; 3], source: [f32; 3]) -> [f32; 3] {
    [
        soft_light(backdrop[0], source[0]),
        soft_light(backdrop[1], source[1]),
        soft_light(backdrop[2], source[2]),
    ]
}

#[inline]
pub fn to_unit(px: [u8; 3]) -> [f32; 3] {
    px.map(|c| c as f32 / 255.0)
}

#[inline]
pub fn to_byte(px: [f32; 3]) -> [u8; 3] {
    px.map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_endpoints() {
        let dst = [0.2, 0.4, 0.6];
        let src = [1.0, 0.0, 0.5];
        assert_eq!(over(dst, src, 0.0), dst);
        let full = over(dst, src, 1.0);
        for (got, want) in full.iter().zip(src) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn soft_light_identities() {
        for cb in [0.0, 0.1, 0.3, 0.5, 0.9, 1.0] {
            assert!((soft_light(cb, 0.5) - cb).abs() < 1e-6);
        }
        assert!(soft_light(0.5, 0.0) < 0.5);
        assert!(soft_light(0.5, 1.0) > 0.5);
        assert!(soft_light(0.1, 1.0) > 0.1);
        assert_eq!(soft_light(0.0, 1.0), 0.0);
        assert_eq!(soft_light(1.0, 0.0), 1.0);
    }

    #[test]
    fn byte_conversion_rounds() {
        assert_eq!(to_byte([0.5, 1.2, -0.1]), [128, 255, 0]);
        assert_eq!(to_byte(to_unit([3, 128, 250])), [3, 128, 250]);
    }
}
